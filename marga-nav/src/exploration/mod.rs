//! Arena exploration: scan, route, retrieve and carry blocks to the lane.

mod explorer;

pub use explorer::{ExplorationStep, Explorer, Phase};
