//! Staging lane: bin discovery, bin counting and targeted deposits

pub mod deposit;
pub mod discovery;
pub mod lane;
pub mod registry;
pub mod slot_counter;
mod strategy;

pub use deposit::deposit_block;
pub use discovery::discover_bins;
pub use registry::{BinRegistry, BinSlot, DepositTarget, LaneHeading, MAX_SLOTS};
pub use slot_counter::{BackgroundPoller, SearchMode, SearchOutcome, SlotCounter, SlotSearch};
pub use strategy::{Mission, MissionReport};
