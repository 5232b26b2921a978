//! Grid map: edge knowledge, routing and export

mod grid;
pub mod route;
mod snapshot;

pub use grid::{DistanceClass, GridMap, Knowledge, Node, classify_distance};
pub use snapshot::{EdgeRecord, MapSnapshot};
