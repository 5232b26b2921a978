//! # MargaNav: Grid Exploration and Sorting Mission
//!
//! Drives a line-following rover over a grid arena, collects colored blocks
//! and drops each one into the bin of the same color in the staging lane
//! that runs along the arena's west side.
//!
//! ## Mission Outline
//!
//! ```text
//!   discover bins ──▶ exit at row 0 ──▶ explore ──▶ grab ──▶ carry to lane ──▶ deposit
//!                                          ▲                                      │
//!                                          └──────────── re-enter at bin row ◀────┘
//! ```
//!
//! ## Modules
//!
//! - [`position`]: Grid points, headings and turn computation
//! - [`map`]: Edge knowledge, Dijkstra routing, frontiers and snapshots
//! - [`exploration`]: The exploration state machine
//! - [`staging`]: Bin registry, bin counting, discovery and deposits
//! - [`status`]: Fire-and-forget status display
//! - [`config`]: TOML configuration
//!
//! The rover itself sits behind the [`yantra_io::Rover`] trait; the virtual
//! rover from `yantra-io` runs complete missions without hardware.

pub mod config;
pub mod error;
pub mod exploration;
pub mod map;
pub mod position;
pub mod staging;
pub mod status;

pub use config::MargaConfig;
pub use error::{NavError, Result};
pub use exploration::{ExplorationStep, Explorer, Phase};
pub use map::{GridMap, Knowledge, MapSnapshot, Node};
pub use position::{Direction, GridPoint, Pose};
pub use staging::{BinRegistry, BinSlot, Mission, MissionReport};
pub use status::{StatusEvent, StatusSender};
