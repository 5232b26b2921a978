//! Core abstractions for rover implementations.
//!
//! - [`actuator`]: Traits every rover (virtual or hardware) implements
//! - [`types`]: Readings, motion parameters and labels passed across the boundary

pub mod actuator;
pub mod types;
