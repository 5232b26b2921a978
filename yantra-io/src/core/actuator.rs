//! Actuator traits implemented by every rover

use crate::core::types::{
    Color, DepositStyle, FollowParams, Hsv, LaneTick, LateralDistances, Side, TurnMode,
};
use crate::error::Result;
use std::time::Duration;

/// Motion primitives and sensor queries over the main arena
///
/// Every call blocks until the underlying motion or read completes.
pub trait Actuator: Send {
    /// Drive straight with heading hold. Negative distances reverse.
    fn advance(&mut self, distance_mm: f32, velocity: f32) -> Result<()>;

    /// Rotate in place. Positive degrees turn clockwise.
    fn turn(&mut self, degrees: f32, velocity: f32, mode: TurnMode) -> Result<()>;

    /// Follow the line until an intersection pattern is sensed
    ///
    /// Returns `false` when the follow was aborted by the terminal marker
    /// while `carrying_block` is set.
    fn follow_to_intersection(&mut self, params: FollowParams) -> Result<bool>;

    /// Reverse until the intersection pattern reappears
    fn back_to_intersection(&mut self, velocity: f32) -> Result<()>;

    /// Read the left, front and right distance sensors once
    fn lateral_distances(&mut self) -> Result<LateralDistances>;

    /// Approach and grab the block ahead
    ///
    /// `accepted` lists the colors with a bin in the staging lane. Returns the
    /// classified color of whatever was grabbed, or `None` when nothing was.
    fn pick_up(&mut self, distance_mm: f32, accepted: &[Color]) -> Result<Option<Color>>;

    /// Stop both motors
    fn stop(&mut self) -> Result<()>;
}

/// Staging-lane primitives
pub trait StagingLane: Send {
    /// Leave the arena at column 0 into the staging lane, facing the bins
    fn enter_staging(&mut self, velocity: f32) -> Result<()>;

    /// One line-following step along the current heading
    fn lane_tick(&mut self, velocity: f32) -> Result<LaneTick>;

    /// Follow the lane line for a fixed distance. Negative distances reverse.
    fn lane_creep(&mut self, distance_mm: f32, velocity: f32) -> Result<()>;

    /// Single blocking read of a side distance sensor
    fn lane_distance(&mut self, side: Side) -> Result<u32>;

    /// Independent reader for a side distance sensor, usable from a poller thread
    fn distance_probe(&mut self, side: Side) -> Result<Box<dyn DistanceProbe>>;

    /// Lane odometry: millimeters from the forward-start end marker
    fn lane_position(&mut self) -> Result<f32>;

    /// Read the bin color sensor
    fn read_bin_color(&mut self) -> Result<Hsv>;

    /// Release the carried block
    fn deposit(&mut self, style: DepositStyle) -> Result<()>;

    /// Drive from the lane back onto the arena grid and stop at column 0
    fn exit_to_arena(&mut self, velocity: f32) -> Result<bool>;

    /// Monotonic mission clock
    fn clock(&mut self) -> Result<Duration>;
}

/// A complete rover
pub trait Rover: Actuator + StagingLane {}

impl<T: Actuator + StagingLane + ?Sized> Rover for T {}

/// Side distance sensor reader detached from the control loop
pub trait DistanceProbe: Send {
    fn read_mm(&mut self) -> Result<u32>;
}

/// Handle that stops the rover from any thread (signal handlers included)
///
/// After `halt()` every motion primitive fails with [`crate::Error::Halted`].
pub trait EmergencyStop: Send + Sync {
    fn halt(&self);
}
