//! Lane travel shared by discovery, deposits and the mission
//!
//! Slot `i` sits beside arena row `rows - 1 - i`, so the row the rover comes
//! back out at follows from where it stands in the lane, not from where it
//! meant to go.

use yantra_io::color::classify_line;
use yantra_io::{Color, Rover, TurnMode};

use crate::config::MargaConfig;
use crate::error::{NavError, Result};

/// Arena row beside lane position `x_mm`
pub fn row_at(x_mm: f32, config: &MargaConfig) -> i32 {
    let staging = &config.staging;
    let last = config.arena.rows.saturating_sub(1) as f32;
    let slot = ((x_mm - staging.first_slot_mm) / staging.slot_spacing_mm.max(1.0))
        .round()
        .clamp(0.0, last);
    config.arena.rows as i32 - 1 - slot as i32
}

/// Leave the lane onto column 0, already facing the arena
///
/// Returns the row the rover comes back out at.
pub fn exit_lane(rover: &mut dyn Rover, config: &MargaConfig) -> Result<i32> {
    let x = rover.lane_position()?;
    let row = row_at(x, config);
    if !rover.exit_to_arena(config.motion.slow)? {
        tracing::warn!("Lane exit not confirmed");
    }
    tracing::debug!("Left the lane at {:.0} mm into row {}", x, row);
    Ok(row)
}

/// Turn around, follow the lane back to its start marker and face forward again
pub fn return_to_start(rover: &mut dyn Rover, config: &MargaConfig) -> Result<()> {
    rover.turn(180.0, config.motion.slow, TurnMode::Gyro)?;
    run_to_lane_end(rover, config)?;
    rover.turn(-180.0, config.motion.slow, TurnMode::Gyro)?;
    Ok(())
}

/// Follow the lane along the current heading until the end marker
pub fn run_to_lane_end(rover: &mut dyn Rover, config: &MargaConfig) -> Result<()> {
    let mut travelled = 0.0f32;
    loop {
        let tick = rover.lane_tick(config.motion.normal)?;
        travelled += tick.travelled_mm;
        if classify_line(tick.line) == Some(Color::Red) {
            return Ok(());
        }
        if travelled > config.staging.max_search_mm || tick.travelled_mm <= 0.0 {
            return Err(NavError::LaneEndMissing(travelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yantra_io::devices::virtual_rover::config::SimulationConfig;
    use yantra_io::devices::virtual_rover::{Location, VirtualRover};
    use yantra_io::{Actuator, StagingLane};

    fn lane_rover() -> VirtualRover {
        VirtualRover::new(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_row_at_slot_centres() {
        let config = MargaConfig::default();
        assert_eq!(row_at(150.0, &config), 4);
        assert_eq!(row_at(430.0, &config), 3);
        assert_eq!(row_at(1270.0, &config), 0);
        // Between slots rounds to the nearer one
        assert_eq!(row_at(560.0, &config), 3);
        assert_eq!(row_at(580.0, &config), 2);
    }

    #[test]
    fn test_row_at_clamps_to_the_arena() {
        let config = MargaConfig::default();
        assert_eq!(row_at(0.0, &config), 4);
        assert_eq!(row_at(-300.0, &config), 4);
        assert_eq!(row_at(1420.0, &config), 0);
        assert_eq!(row_at(9000.0, &config), 0);
    }

    #[test]
    fn test_exit_lane_reports_actual_row() {
        let mut rover = lane_rover();
        let observer = rover.observer();
        let config = MargaConfig::default();
        rover.lane_creep(440.0, 200.0).unwrap();
        rover.turn(90.0, 100.0, TurnMode::Gyro).unwrap();
        let row = exit_lane(&mut rover, &config).unwrap();
        assert_eq!(row, 3);
        assert_eq!(observer.location(), Location::Arena);
        assert_eq!(observer.arena_pose(), ((3, -1), (3, 0)));
    }

    #[test]
    fn test_return_to_start_faces_forward() {
        let mut rover = lane_rover();
        let observer = rover.observer();
        rover.lane_creep(800.0, 200.0).unwrap();
        return_to_start(&mut rover, &MargaConfig::default()).unwrap();
        assert_eq!(observer.lane_pose(), (0.0, 0.0));
    }

    #[test]
    fn test_run_to_lane_end_stops_on_marker() {
        let mut rover = lane_rover();
        let observer = rover.observer();
        run_to_lane_end(&mut rover, &MargaConfig::default()).unwrap();
        assert_eq!(observer.lane_pose(), (1420.0, 0.0));
    }
}
