//! Targeted deposit into the bin of the carried block's color
//!
//! The rover arrives from the arena beside the slot of its entrance row,
//! facing the bins. When the matching bin is right there and still empty of
//! deliveries it drops the block straight in. Otherwise it turns along the lane
//! and counts bins toward the target:
//!
//! ```text
//!   entrance ─▶ turn along lane ─▶ count N bins ─┬─ found ────────────────▶ approach ─▶ deposit
//!                     ▲                          │  (arrived in reverse: overrun, turn, recount)
//!                     └── turn 180, recount ◀─ lane end (bounded)
//! ```
//!
//! Bins are always approached running forward, so a search that ends in
//! reverse overruns the bin, turns around and counts it again. The row the
//! rover re-enters the arena at is read off the lane odometry on the way out.

use yantra_io::{Color, DepositStyle, Rover, Side, TurnMode};

use super::lane::exit_lane;
use super::registry::{BinRegistry, LaneHeading};
use super::slot_counter::{SearchOutcome, SlotCounter, SlotSearch};
use crate::config::MargaConfig;
use crate::error::{NavError, Result};

/// Drive past the entrance line before turning along the lane
const TURN_CLEARANCE_MM: f32 = 20.0;
/// Back-off after turning so the entrance bin is counted
const SEARCH_BACKOFF_MM: f32 = 75.0;
/// Back-off after turning around on a lane end
const REROUTE_BACKOFF_MM: f32 = 30.0;
/// Back-off after turning around on a reverse arrival
const TURNAROUND_BACKOFF_MM: f32 = 20.0;
/// Head-on approach toward the bin
const HEAD_ON_APPROACH_MM: f32 = 30.0;
/// Extra approach for the bins at either lane end
const HEAD_ON_END_EXTRA_MM: f32 = 5.0;
const HEAD_ON_RETREAT_MM: f32 = 20.0;
/// Turn from facing the bins to facing the arena, short of a half turn
const HEAD_ON_TURN_DEG: f32 = 175.0;

/// Deliver the carried `color` block from the entrance at `entrance_row`
///
/// Returns the arena row the rover re-entered at, which differs from the
/// row of the bin when the registry and the lane disagree.
pub fn deposit_block(
    rover: &mut dyn Rover,
    registry: &mut BinRegistry,
    config: &MargaConfig,
    color: Color,
    entrance_row: i32,
) -> Result<i32> {
    Depositor::new(rover, registry, config).deliver(color, entrance_row)
}

struct Depositor<'a> {
    rover: &'a mut dyn Rover,
    registry: &'a mut BinRegistry,
    config: &'a MargaConfig,
    counter: SlotCounter,
}

impl<'a> Depositor<'a> {
    fn new(rover: &'a mut dyn Rover, registry: &'a mut BinRegistry, config: &'a MargaConfig) -> Self {
        Self {
            rover,
            registry,
            config,
            counter: SlotCounter::from_config(&config.staging),
        }
    }

    fn deliver(&mut self, color: Color, entrance_row: i32) -> Result<i32> {
        let index = self
            .registry
            .index_of(color)
            .ok_or_else(|| NavError::InvalidRegistry(format!("no {} bin in {}", color, self.registry)))?;
        let bin_row = self.registry.len() as i32 - 1 - index as i32;
        let head_on = self.config.staging.deposit_head_on;
        let visits = self.registry.deposits(color);

        let exit_row = if head_on && visits == 0 && bin_row == entrance_row {
            self.deposit_head_on(index)?
        } else {
            let target = self
                .registry
                .target_for(color, entrance_row, head_on)
                .ok_or_else(|| {
                    NavError::InvalidRegistry(format!(
                        "entrance row {} outside a {}-slot lane",
                        entrance_row,
                        self.registry.len()
                    ))
                })?;
            tracing::debug!(
                "Searching {:?} for {} bin: slot {}, {} bins to count, {} empty skipped",
                target.heading,
                color,
                target.slot_number,
                target.steps,
                target.skipped_empty
            );
            self.turn_along_lane(target.heading)?;
            let heading = self.search_for_bin(color, target.heading, target.steps)?;
            if heading == LaneHeading::Reverse {
                self.turn_back_onto_bin()?;
            }
            self.deposit_alongside(index, visits)?;
            self.leave_lane()?
        };

        self.registry.record_deposit(color);
        if exit_row != bin_row {
            tracing::warn!(
                "Expected the {} bin beside row {} but left the lane at row {}",
                color,
                bin_row,
                exit_row
            );
        }
        tracing::info!(
            "Deposited {} in slot {} ({} so far), back in the arena at row {}",
            color,
            index + 1,
            self.registry.deposits(color),
            exit_row
        );
        Ok(exit_row)
    }

    fn deposit_head_on(&mut self, index: usize) -> Result<i32> {
        let slow = self.config.motion.slow;
        let last = self.registry.len().saturating_sub(1);
        let trim = self
            .config
            .staging
            .head_on_trim_deg
            .get(index)
            .copied()
            .unwrap_or(0.0);

        self.rover.advance(HEAD_ON_APPROACH_MM, slow)?;
        if trim != 0.0 {
            self.rover.turn(trim, slow, TurnMode::Gyro)?;
        }
        if index == 0 || index == last {
            self.rover.advance(HEAD_ON_END_EXTRA_MM, slow)?;
        }
        self.rover.deposit(DepositStyle::HeadOn)?;
        self.rover.advance(-HEAD_ON_RETREAT_MM, slow)?;
        self.rover.turn(HEAD_ON_TURN_DEG, slow, TurnMode::Gyro)?;
        exit_lane(self.rover, self.config)
    }

    /// From facing the bins, turn to run along the lane with the entrance bin ahead
    fn turn_along_lane(&mut self, heading: LaneHeading) -> Result<()> {
        let slow = self.config.motion.slow;
        self.rover.advance(TURN_CLEARANCE_MM, slow)?;
        self.rover.turn(90.0 * heading.sign(), slow, TurnMode::Gyro)?;
        self.rover.lane_creep(-SEARCH_BACKOFF_MM, slow)?;
        Ok(())
    }

    /// Count bins toward the target, turning around at lane ends
    ///
    /// Returns the heading the search finished in.
    fn search_for_bin(&mut self, color: Color, mut heading: LaneHeading, mut steps: usize) -> Result<LaneHeading> {
        let slow = self.config.motion.slow;
        let max_retries = self.config.staging.max_route_retries;
        let mut reroutes = 0;

        loop {
            let search = SlotSearch::new(steps, heading.sensor_side(), slow);
            match self.counter.search(self.rover, &search)? {
                SearchOutcome::Found => return Ok(heading),
                outcome => {
                    if reroutes >= max_retries {
                        return Err(NavError::BinUnreachable {
                            color,
                            attempts: reroutes,
                        });
                    }
                    reroutes += 1;
                    self.rover.turn(180.0 * heading.sign(), slow, TurnMode::Gyro)?;
                    self.rover.lane_creep(-REROUTE_BACKOFF_MM, slow)?;
                    heading = heading.flip();
                    steps = self.registry.reroute_steps(color, heading).ok_or_else(|| {
                        NavError::InvalidRegistry(format!("no {} bin in {}", color, self.registry))
                    })?;
                    tracing::warn!(
                        "{:?} while looking for the {} bin, rerouting {:?} over {} bins ({}/{})",
                        outcome,
                        color,
                        heading,
                        steps,
                        reroutes,
                        max_retries
                    );
                }
            }
        }
    }

    /// Reverse arrival: run past the target, turn around and count back to it
    fn turn_back_onto_bin(&mut self) -> Result<()> {
        let staging = &self.config.staging;
        let slow = self.config.motion.slow;

        // The target itself is still in view, so the count includes it
        let overrun = SlotSearch::new(2, Side::Right, slow).within(staging.reverse_window_mm);
        let outcome = self.counter.search(self.rover, &overrun)?;
        let at_end = outcome == SearchOutcome::LaneEnd;
        if !at_end {
            self.rover.lane_creep(staging.reverse_overrun_mm, slow)?;
        }
        self.rover.turn(180.0, slow, TurnMode::Gyro)?;
        if !at_end {
            self.rover.lane_creep(-TURNAROUND_BACKOFF_MM, slow)?;
        }

        let count = if outcome == SearchOutcome::Found { 2 } else { 1 };
        let recount = SlotSearch::new(count, Side::Left, slow).through_lane_end();
        if self.counter.search(self.rover, &recount)? != SearchOutcome::Found {
            tracing::warn!("Target bin not recounted after turning around");
        }
        Ok(())
    }

    /// Stand beside the detected bin running forward and release the block
    fn deposit_alongside(&mut self, index: usize, visits: usize) -> Result<()> {
        let staging = &self.config.staging;
        let slow = self.config.motion.slow;

        if visits > 0 || index == 0 {
            let pass = SlotSearch::new(1, Side::Left, slow).until_clear().through_lane_end();
            self.counter.search(self.rover, &pass)?;
            let backoff = staging
                .approach_backoff_mm
                .get(visits.min(staging.approach_backoff_mm.len().saturating_sub(1)))
                .copied()
                .unwrap_or(0.0);
            self.rover.lane_creep(-backoff, slow)?;
        } else {
            self.rover.lane_creep(staging.first_visit_creep_mm, slow)?;
        }
        self.rover.deposit(DepositStyle::Side)?;
        Ok(())
    }

    fn leave_lane(&mut self) -> Result<i32> {
        self.rover.turn(90.0, self.config.motion.slow, TurnMode::Gyro)?;
        exit_lane(self.rover, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::registry::BinSlot;
    use yantra_io::devices::virtual_rover::config::{BlockPlacement, SimulationConfig, StartLocation};
    use yantra_io::devices::virtual_rover::{Location, VirtualRover};
    use yantra_io::{Actuator, FollowParams, StagingLane};

    fn full_registry() -> BinRegistry {
        BinRegistry::parse(&["red", "green", "blue", "yellow", "black"]).unwrap()
    }

    /// Rover carrying `color` into the lane from the entrance of `row`
    ///
    /// The block waits on the edge east of `(row, 0)`.
    fn carrying_into_lane(color: Color, row: i32, bins: Vec<Option<Color>>) -> VirtualRover {
        let mut rover = VirtualRover::new(SimulationConfig {
            start: StartLocation::Arena,
            blocks: vec![BlockPlacement {
                a: [row, 0],
                b: [row, 1],
                color,
            }],
            bins,
            ..SimulationConfig::default()
        })
        .unwrap();

        // (0,0) facing right; walk down column 0 and face the block again
        if row > 0 {
            rover.turn(90.0, 100.0, TurnMode::Encoder).unwrap();
            for _ in 0..row {
                assert!(rover.follow_to_intersection(FollowParams::new(100.0)).unwrap());
            }
            rover.turn(-90.0, 100.0, TurnMode::Encoder).unwrap();
        }
        assert_eq!(rover.pick_up(45.0, &[color]).unwrap(), Some(color));
        rover.turn(180.0, 100.0, TurnMode::Gyro).unwrap();
        rover.enter_staging(100.0).unwrap();
        rover
    }

    #[test]
    fn test_head_on_when_bin_faces_entrance() {
        let mut rover = carrying_into_lane(Color::Black, 0, SimulationConfig::default().bins);
        let observer = rover.observer();
        let mut registry = full_registry();
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Black, 0).unwrap();
        assert_eq!(row, 0);
        let deliveries = observer.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].correct);
        assert_eq!(observer.location(), Location::Arena);
        assert_eq!(observer.arena_pose(), ((0, -1), (0, 0)));
        assert_eq!(registry.deposits(Color::Black), 1);
    }

    #[test]
    fn test_forward_search_deposits_alongside() {
        let mut rover = carrying_into_lane(Color::Blue, 4, SimulationConfig::default().bins);
        let observer = rover.observer();
        let mut registry = full_registry();
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Blue, 4).unwrap();
        assert_eq!(row, 2);
        assert!(observer.deliveries()[0].correct);
        assert_eq!(observer.arena_pose(), ((2, -1), (2, 0)));
    }

    #[test]
    fn test_reverse_search_turns_back_onto_bin() {
        let mut rover = carrying_into_lane(Color::Yellow, 0, SimulationConfig::default().bins);
        let observer = rover.observer();
        let mut registry = full_registry();
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Yellow, 0).unwrap();
        assert_eq!(row, 1);
        assert!(observer.deliveries()[0].correct);
    }

    #[test]
    fn test_reverse_search_to_first_slot() {
        let mut rover = carrying_into_lane(Color::Red, 1, SimulationConfig::default().bins);
        let observer = rover.observer();
        let mut registry = full_registry();
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Red, 1).unwrap();
        assert_eq!(row, 4);
        let delivery = observer.deliveries()[0];
        assert_eq!(delivery.slot, Some(0));
        assert!(delivery.correct);
    }

    #[test]
    fn test_empty_slot_skipped_on_the_way() {
        let bins = vec![Some(Color::Red), Some(Color::Green), None, Some(Color::Blue), Some(Color::Black)];
        let mut rover = carrying_into_lane(Color::Blue, 3, bins);
        let observer = rover.observer();
        let mut registry = BinRegistry::parse(&["red", "green", "empty", "blue", "black"]).unwrap();
        assert_eq!(registry.slots()[2], BinSlot::Empty);
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Blue, 3).unwrap();
        assert_eq!(row, 1);
        assert!(observer.deliveries()[0].correct);
    }

    #[test]
    fn test_second_visit_backs_off_after_passing() {
        let mut rover = carrying_into_lane(Color::Green, 3, SimulationConfig::default().bins);
        let observer = rover.observer();
        let mut registry = full_registry();
        registry.record_deposit(Color::Green);
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Green, 3).unwrap();
        assert_eq!(row, 3);
        assert!(observer.deliveries()[0].correct);
        assert_eq!(registry.deposits(Color::Green), 2);
    }

    #[test]
    fn test_missing_bins_exhaust_reroutes() {
        // The registry expects yellow where the lane has a gap
        let bins = vec![Some(Color::Red), Some(Color::Green), None, None, Some(Color::Black)];
        let mut rover = carrying_into_lane(Color::Yellow, 4, bins);
        let mut registry = full_registry();
        let config = MargaConfig {
            staging: crate::config::StagingConfig {
                max_route_retries: 0,
                ..Default::default()
            },
            ..MargaConfig::default()
        };
        let result = deposit_block(&mut rover, &mut registry, &config, Color::Yellow, 4);
        assert!(matches!(
            result,
            Err(NavError::BinUnreachable {
                color: Color::Yellow,
                attempts: 0
            })
        ));
        assert_eq!(registry.deposits(Color::Yellow), 0);
    }

    #[test]
    fn test_reroute_after_lane_end() {
        // The registry expects green in slot 1, which is vacant: counting five
        // bins forward runs off the lane end, counting one back finds black
        let bins = vec![Some(Color::Red), None, Some(Color::Blue), Some(Color::Yellow), Some(Color::Black)];
        let mut rover = carrying_into_lane(Color::Black, 4, bins);
        let observer = rover.observer();
        let mut registry = full_registry();
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Black, 4).unwrap();
        let deliveries = observer.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].color, Color::Black);
        assert_eq!(deliveries[0].slot, Some(4));
        assert!(deliveries[0].correct);
        assert_eq!(row, 0);
        assert_eq!(observer.location(), Location::Arena);
        assert_eq!(observer.arena_pose(), ((0, -1), (0, 0)));
        assert_eq!(registry.deposits(Color::Black), 1);
    }

    #[test]
    fn test_exit_row_follows_where_the_rover_stopped() {
        // The registry missed green, so counting two bins stops beside slot 1
        let mut rover = carrying_into_lane(Color::Blue, 4, SimulationConfig::default().bins);
        let observer = rover.observer();
        let mut registry = BinRegistry::parse(&["red", "empty", "blue", "yellow", "black"]).unwrap();
        let row = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Blue, 4).unwrap();
        let delivery = observer.deliveries()[0];
        assert_eq!(delivery.slot, Some(1));
        assert!(!delivery.correct);
        // Re-entry row matches the slot actually reached, not the bin's row
        assert_eq!(row, 3);
        assert_eq!(observer.arena_pose(), ((3, -1), (3, 0)));
    }

    #[test]
    fn test_unknown_color_is_rejected() {
        let mut rover = carrying_into_lane(Color::Blue, 2, SimulationConfig::default().bins);
        let mut registry = BinRegistry::parse(&["red", "green", "empty", "yellow", "black"]).unwrap();
        let result = deposit_block(&mut rover, &mut registry, &MargaConfig::default(), Color::Blue, 2);
        assert!(matches!(result, Err(NavError::InvalidRegistry(_))));
    }
}
