//! Arena exploration state machine.
//!
//! One call to [`Explorer::step`] runs exactly one phase against the rover and
//! names the phase to run next:
//!
//! ```text
//!   Advance ─▶ Scan ─┬─ block adjacent ─▶ Retrieve ─┬─ valid ─▶ ReturnToStaging ─▶ Grabbed
//!     ▲              │                              └─ invalid / noise ─▶ Scan or Route
//!     │              └─▶ Route ─┬─ hop ─▶ Travel ─▶ Advance
//!     │                         ├─ staging hop ─▶ ReturnToStaging (detour) ─▶ Advance
//!     │                         └─ nothing reachable ─▶ Reset ─▶ Scan
//! ```
//!
//! Blocks adjacent to the current node always win over routing; block-adjacent
//! destinations win over frontier destinations. A cycle is bounded twice: by
//! the number of phases it may run, and by the number of knowledge resets in
//! a row that turn up nothing to grab.

use std::sync::atomic::{AtomicBool, Ordering};

use yantra_io::{Color, FollowParams, LateralDistances, Rover, TurnMode};

use crate::config::MargaConfig;
use crate::error::{NavError, Result};
use crate::map::{GridMap, Knowledge, Node, classify_distance, route};
use crate::position::{GridPoint, Pose};
use crate::staging::lane::exit_lane;
use crate::status::{StatusEvent, StatusSender};

/// Phase of the exploration cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Drive a short distance into the intersection
    Advance,
    /// Read the lateral sensors and update the map
    Scan,
    /// Pick up the block on an adjacent edge
    Retrieve,
    /// Choose the next hop
    Route,
    /// Turn and follow the line to the next intersection
    Travel,
    /// Carry a block to the lane, or pass through it when routing demands
    ReturnToStaging,
    /// Forget transient knowledge after running out of destinations
    Reset,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Advance => "advance",
            Phase::Scan => "scan",
            Phase::Retrieve => "retrieve",
            Phase::Route => "route",
            Phase::Travel => "travel",
            Phase::ReturnToStaging => "return-to-staging",
            Phase::Reset => "reset",
        }
    }
}

/// Result of one exploration step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorationStep {
    Next(Phase),
    /// A valid block is held and the rover stands in the staging entrance of `row`
    Grabbed { color: Color, row: i32 },
}

/// Grid explorer.
pub struct Explorer<'a> {
    rover: &'a mut dyn Rover,
    map: &'a mut GridMap,
    config: &'a MargaConfig,
    pose: Pose,
    phase: Phase,
    accepted: Vec<Color>,
    next_hop: Option<Node>,
    carrying: Option<Color>,
    /// Resets since the last grab
    resets: usize,
    shutdown: Option<&'a AtomicBool>,
    status: StatusSender,
}

impl<'a> Explorer<'a> {
    /// `accepted` lists the colors a bin exists for; anything else is invalid.
    pub fn new(
        rover: &'a mut dyn Rover,
        map: &'a mut GridMap,
        config: &'a MargaConfig,
        pose: Pose,
        accepted: Vec<Color>,
    ) -> Self {
        Self {
            rover,
            map,
            config,
            pose,
            phase: Phase::Advance,
            accepted,
            next_hop: None,
            carrying: None,
            resets: 0,
            shutdown: None,
            status: StatusSender::disabled(),
        }
    }

    /// Observe `flag` between phases; a raised flag ends the cycle
    pub fn with_shutdown(mut self, flag: &'a AtomicBool) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn with_status(mut self, status: StatusSender) -> Self {
        self.status = status;
        self
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drive phases until a valid block is grabbed and brought to the lane entrance.
    ///
    /// Returns the block color and the arena row of the entrance. Fails with
    /// [`NavError::ArenaExhausted`] once resets stop turning up blocks.
    pub fn run_cycle(&mut self) -> Result<(Color, i32)> {
        let max_steps = self.config.exploration.max_cycle_steps.max(1);
        for _ in 0..max_steps {
            if self.shutdown.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                return Err(NavError::Interrupted);
            }
            match self.step()? {
                ExplorationStep::Grabbed { color, row } => return Ok((color, row)),
                ExplorationStep::Next(_) => {}
            }
        }
        Err(NavError::ExplorationStalled { steps: max_steps })
    }

    /// Run the current phase.
    pub fn step(&mut self) -> Result<ExplorationStep> {
        self.status.publish(StatusEvent::Phase {
            phase: self.phase.name(),
            position: self.pose.current,
        });
        let step = match self.phase {
            Phase::Advance => self.advance()?,
            Phase::Scan => self.scan_phase()?,
            Phase::Retrieve => self.retrieve()?,
            Phase::Route => self.route()?,
            Phase::Travel => self.travel()?,
            Phase::ReturnToStaging => self.return_to_staging()?,
            Phase::Reset => self.reset()?,
        };
        if let ExplorationStep::Next(phase) = step {
            tracing::debug!("{} -> {} at {}", self.phase.name(), phase.name(), self.pose.current);
            self.phase = phase;
        } else {
            // A fresh cycle starts from the lane entrance
            self.phase = Phase::Advance;
        }
        Ok(step)
    }

    fn here(&self) -> Node {
        Node::Point(self.pose.current)
    }

    fn follow_params(&self, carrying: bool) -> FollowParams {
        FollowParams {
            threshold: self.config.motion.follow_threshold,
            ..FollowParams::new(self.config.motion.normal)
                .with_min_time(self.config.exploration.min_follow_time)
                .carrying(carrying)
        }
    }

    /// Rotate in place to face the adjacent node `target`
    ///
    /// The pose is left alone when no turn can be derived.
    fn face(&mut self, target: GridPoint, mode: TurnMode) -> Result<()> {
        let Some(angle) = self.pose.turn_towards(target) else {
            return Err(NavError::PoseLost(format!(
                "no turn from {:?} toward {}",
                self.pose, target
            )));
        };
        if angle != 0 {
            self.rover
                .turn(angle as f32, self.config.motion.slow, mode)?;
        }
        self.pose.face(target);
        Ok(())
    }

    fn advance(&mut self) -> Result<ExplorationStep> {
        self.rover.advance(
            self.config.exploration.advance_mm,
            self.config.motion.normal,
        )?;
        Ok(ExplorationStep::Next(Phase::Scan))
    }

    /// Read the lateral sensors and fold the result into the map
    fn scan(&mut self) -> Result<LateralDistances> {
        let reads = self.config.exploration.reads_per_scan.max(1);
        let mut reading = self.rover.lateral_distances()?;
        for _ in 1..reads {
            reading = reading.max(self.rover.lateral_distances()?);
        }

        let near = self.config.exploration.near_mm;
        let medium = self.config.exploration.medium_mm;
        let neighbors = self.pose.neighbors();
        let current = self.pose.current;
        for (neighbor, mm) in [
            (neighbors.front, reading.front_mm),
            (neighbors.left, reading.left_mm),
            (neighbors.right, reading.right_mm),
        ] {
            self.map
                .apply_reading(current, neighbor, classify_distance(mm, near, medium));
        }

        tracing::debug!(
            "Scan at {} facing {:?}: left {} front {} right {}",
            current,
            self.pose.direction(),
            reading.left_mm,
            reading.front_mm,
            reading.right_mm
        );
        Ok(reading)
    }

    /// First adjacent `Block` edge, checked front, right, left, back
    fn adjacent_block(&self) -> Option<GridPoint> {
        let n = self.pose.neighbors();
        [n.front, n.right, n.left, n.back].into_iter().find(|&p| {
            self.map.knowledge(self.here(), Node::Point(p)) == Some(Knowledge::Block)
        })
    }

    fn after_scan(&self) -> Phase {
        if self.adjacent_block().is_some() {
            Phase::Retrieve
        } else {
            Phase::Route
        }
    }

    fn scan_phase(&mut self) -> Result<ExplorationStep> {
        self.scan()?;
        Ok(ExplorationStep::Next(self.after_scan()))
    }

    fn retrieve(&mut self) -> Result<ExplorationStep> {
        let Some(target) = self.adjacent_block() else {
            return Ok(ExplorationStep::Next(Phase::Route));
        };
        let config = self.config;
        let slow = config.motion.slow;
        let exploration = &config.exploration;

        if target != self.pose.neighbors().front {
            self.rover.back_to_intersection(slow)?;
            self.face(target, TurnMode::Gyro)?;
            self.rover.advance(exploration.block_turn_advance_mm, slow)?;
        }

        let here = self.here();
        let edge = Node::Point(target);
        let mut distance = exploration.pickup_start_mm;
        for attempt in 1..=exploration.max_pickup_attempts {
            let grabbed = self.rover.pick_up(distance, &self.accepted)?;
            self.rover.back_to_intersection(slow)?;

            match grabbed {
                Some(color) if color != Color::White && self.accepted.contains(&color) => {
                    tracing::info!(
                        "Grabbed {} block on {}-{} (attempt {})",
                        color,
                        here,
                        edge,
                        attempt
                    );
                    self.map.set_knowledge(here, edge, Knowledge::Empty);
                    self.carrying = Some(color);
                    self.resets = 0;
                    return Ok(ExplorationStep::Next(Phase::ReturnToStaging));
                }
                Some(color) => {
                    tracing::warn!(
                        "Object on {}-{} reads {}, marking it invalid",
                        here,
                        edge,
                        color
                    );
                    self.map.set_knowledge(here, edge, Knowledge::BlockWhite);
                    return Ok(ExplorationStep::Next(self.after_scan()));
                }
                None => {
                    self.rover
                        .advance(exploration.recheck_advance_mm, slow)?;
                    self.scan()?;
                    if self.map.knowledge(here, edge) != Some(Knowledge::Block) {
                        tracing::info!("Block on {}-{} vanished on rescan", here, edge);
                        return Ok(ExplorationStep::Next(self.after_scan()));
                    }
                    tracing::debug!(
                        "Pickup attempt {} at {:.0} mm missed, retrying",
                        attempt,
                        distance
                    );
                    distance += exploration.pickup_step_mm;
                }
            }
        }

        tracing::warn!(
            "Giving up on {}-{} after {} pickup attempts",
            here,
            edge,
            exploration.max_pickup_attempts
        );
        self.map.set_knowledge(here, edge, Knowledge::BlockWhite);
        Ok(ExplorationStep::Next(self.after_scan()))
    }

    fn route(&mut self) -> Result<ExplorationStep> {
        let origin = self.here();
        let path = match route::to_blocks(self.map, origin) {
            Some(path) => Some(path),
            None => route::to_frontier(self.map, origin),
        };
        let Some(path) = path else {
            return Ok(ExplorationStep::Next(Phase::Reset));
        };

        tracing::debug!(
            "Route from {} to {} ({} hops)",
            origin,
            path.last().copied().unwrap_or(origin),
            path.len().saturating_sub(1)
        );
        match path.get(1).copied() {
            None => Ok(ExplorationStep::Next(Phase::Reset)),
            Some(Node::Staging) => {
                self.next_hop = None;
                Ok(ExplorationStep::Next(Phase::ReturnToStaging))
            }
            Some(next) => {
                self.next_hop = Some(next);
                Ok(ExplorationStep::Next(Phase::Travel))
            }
        }
    }

    fn travel(&mut self) -> Result<ExplorationStep> {
        let Some(Node::Point(next)) = self.next_hop.take() else {
            return Ok(ExplorationStep::Next(Phase::Route));
        };
        self.face(next, TurnMode::Encoder)?;
        let params = self.follow_params(false);
        if self.rover.follow_to_intersection(params)? {
            self.pose.advance_to(next);
            Ok(ExplorationStep::Next(Phase::Advance))
        } else {
            tracing::warn!("No intersection found toward {}", next);
            Ok(ExplorationStep::Next(Phase::Scan))
        }
    }

    fn return_to_staging(&mut self) -> Result<ExplorationStep> {
        match self.carrying {
            Some(color) => self.carry_to_staging(color),
            None => self.detour_through_staging(),
        }
    }

    fn staging_path(&self) -> Result<Vec<Node>> {
        let origin = self.here();
        if let Some(path) = route::to_staging(self.map, origin) {
            return Ok(path);
        }
        // Retrievable blocks may be pushed aside while carrying; invalid ones may not
        let mut relaxed = self.map.clone();
        relaxed.reset();
        route::to_staging(&relaxed, origin).ok_or_else(|| NavError::NoRoute(origin.to_string()))
    }

    fn carry_to_staging(&mut self, color: Color) -> Result<ExplorationStep> {
        let max_hops = self.map.rows() * self.map.cols();
        let mut hops = 0;
        loop {
            let path = self.staging_path()?;
            if path.len() <= 2 {
                break;
            }
            let Node::Point(next) = path[1] else {
                break;
            };
            if hops >= max_hops {
                return Err(NavError::NoRoute(format!(
                    "{} after {} hops",
                    self.pose.current, hops
                )));
            }
            hops += 1;
            self.face(next, TurnMode::Encoder)?;
            let params = self.follow_params(true);
            if !self.rover.follow_to_intersection(params)? {
                tracing::info!("Lane marker seen on the way back at {}", self.pose.current);
                break;
            }
            self.pose.advance_to(next);
            self.scan()?;
        }

        let row = self.pose.current.row;
        self.face(GridPoint::new(row, -1), TurnMode::Gyro)?;
        self.rover.enter_staging(self.config.motion.slow)?;
        self.carrying = None;
        tracing::info!("Carrying {} into the lane from row {}", color, row);
        self.status.publish(StatusEvent::Grabbed { color, row });
        Ok(ExplorationStep::Grabbed { color, row })
    }

    /// Cross through the lane and re-enter the arena one row along
    ///
    /// The pose afterwards follows where the rover actually left the lane.
    fn detour_through_staging(&mut self) -> Result<ExplorationStep> {
        let row = self.pose.current.row;
        let rows = self.map.rows() as i32;
        let slow = self.config.motion.slow;

        self.face(GridPoint::new(row, -1), TurnMode::Gyro)?;
        self.rover.enter_staging(slow)?;

        // Facing the bins, a right-hand quarter turn runs toward the lower rows
        let (target, sign) = if row + 1 < rows {
            (row + 1, -1.0)
        } else if row > 0 {
            (row - 1, 1.0)
        } else {
            (row, 0.0)
        };
        if sign == 0.0 {
            self.rover.turn(180.0, slow, TurnMode::Gyro)?;
        } else {
            self.rover.turn(90.0 * sign, slow, TurnMode::Gyro)?;
            self.rover
                .lane_creep(self.config.staging.slot_spacing_mm, slow)?;
            self.rover.turn(90.0 * sign, slow, TurnMode::Gyro)?;
        }
        let exit_row = exit_lane(self.rover, self.config)?;
        if exit_row != target {
            tracing::warn!("Detour aimed for row {} but left the lane at row {}", target, exit_row);
        }

        tracing::info!("Detoured through the lane from row {} to row {}", row, exit_row);
        self.pose = Pose::at_entrance(exit_row);
        Ok(ExplorationStep::Next(Phase::Advance))
    }

    fn reset(&mut self) -> Result<ExplorationStep> {
        if self.resets >= self.config.exploration.max_resets {
            tracing::info!("Nothing found after {} resets, arena cleared", self.resets);
            return Err(NavError::ArenaExhausted {
                resets: self.resets,
            });
        }
        self.resets += 1;
        tracing::info!(
            "No reachable block or frontier from {}, resetting map knowledge",
            self.pose.current
        );
        self.map.reset();
        let back = Node::Point(self.pose.neighbors().back);
        self.map.set_knowledge(self.here(), back, Knowledge::Empty);
        self.status
            .publish(StatusEvent::Message("map knowledge reset".to_string()));
        Ok(ExplorationStep::Next(Phase::Scan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yantra_io::Actuator;
    use yantra_io::devices::virtual_rover::VirtualRover;
    use yantra_io::devices::virtual_rover::config::{BlockPlacement, SimulationConfig, StartLocation};

    fn rover_with(blocks: Vec<BlockPlacement>) -> VirtualRover {
        VirtualRover::new(SimulationConfig {
            start: StartLocation::Arena,
            blocks,
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    fn block(a: [i32; 2], b: [i32; 2], color: Color) -> BlockPlacement {
        BlockPlacement { a, b, color }
    }

    fn accepted() -> Vec<Color> {
        vec![Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Black]
    }

    #[test]
    fn test_known_block_targets_neighbor_first() {
        let mut rover = rover_with(vec![block([0, 0], [1, 0], Color::Blue)]);
        let observer = rover.observer();
        let mut map = GridMap::new(5, 6);
        map.set_knowledge(Node::at(0, 0), Node::at(1, 0), Knowledge::Block);
        let config = MargaConfig::default();

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted());
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Scan));
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Retrieve));
        assert_eq!(
            explorer.step().unwrap(),
            ExplorationStep::Next(Phase::ReturnToStaging)
        );
        // Turned toward (1,0) without leaving (0,0)
        assert_eq!(explorer.pose().current, GridPoint::new(0, 0));
        assert_eq!(explorer.pose().neighbors().front, GridPoint::new(1, 0));
        assert_eq!(observer.carried(), Some(Color::Blue));

        assert_eq!(
            explorer.step().unwrap(),
            ExplorationStep::Grabbed {
                color: Color::Blue,
                row: 0
            }
        );
        drop(explorer);
        assert_eq!(
            map.knowledge(Node::at(0, 0), Node::at(1, 0)),
            Some(Knowledge::Empty)
        );
    }

    #[test]
    fn test_invalid_block_is_written_off() {
        let mut rover = rover_with(vec![block([0, 0], [0, 1], Color::White)]);
        let mut map = GridMap::new(5, 6);
        let config = MargaConfig::default();

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted());
        explorer.step().unwrap();
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Retrieve));
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Route));
        drop(explorer);

        assert_eq!(
            map.knowledge(Node::at(0, 0), Node::at(0, 1)),
            Some(Knowledge::BlockWhite)
        );
    }

    #[test]
    fn test_unclassifiable_block_hits_attempt_cap() {
        let mut rover = rover_with(vec![block([0, 0], [0, 1], Color::Brown)]);
        let mut map = GridMap::new(5, 6);
        let mut config = MargaConfig::default();
        config.exploration.max_pickup_attempts = 3;

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted());
        explorer.step().unwrap();
        explorer.step().unwrap();
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Route));
        drop(explorer);

        assert_eq!(
            map.knowledge(Node::at(0, 0), Node::at(0, 1)),
            Some(Knowledge::BlockWhite)
        );
    }

    #[test]
    fn test_cycle_finds_distant_block() {
        let mut rover = rover_with(vec![block([3, 3], [3, 4], Color::Green)]);
        let observer = rover.observer();
        let mut map = GridMap::new(5, 6);
        let config = MargaConfig::default();

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted());
        let (color, row) = explorer.run_cycle().unwrap();
        assert_eq!(color, Color::Green);
        assert_eq!(explorer.pose().current.col, 0);
        assert_eq!(explorer.pose().current.row, row);
        assert_eq!(observer.remaining_blocks(), 0);
    }

    #[test]
    fn test_reset_frees_back_edge() {
        let mut rover = rover_with(Vec::new());
        let mut map = GridMap::new(2, 2);
        for (a, b, k) in map.edges().collect::<Vec<_>>() {
            if k == Knowledge::Unknown {
                map.set_knowledge(a, b, Knowledge::BlockWhite);
            }
        }
        let config = MargaConfig::default();
        let pose = Pose::new(GridPoint::new(0, 0), GridPoint::new(0, 1));

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, pose, accepted());
        explorer.phase = Phase::Route;
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Reset));
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Scan));
        drop(explorer);

        assert_eq!(
            map.knowledge(Node::at(0, 1), Node::at(0, 0)),
            Some(Knowledge::Empty)
        );
        assert_eq!(map.count(Knowledge::BlockWhite), 3);
    }

    #[test]
    fn test_detour_through_lane() {
        let mut rover = rover_with(Vec::new());
        let observer = rover.observer();
        let mut map = GridMap::new(5, 6);
        // Only the entrance leads anywhere from (2,0)
        map.set_knowledge(Node::at(2, 0), Node::at(1, 0), Knowledge::BlockWhite);
        map.set_knowledge(Node::at(2, 0), Node::at(3, 0), Knowledge::BlockWhite);
        map.set_knowledge(Node::at(2, 0), Node::at(2, 1), Knowledge::BlockWhite);
        let config = MargaConfig::default();

        // Put the virtual rover at (2,0) as well
        rover.turn(90.0, 100.0, TurnMode::Encoder).unwrap();
        rover.follow_to_intersection(FollowParams::new(100.0)).unwrap();
        rover.follow_to_intersection(FollowParams::new(100.0)).unwrap();
        let pose = Pose::new(GridPoint::new(1, 0), GridPoint::new(2, 0));

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, pose, accepted());
        explorer.phase = Phase::Route;
        assert_eq!(
            explorer.step().unwrap(),
            ExplorationStep::Next(Phase::ReturnToStaging)
        );
        assert_eq!(explorer.step().unwrap(), ExplorationStep::Next(Phase::Advance));
        assert_eq!(explorer.pose(), Pose::at_entrance(3));
        assert_eq!(observer.arena_pose(), ((3, -1), (3, 0)));
    }

    #[test]
    fn test_face_without_heading_keeps_pose() {
        let mut rover = rover_with(Vec::new());
        let mut map = GridMap::new(5, 6);
        let config = MargaConfig::default();
        // No heading: previous and current coincide
        let lost = Pose::new(GridPoint::new(1, 1), GridPoint::new(1, 1));

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, lost, accepted());
        let result = explorer.face(GridPoint::new(2, 1), TurnMode::Encoder);
        assert!(matches!(result, Err(NavError::PoseLost(_))));
        assert_eq!(explorer.pose(), lost);

        // Known heading but a target that is not adjacent
        explorer.pose = Pose::default();
        let result = explorer.face(GridPoint::new(2, 2), TurnMode::Encoder);
        assert!(matches!(result, Err(NavError::PoseLost(_))));
        assert_eq!(explorer.pose(), Pose::default());
    }

    #[test]
    fn test_empty_arena_ends_after_bounded_resets() {
        let mut rover = VirtualRover::new(SimulationConfig {
            start: StartLocation::Arena,
            block_count: 0,
            ..SimulationConfig::default()
        })
        .unwrap();
        let mut map = GridMap::new(5, 6);
        let config = MargaConfig::default();

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted());
        let result = explorer.run_cycle();
        assert!(matches!(result, Err(NavError::ArenaExhausted { resets: 3 })));
    }

    #[test]
    fn test_cycle_gives_up_after_phase_budget() {
        let mut rover = rover_with(vec![block([4, 4], [4, 5], Color::Green)]);
        let mut map = GridMap::new(5, 6);
        let mut config = MargaConfig::default();
        config.exploration.max_cycle_steps = 4;

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted());
        assert!(matches!(
            explorer.run_cycle(),
            Err(NavError::ExplorationStalled { steps: 4 })
        ));
    }

    #[test]
    fn test_shutdown_interrupts_cycle() {
        let mut rover = rover_with(Vec::new());
        let mut map = GridMap::new(5, 6);
        let config = MargaConfig::default();
        let flag = AtomicBool::new(true);

        let mut explorer = Explorer::new(&mut rover, &mut map, &config, Pose::default(), accepted())
            .with_shutdown(&flag);
        assert!(matches!(explorer.run_cycle(), Err(NavError::Interrupted)));
    }
}
