//! Virtual rover for hardware-free missions
//!
//! Implements the full [`Rover`](crate::Rover) contract over an in-memory
//! world: the arena grid with hidden blocks and the staging lane with its bins.
//! The mission layer cannot tell it apart from hardware, which makes it the
//! harness for end-to-end tests.
//!
//! # Overview
//!
//! | Primitive | Simulation |
//! |-----------|------------|
//! | `turn` | Quarter turns on the grid, free rotation in the lane |
//! | `follow_to_intersection` | Jump to the front neighbor |
//! | `lateral_distances` | 200 / 500 / 1000 mm from blocks on the next two edges |
//! | `pick_up` | Synthesized claw reading through the block classifier |
//! | `lane_tick` | Fixed-time step along the lane with line and distance readings |
//! | `deposit` | Lands in the nearest slot within tolerance |
//!
//! # Thread Model
//!
//! The world lives behind a `parking_lot::Mutex` so distance probes can be
//! polled from a background thread while the control loop drives the rover.
//! The emergency stop is an atomic flag checked before every motion.

mod arena;
pub mod config;
mod lane;
mod noise;

pub use lane::Delivery;

use crate::core::actuator::{Actuator, DistanceProbe, EmergencyStop, StagingLane};
use crate::core::types::{
    Color, DepositStyle, FollowParams, Hsv, LaneTick, LateralDistances, Side, TurnMode,
};
use crate::error::{Error, Result};
use arena::Arena;
use config::{SimulationConfig, StartLocation};
use lane::Lane;
use noise::WorldNoise;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Which part of the world the rover is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Arena,
    Lane,
}

struct World {
    arena: Arena,
    lane: Lane,
    location: Location,
    carried: Option<Color>,
    clock: Duration,
    tick: Duration,
    noise: WorldNoise,
    config: SimulationConfig,
}

impl World {
    fn new(config: SimulationConfig) -> Result<Self> {
        let mut noise = WorldNoise::new(config.random_seed, config.noise.clone());
        let arena = if config.blocks.is_empty() {
            Arena::mirrored(
                config.rows,
                config.cols,
                config.block_count,
                &config.palette,
                &mut noise,
            )?
        } else {
            Arena::with_blocks(config.rows, config.cols, &config.blocks)?
        };
        if config.bins.len() != config.rows {
            return Err(Error::Config(format!(
                "lane has {} slots but the arena has {} rows",
                config.bins.len(),
                config.rows
            )));
        }
        let mut lane = Lane::new(config.lane.clone(), config.bins.clone())?;
        lane.start_at_end();

        let location = match config.start {
            StartLocation::Lane => Location::Lane,
            StartLocation::Arena => Location::Arena,
        };

        Ok(Self {
            arena,
            lane,
            location,
            carried: None,
            clock: Duration::ZERO,
            tick: Duration::from_millis(config.lane.tick_ms),
            noise,
            config,
        })
    }

    fn require(&self, location: Location, op: &str) -> Result<()> {
        if self.location != location {
            return Err(Error::NotAligned(format!(
                "{} needs the rover in the {:?}, it is in the {:?}",
                op, location, self.location
            )));
        }
        Ok(())
    }

    fn row_of_slot(&self, slot: usize) -> i32 {
        self.config.rows as i32 - 1 - slot as i32
    }

    fn side_distance(&mut self, side: Side) -> u32 {
        if self.location != Location::Lane {
            return self.config.lane.open_reading_mm;
        }
        let clean = self.lane.side_distance(side);
        self.noise.side_reading(clean, self.lane.bin_reading_mm())
    }

    fn advance_clock(&mut self, distance_mm: f32, velocity: f32) {
        if velocity > 0.0 {
            self.clock += Duration::from_secs_f32(distance_mm.abs() / velocity);
        }
    }
}

/// Read-only view of the virtual world for tests and demos
#[derive(Clone)]
pub struct WorldObserver {
    world: Arc<Mutex<World>>,
}

impl WorldObserver {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.world.lock().lane.deliveries().to_vec()
    }

    pub fn remaining_blocks(&self) -> usize {
        self.world.lock().arena.block_count()
    }

    pub fn location(&self) -> Location {
        self.world.lock().location
    }

    pub fn carried(&self) -> Option<Color> {
        self.world.lock().carried
    }

    /// `(previous, current)` arena nodes
    pub fn arena_pose(&self) -> ((i32, i32), (i32, i32)) {
        self.world.lock().arena.position()
    }

    /// `(x_mm, heading_deg)` in the lane
    pub fn lane_pose(&self) -> (f32, f32) {
        self.world.lock().lane.position()
    }
}

/// Emergency stop handle for the virtual rover
pub struct VirtualStop {
    halted: Arc<AtomicBool>,
}

impl EmergencyStop for VirtualStop {
    fn halt(&self) {
        log::warn!("Virtual rover: emergency stop");
        self.halted.store(true, Ordering::SeqCst);
    }
}

/// Side distance sensor reader sharing the rover's world
pub struct VirtualProbe {
    world: Arc<Mutex<World>>,
    side: Side,
}

impl DistanceProbe for VirtualProbe {
    fn read_mm(&mut self) -> Result<u32> {
        Ok(self.world.lock().side_distance(self.side))
    }
}

/// In-memory rover
pub struct VirtualRover {
    world: Arc<Mutex<World>>,
    halted: Arc<AtomicBool>,
}

impl VirtualRover {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let world = World::new(config)?;
        log::info!(
            "Virtual rover: {}x{} arena with {} blocks, {} lane slots, start in {:?}",
            world.config.rows,
            world.config.cols,
            world.arena.block_count(),
            world.lane.slot_count(),
            world.location
        );
        Ok(Self {
            world: Arc::new(Mutex::new(world)),
            halted: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn emergency_stop(&self) -> Arc<dyn EmergencyStop> {
        Arc::new(VirtualStop {
            halted: Arc::clone(&self.halted),
        })
    }

    pub fn observer(&self) -> WorldObserver {
        WorldObserver {
            world: Arc::clone(&self.world),
        }
    }

    fn check_halted(&self) -> Result<()> {
        if self.halted.load(Ordering::SeqCst) {
            Err(Error::Halted)
        } else {
            Ok(())
        }
    }
}

impl Actuator for VirtualRover {
    fn advance(&mut self, distance_mm: f32, velocity: f32) -> Result<()> {
        self.check_halted()?;
        let mut world = self.world.lock();
        if world.location == Location::Lane {
            world.lane.nudge(distance_mm);
        }
        world.advance_clock(distance_mm, velocity);
        Ok(())
    }

    fn turn(&mut self, degrees: f32, _velocity: f32, _mode: TurnMode) -> Result<()> {
        self.check_halted()?;
        let mut world = self.world.lock();
        match world.location {
            Location::Arena => world.arena.turn(degrees),
            Location::Lane => {
                world.lane.turn(degrees);
                Ok(())
            }
        }
    }

    fn follow_to_intersection(&mut self, params: FollowParams) -> Result<bool> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Arena, "follow_to_intersection")?;
        let carrying = params.carrying_block && world.carried.is_some();
        world.arena.follow(carrying)
    }

    fn back_to_intersection(&mut self, _velocity: f32) -> Result<()> {
        self.check_halted()
    }

    fn lateral_distances(&mut self) -> Result<LateralDistances> {
        let world = self.world.lock();
        match world.location {
            Location::Arena => world.arena.lateral(),
            Location::Lane => Ok(LateralDistances::new(
                arena::CLEAR_READING_MM,
                arena::CLEAR_READING_MM,
                arena::CLEAR_READING_MM,
            )),
        }
    }

    fn pick_up(&mut self, distance_mm: f32, accepted: &[Color]) -> Result<Option<Color>> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Arena, "pick_up")?;
        if world.carried.is_some() {
            return Err(Error::InvalidParameter("claw already holds a block".to_string()));
        }
        let miss = world.noise.pickup_missed();
        let grab = world.arena.pick_up(accepted, miss)?;
        if grab.secured {
            world.carried = grab.classified;
        }
        log::debug!(
            "Virtual pickup at {:.0} mm: classified {:?}, secured {}",
            distance_mm,
            grab.classified,
            grab.secured
        );
        Ok(grab.classified)
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

impl StagingLane for VirtualRover {
    fn enter_staging(&mut self, _velocity: f32) -> Result<()> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Arena, "enter_staging")?;
        let (_, current) = world.arena.position();
        if current.1 != 0 || world.arena.heading() != Some(3) {
            return Err(Error::NotAligned(format!(
                "staging entrance needs column 0 facing west, rover at {:?} heading {:?}",
                current,
                world.arena.heading()
            )));
        }
        let slot = (world.config.rows as i32 - 1 - current.0).max(0) as usize;
        world.lane.enter_at(slot);
        world.location = Location::Lane;
        Ok(())
    }

    fn lane_tick(&mut self, velocity: f32) -> Result<LaneTick> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Lane, "lane_tick")?;
        let step = velocity * world.tick.as_secs_f32();
        let travelled_mm = world.lane.travel(step)?;
        let tick = world.tick;
        world.clock += tick;
        Ok(LaneTick {
            travelled_mm,
            line: world.lane.line_reading(),
        })
    }

    fn lane_creep(&mut self, distance_mm: f32, velocity: f32) -> Result<()> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Lane, "lane_creep")?;
        world.lane.travel(distance_mm)?;
        world.advance_clock(distance_mm, velocity);
        Ok(())
    }

    fn lane_distance(&mut self, side: Side) -> Result<u32> {
        Ok(self.world.lock().side_distance(side))
    }

    fn distance_probe(&mut self, side: Side) -> Result<Box<dyn DistanceProbe>> {
        Ok(Box::new(VirtualProbe {
            world: Arc::clone(&self.world),
            side,
        }))
    }

    fn lane_position(&mut self) -> Result<f32> {
        let world = self.world.lock();
        world.require(Location::Lane, "lane_position")?;
        Ok(world.lane.position().0)
    }

    fn read_bin_color(&mut self) -> Result<Hsv> {
        let mut world = self.world.lock();
        world.require(Location::Lane, "read_bin_color")?;
        if world.noise.bin_dropout() {
            return Ok(Hsv::new(100.0, 40.0, 220.0));
        }
        Ok(world.lane.bin_color())
    }

    fn deposit(&mut self, style: DepositStyle) -> Result<()> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Lane, "deposit")?;
        let Some(color) = world.carried.take() else {
            return Err(Error::InvalidParameter("nothing to deposit".to_string()));
        };
        let delivery = world.lane.deposit(color, style);
        if delivery.correct {
            log::info!("Virtual lane: {} block landed in slot {:?}", color, delivery.slot);
        } else {
            log::warn!("Virtual lane: {} block landed in slot {:?}", color, delivery.slot);
        }
        Ok(())
    }

    fn exit_to_arena(&mut self, _velocity: f32) -> Result<bool> {
        self.check_halted()?;
        let mut world = self.world.lock();
        world.require(Location::Lane, "exit_to_arena")?;
        let slot = world.lane.exit_slot()?;
        let row = world.row_of_slot(slot);
        world.arena.place_at_entrance(row);
        world.location = Location::Arena;
        Ok(true)
    }

    fn clock(&mut self) -> Result<Duration> {
        Ok(self.world.lock().clock)
    }
}
