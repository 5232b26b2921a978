//! Mission loop: discover the lane, then explore and deliver until told to stop
//! or until the arena has nothing left to collect

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use yantra_io::{Rover, TurnMode};

use super::deposit::deposit_block;
use super::discovery::discover_bins;
use super::lane::{exit_lane, run_to_lane_end};
use super::registry::BinRegistry;
use crate::config::MargaConfig;
use crate::error::{NavError, Result};
use crate::exploration::Explorer;
use crate::map::{GridMap, MapSnapshot};
use crate::position::Pose;
use crate::status::{StatusEvent, StatusSender};

/// Summary of a finished mission
#[derive(Clone, Debug, PartialEq)]
pub struct MissionReport {
    pub deliveries: usize,
    pub registry: BinRegistry,
}

/// Owns the mission state between exploration cycles
pub struct Mission<'a> {
    rover: &'a mut dyn Rover,
    config: &'a MargaConfig,
    map: GridMap,
    pose: Pose,
    registry: Option<BinRegistry>,
    deliveries: usize,
    shutdown: Arc<AtomicBool>,
    status: StatusSender,
}

impl<'a> Mission<'a> {
    /// The rover is expected at the forward-start end of the lane
    pub fn new(rover: &'a mut dyn Rover, config: &'a MargaConfig, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            rover,
            config,
            map: GridMap::new(config.arena.rows, config.arena.cols),
            pose: Pose::default(),
            registry: None,
            deliveries: 0,
            shutdown,
            status: StatusSender::disabled(),
        }
    }

    pub fn with_status(mut self, status: StatusSender) -> Self {
        self.status = status;
        self
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn registry(&self) -> Option<&BinRegistry> {
        self.registry.as_ref()
    }

    pub fn deliveries(&self) -> usize {
        self.deliveries
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.map.snapshot(&self.pose)
    }

    fn interrupted(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Learn the bin layout and leave the lane beside the last slot
    pub fn prepare(&mut self) -> Result<()> {
        let rows = self.config.arena.rows;
        let registry = match &self.config.staging.preset_bins {
            Some(names) => {
                let registry = BinRegistry::parse(names)?;
                registry.validate_for_rows(rows)?;
                tracing::info!("Using preset bin layout {}", registry);
                run_to_lane_end(self.rover, self.config)?;
                registry
            }
            None => discover_bins(self.rover, self.config)?,
        };
        self.status.publish(StatusEvent::Registry(registry.to_string()));

        // Standing on the far marker: the last slot sits beside row 0
        self.rover
            .turn(90.0, self.config.motion.slow, TurnMode::Gyro)?;
        let row = exit_lane(self.rover, self.config)?;
        self.pose = Pose::at_entrance(row);
        self.registry = Some(registry);
        Ok(())
    }

    /// Run until `max_deliveries` is reached, the arena runs out of blocks or
    /// the shutdown flag is raised
    pub fn run(&mut self) -> Result<MissionReport> {
        if self.registry.is_none() {
            self.prepare()?;
        }
        let max = self.config.mission.max_deliveries;

        loop {
            if self.interrupted() {
                return Err(NavError::Interrupted);
            }
            if max > 0 && self.deliveries >= max {
                break;
            }
            match self.deliver_one() {
                Ok(()) => {}
                Err(NavError::ArenaExhausted { resets }) => {
                    tracing::info!("Arena cleared ({} resets without a block)", resets);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let registry = self.registry.clone().unwrap_or_default();
        tracing::info!("Mission complete: {} deliveries into {}", self.deliveries, registry);
        Ok(MissionReport {
            deliveries: self.deliveries,
            registry,
        })
    }

    /// One exploration cycle followed by one deposit
    pub fn deliver_one(&mut self) -> Result<()> {
        if self.interrupted() {
            return Err(NavError::Interrupted);
        }
        let accepted = match &self.registry {
            Some(registry) => registry.colors(),
            None => return Err(Self::undiscovered()),
        };

        let mut explorer = Explorer::new(
            &mut *self.rover,
            &mut self.map,
            self.config,
            self.pose,
            accepted,
        )
        .with_shutdown(&self.shutdown)
        .with_status(self.status.clone());
        let grabbed = explorer.run_cycle();
        self.pose = explorer.pose();
        drop(explorer);
        let (color, row) = grabbed?;

        if self.interrupted() {
            return Err(NavError::Interrupted);
        }
        let registry = self.registry.as_mut().ok_or_else(Self::undiscovered)?;
        let exit_row = deposit_block(&mut *self.rover, registry, self.config, color, row)?;
        self.pose = Pose::at_entrance(exit_row);
        self.deliveries += 1;
        self.status.publish(StatusEvent::Delivered {
            color,
            total: self.deliveries,
        });
        Ok(())
    }

    fn undiscovered() -> NavError {
        NavError::InvalidRegistry("bins not discovered yet".to_string())
    }
}
