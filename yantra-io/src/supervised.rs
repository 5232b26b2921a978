//! Bounded-wait rover wrapper
//!
//! The wrapped rover runs on a dedicated worker thread. Every primitive is
//! shipped to it as a job over a crossbeam channel and the caller waits at
//! most `call_timeout` for the reply.
//!
//! ```text
//! control loop ──job──▶ rover-worker ──▶ Rover
//!      ▲                     │
//!      └──── reply (bounded wait) ◀──┘
//! ```
//!
//! A call that exceeds the window returns [`Error::Timeout`] and poisons the
//! wrapper: the stalled primitive may still be running, so every later call
//! fails fast with [`Error::Disconnected`] instead of queueing behind it.

use crate::core::actuator::{Actuator, DistanceProbe, Rover, StagingLane};
use crate::core::types::{
    Color, DepositStyle, FollowParams, Hsv, LaneTick, LateralDistances, Side, TurnMode,
};
use crate::error::{Error, Result};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

type Job = Box<dyn FnOnce(&mut dyn Rover) + Send>;

pub struct SupervisedRover {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    call_timeout: Duration,
    poisoned: bool,
}

impl SupervisedRover {
    /// Move `rover` onto a worker thread
    pub fn spawn(rover: Box<dyn Rover>, call_timeout: Duration) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let worker = thread::Builder::new()
            .name("rover-worker".into())
            .spawn(move || {
                let mut rover = rover;
                while let Ok(job) = rx.recv() {
                    job(rover.as_mut());
                }
                log::debug!("Rover worker exiting");
            })?;

        Ok(Self {
            jobs: Some(tx),
            worker: Some(worker),
            call_timeout,
            poisoned: false,
        })
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn call<T, F>(&mut self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Rover) -> Result<T> + Send + 'static,
    {
        if self.poisoned {
            return Err(Error::Disconnected);
        }
        let jobs = self.jobs.as_ref().ok_or(Error::Disconnected)?;

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let job: Job = Box::new(move |rover| {
            // Receiver may have given up already
            let _ = reply_tx.send(f(rover));
        });
        if jobs.send(job).is_err() {
            self.poisoned = true;
            return Err(Error::Disconnected);
        }

        match reply_rx.recv_timeout(self.call_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::error!(
                    "Rover call '{}' exceeded {:?}, refusing further calls",
                    op,
                    self.call_timeout
                );
                self.poisoned = true;
                Err(Error::Timeout { op })
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("Rover worker died during '{}'", op);
                self.poisoned = true;
                Err(Error::Disconnected)
            }
        }
    }
}

impl Drop for SupervisedRover {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            // A stalled worker would block shutdown; leave it detached.
            if !self.poisoned && worker.join().is_err() {
                log::error!("Rover worker panicked");
            }
        }
    }
}

impl Actuator for SupervisedRover {
    fn advance(&mut self, distance_mm: f32, velocity: f32) -> Result<()> {
        self.call("advance", move |r| r.advance(distance_mm, velocity))
    }

    fn turn(&mut self, degrees: f32, velocity: f32, mode: TurnMode) -> Result<()> {
        self.call("turn", move |r| r.turn(degrees, velocity, mode))
    }

    fn follow_to_intersection(&mut self, params: FollowParams) -> Result<bool> {
        self.call("follow_to_intersection", move |r| {
            r.follow_to_intersection(params)
        })
    }

    fn back_to_intersection(&mut self, velocity: f32) -> Result<()> {
        self.call("back_to_intersection", move |r| {
            r.back_to_intersection(velocity)
        })
    }

    fn lateral_distances(&mut self) -> Result<LateralDistances> {
        self.call("lateral_distances", |r| r.lateral_distances())
    }

    fn pick_up(&mut self, distance_mm: f32, accepted: &[Color]) -> Result<Option<Color>> {
        let accepted = accepted.to_vec();
        self.call("pick_up", move |r| r.pick_up(distance_mm, &accepted))
    }

    fn stop(&mut self) -> Result<()> {
        self.call("stop", |r| r.stop())
    }
}

impl StagingLane for SupervisedRover {
    fn enter_staging(&mut self, velocity: f32) -> Result<()> {
        self.call("enter_staging", move |r| r.enter_staging(velocity))
    }

    fn lane_tick(&mut self, velocity: f32) -> Result<LaneTick> {
        self.call("lane_tick", move |r| r.lane_tick(velocity))
    }

    fn lane_creep(&mut self, distance_mm: f32, velocity: f32) -> Result<()> {
        self.call("lane_creep", move |r| r.lane_creep(distance_mm, velocity))
    }

    fn lane_distance(&mut self, side: Side) -> Result<u32> {
        self.call("lane_distance", move |r| r.lane_distance(side))
    }

    fn distance_probe(&mut self, side: Side) -> Result<Box<dyn DistanceProbe>> {
        self.call("distance_probe", move |r| r.distance_probe(side))
    }

    fn lane_position(&mut self) -> Result<f32> {
        self.call("lane_position", |r| r.lane_position())
    }

    fn read_bin_color(&mut self) -> Result<Hsv> {
        self.call("read_bin_color", |r| r.read_bin_color())
    }

    fn deposit(&mut self, style: DepositStyle) -> Result<()> {
        self.call("deposit", move |r| r.deposit(style))
    }

    fn exit_to_arena(&mut self, velocity: f32) -> Result<bool> {
        self.call("exit_to_arena", move |r| r.exit_to_arena(velocity))
    }

    fn clock(&mut self) -> Result<Duration> {
        self.call("clock", |r| r.clock())
    }
}
