//! Debounced bin counting along the staging lane
//!
//! The rover line-follows one tick at a time while a side distance sensor
//! watches the bins. A bin counts when the reading crosses the threshold, at
//! least the debounce interval has passed since the previous counted bin was
//! last in view, and a burst of direct re-reads confirms it. A reading that
//! fails confirmation leaves the debounce and the travel window untouched. A
//! search ends when the requested count is reached, when the travel window runs
//! out, or when the red lane-end marker shows up under the line sensor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use yantra_io::color::classify_line;
use yantra_io::{Color, DistanceProbe, Rover, Side};

use crate::config::StagingConfig;
use crate::error::{NavError, Result};

/// Ticks in a row without progress before the lane counts as blocked
const MAX_STALLED_TICKS: usize = 50;

/// What counts as a detection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// A bin comes into view
    UntilNear,
    /// The bin alongside drops out of view
    UntilClear,
}

impl SearchMode {
    fn matches(self, reading_mm: u32, threshold_mm: u32) -> bool {
        match self {
            SearchMode::UntilNear => reading_mm < threshold_mm,
            SearchMode::UntilClear => reading_mm > threshold_mm,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Found,
    WindowExceeded,
    LaneEnd,
}

/// One search run
#[derive(Clone, Copy, Debug)]
pub struct SlotSearch {
    /// Detections to count before stopping
    pub count: usize,
    pub side: Side,
    pub mode: SearchMode,
    /// Travel allowed without a detection (mm); `None` uses the configured maximum
    pub window_mm: Option<f32>,
    /// Stop on the lane-end marker; otherwise it only ends a stalled run
    pub stop_at_lane_end: bool,
    pub velocity: f32,
    /// Mission clock when the previous bin was passed, carries the debounce over
    pub last_bin_at: Option<Duration>,
}

impl SlotSearch {
    pub fn new(count: usize, side: Side, velocity: f32) -> Self {
        Self {
            count,
            side,
            mode: SearchMode::UntilNear,
            window_mm: None,
            stop_at_lane_end: true,
            velocity,
            last_bin_at: None,
        }
    }

    pub fn until_clear(mut self) -> Self {
        self.mode = SearchMode::UntilClear;
        self
    }

    pub fn within(mut self, window_mm: f32) -> Self {
        self.window_mm = Some(window_mm);
        self
    }

    pub fn through_lane_end(mut self) -> Self {
        self.stop_at_lane_end = false;
        self
    }

    pub fn after_bin(mut self, at: Option<Duration>) -> Self {
        self.last_bin_at = at;
        self
    }
}

/// Side distance sensor read on a dedicated thread
///
/// The thread is the only writer of `latest`; the control loop only reads it.
pub struct BackgroundPoller {
    latest: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundPoller {
    pub fn start(mut probe: Box<dyn DistanceProbe>, interval: Duration) -> Result<Self> {
        let latest = Arc::new(AtomicU32::new(probe.read_mm()?));
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let latest = Arc::clone(&latest);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("slot-poller".into())
                .spawn(move || {
                    while running.load(Ordering::Relaxed) {
                        match probe.read_mm() {
                            Ok(mm) => latest.store(mm, Ordering::Relaxed),
                            Err(e) => {
                                tracing::warn!("Slot poller stopped: {}", e);
                                break;
                            }
                        }
                        thread::sleep(interval);
                    }
                })?
        };

        Ok(Self {
            latest,
            running,
            handle: Some(handle),
        })
    }

    /// Last value written by the poller thread
    pub fn latest(&self) -> u32 {
        self.latest.load(Ordering::Relaxed)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("Slot poller thread panicked");
        }
    }
}

impl Drop for BackgroundPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Where search readings come from
enum SlotSensor {
    Direct(Side),
    Polled {
        side: Side,
        interval: Duration,
        poller: Option<BackgroundPoller>,
    },
}

impl SlotSensor {
    fn open(rover: &mut dyn Rover, side: Side, poll: Option<Duration>) -> Result<Self> {
        match poll {
            None => Ok(SlotSensor::Direct(side)),
            Some(interval) => {
                let poller = BackgroundPoller::start(rover.distance_probe(side)?, interval)?;
                Ok(SlotSensor::Polled {
                    side,
                    interval,
                    poller: Some(poller),
                })
            }
        }
    }

    fn read(&mut self, rover: &mut dyn Rover) -> Result<u32> {
        match self {
            SlotSensor::Direct(side) => Ok(rover.lane_distance(*side)?),
            SlotSensor::Polled {
                poller: Some(poller),
                ..
            } => Ok(poller.latest()),
            SlotSensor::Polled { side, .. } => Ok(rover.lane_distance(*side)?),
        }
    }

    /// Hand the sensor to the control loop for confirmation reads
    fn pause(&mut self) {
        if let SlotSensor::Polled { poller, .. } = self
            && let Some(mut p) = poller.take()
        {
            p.stop();
        }
    }

    fn resume(&mut self, rover: &mut dyn Rover) -> Result<()> {
        if let SlotSensor::Polled {
            side,
            interval,
            poller,
        } = self
            && poller.is_none()
        {
            *poller = Some(BackgroundPoller::start(rover.distance_probe(*side)?, *interval)?);
        }
        Ok(())
    }
}

/// Bin counter over the side distance sensors
#[derive(Clone, Debug)]
pub struct SlotCounter {
    threshold_mm: u32,
    debounce: Duration,
    confirm_reads: usize,
    max_search_mm: f32,
    poll: Option<Duration>,
}

impl SlotCounter {
    pub fn from_config(config: &StagingConfig) -> Self {
        Self {
            threshold_mm: config.slot_threshold_mm,
            debounce: Duration::from_secs_f32(config.debounce_secs.max(0.0)),
            confirm_reads: config.confirm_reads,
            max_search_mm: config.max_search_mm,
            poll: config
                .background_polling
                .then(|| Duration::from_millis(config.poll_interval_ms)),
        }
    }

    /// Drive along the lane counting bins
    pub fn search(&self, rover: &mut dyn Rover, search: &SlotSearch) -> Result<SearchOutcome> {
        let mut sensor = SlotSensor::open(rover, search.side, self.poll)?;
        let outcome = self.run(rover, &mut sensor, search);
        sensor.pause();
        outcome
    }

    fn run(
        &self,
        rover: &mut dyn Rover,
        sensor: &mut SlotSensor,
        search: &SlotSearch,
    ) -> Result<SearchOutcome> {
        let window = search.window_mm.unwrap_or(self.max_search_mm);
        // Last time a counted (or carried-over) bin was in view
        let mut last_seen = search.last_bin_at;
        let mut count = 0;
        let mut travelled = 0.0f32;
        let mut stalled = 0;

        loop {
            if count >= search.count {
                return Ok(SearchOutcome::Found);
            }
            if travelled > window {
                return Ok(SearchOutcome::WindowExceeded);
            }

            let reading = sensor.read(rover)?;
            if search.mode.matches(reading, self.threshold_mm) {
                let now = rover.clock()?;
                let same_bin = last_seen.is_some_and(|seen| now.saturating_sub(seen) <= self.debounce);
                if same_bin {
                    last_seen = Some(now);
                } else {
                    sensor.pause();
                    let confirmed = self.confirm(rover, search.side, search.mode)?;
                    sensor.resume(rover)?;
                    if confirmed {
                        count += 1;
                        last_seen = Some(rover.clock()?);
                        tracing::debug!("Bin {} of {} confirmed", count, search.count);
                    } else {
                        tracing::debug!("Unconfirmed bin reading {} mm", reading);
                    }
                }
                if count >= search.count {
                    return Ok(SearchOutcome::Found);
                }
            }

            let tick = rover.lane_tick(search.velocity)?;
            travelled += tick.travelled_mm;
            if classify_line(tick.line) == Some(Color::Red)
                && (search.stop_at_lane_end || tick.travelled_mm <= 0.0)
            {
                return Ok(SearchOutcome::LaneEnd);
            }
            if tick.travelled_mm <= 0.0 {
                stalled += 1;
                if stalled >= MAX_STALLED_TICKS {
                    return Err(NavError::LaneEndMissing(travelled));
                }
            } else {
                stalled = 0;
            }
        }
    }

    fn confirm(&self, rover: &mut dyn Rover, side: Side, mode: SearchMode) -> Result<bool> {
        for _ in 0..self.confirm_reads {
            if !mode.matches(rover.lane_distance(side)?, self.threshold_mm) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
