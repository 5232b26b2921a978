//! One-dimensional staging lane with a row of bins along its west wall
//!
//! Positions are millimeters from the forward-start end. Headings are compass
//! degrees: 0 runs forward along the lane, 180 runs back, 90 faces the arena
//! and 270 faces the bins.
//!
//! ```text
//!  x=0                                                   x=length
//!  [red] --slot0-----slot1-----slot2-----slot3-----slot4-- [red]
//!         row 4     row 3     row 2     row 1     row 0
//! ```

use super::config::LaneConfig;
use crate::core::types::{Color, DepositStyle, Hsv, Side};
use crate::error::{Error, Result};

/// Line sensor over a red end marker
const RED_MARKER: Hsv = Hsv::new(5.0, 60.0, 70.0);
/// Line sensor over the black lane line
const LANE_LINE: Hsv = Hsv::new(0.0, 0.0, 10.0);
/// Bin color sensor looking at the floor or at a wall
const FLOOR: Hsv = Hsv::new(100.0, 40.0, 220.0);

/// Tolerance when deciding the rover runs along or across the lane
const ALIGN_TOLERANCE_DEG: f32 = 20.0;

/// Bin color sensor reading for a bin of the given color
fn bin_reading(color: Color) -> Hsv {
    match color {
        Color::Red => Hsv::new(340.0, 200.0, 120.0),
        Color::Green => Hsv::new(120.0, 180.0, 50.0),
        Color::Blue => Hsv::new(210.0, 200.0, 100.0),
        Color::Yellow => Hsv::new(50.0, 150.0, 200.0),
        Color::Black => Hsv::new(0.0, 0.0, 10.0),
        Color::White | Color::Brown => Hsv::new(0.0, 0.0, 200.0),
    }
}

fn angle_between(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Block released in the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub color: Color,
    /// Slot the block landed in, `None` when it fell outside every slot
    pub slot: Option<usize>,
    /// Landed in a bin of its own color
    pub correct: bool,
}

pub struct Lane {
    config: LaneConfig,
    bins: Vec<Option<Color>>,
    x: f32,
    heading: f32,
    deliveries: Vec<Delivery>,
}

impl Lane {
    pub fn new(config: LaneConfig, bins: Vec<Option<Color>>) -> Result<Self> {
        if bins.is_empty() {
            return Err(Error::Config("staging lane has no slots".to_string()));
        }
        let last = config.first_slot_mm + config.slot_spacing_mm * (bins.len() - 1) as f32;
        if last + config.detect_half_width_mm >= config.length_mm {
            return Err(Error::Config(format!(
                "{} slots do not fit a {} mm lane",
                bins.len(),
                config.length_mm
            )));
        }
        Ok(Self {
            config,
            bins,
            x: 0.0,
            heading: 0.0,
            deliveries: Vec::new(),
        })
    }

    pub fn slot_count(&self) -> usize {
        self.bins.len()
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.heading)
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    fn slot_center(&self, slot: usize) -> f32 {
        self.config.first_slot_mm + self.config.slot_spacing_mm * slot as f32
    }

    fn nearest_slot(&self, x: f32) -> usize {
        let raw = ((x - self.config.first_slot_mm) / self.config.slot_spacing_mm).round();
        raw.clamp(0.0, (self.bins.len() - 1) as f32) as usize
    }

    /// +1 running forward, -1 running back, `None` across the lane
    fn travel_sign(&self) -> Option<f32> {
        if angle_between(self.heading, 0.0) <= ALIGN_TOLERANCE_DEG {
            Some(1.0)
        } else if angle_between(self.heading, 180.0) <= ALIGN_TOLERANCE_DEG {
            Some(-1.0)
        } else {
            None
        }
    }

    /// Place the rover beside the slot of `slot`, facing the bins
    pub fn enter_at(&mut self, slot: usize) {
        self.x = self.slot_center(slot.min(self.bins.len() - 1));
        self.heading = 270.0;
    }

    /// Place the rover at the forward-start end, facing along the lane
    pub fn start_at_end(&mut self) {
        self.x = 0.0;
        self.heading = 0.0;
    }

    pub fn turn(&mut self, degrees: f32) {
        self.heading = (self.heading + degrees).rem_euclid(360.0);
    }

    /// Move along the heading (negative reverses), clamped to the lane ends.
    /// Returns the distance covered.
    pub fn travel(&mut self, distance_mm: f32) -> Result<f32> {
        let sign = self
            .travel_sign()
            .ok_or_else(|| Error::NotAligned(format!("heading {:.0} crosses the lane", self.heading)))?;
        let before = self.x;
        self.x = (self.x + sign * distance_mm).clamp(0.0, self.config.length_mm);
        Ok((self.x - before).abs())
    }

    /// Move along the heading if aligned; straight moves across the lane do not change x
    pub fn nudge(&mut self, distance_mm: f32) {
        if let Some(sign) = self.travel_sign() {
            self.x = (self.x + sign * distance_mm).clamp(0.0, self.config.length_mm);
        }
    }

    /// Center line sensor: red when standing on the end marker ahead
    pub fn line_reading(&self) -> Hsv {
        match self.travel_sign() {
            Some(s) if s > 0.0 && self.x >= self.config.length_mm => RED_MARKER,
            Some(s) if s < 0.0 && self.x <= 0.0 => RED_MARKER,
            _ => LANE_LINE,
        }
    }

    /// Side distance sensor, before noise
    pub fn side_distance(&self, side: Side) -> u32 {
        let faces_bins = matches!(
            (self.travel_sign(), side),
            (Some(s), Side::Left) if s > 0.0
        ) || matches!(
            (self.travel_sign(), side),
            (Some(s), Side::Right) if s < 0.0
        );
        if !faces_bins {
            return self.config.open_reading_mm;
        }
        let half = self.config.detect_half_width_mm;
        let in_view = self
            .bins
            .iter()
            .enumerate()
            .any(|(i, bin)| bin.is_some() && (self.x - self.slot_center(i)).abs() <= half);
        if in_view {
            self.config.bin_reading_mm
        } else {
            self.config.open_reading_mm
        }
    }

    pub fn bin_reading_mm(&self) -> u32 {
        self.config.bin_reading_mm
    }

    /// Bin color sensor, before noise
    pub fn bin_color(&self) -> Hsv {
        let Some(sign) = self.travel_sign() else {
            return FLOOR;
        };
        if sign < 0.0 {
            return FLOOR;
        }
        let sensor_x = self.x - self.config.color_sensor_offset_mm;
        self.bins
            .iter()
            .enumerate()
            .find(|(i, _)| {
                (sensor_x - self.slot_center(*i)).abs() <= self.config.color_half_width_mm
            })
            .and_then(|(_, bin)| *bin)
            .map(bin_reading)
            .unwrap_or(FLOOR)
    }

    /// Drop `color` into whichever bin the rover is beside
    pub fn deposit(&mut self, color: Color, style: DepositStyle) -> Delivery {
        let slot = self.nearest_slot(self.x);
        let offset = (self.x - self.slot_center(slot)).abs();
        let facing_bins = angle_between(self.heading, 270.0) <= ALIGN_TOLERANCE_DEG;
        let positioned = match style {
            DepositStyle::HeadOn => facing_bins,
            DepositStyle::Side => self.travel_sign().is_some(),
        };
        let landed = (positioned && offset <= self.config.deposit_tolerance_mm).then_some(slot);
        let delivery = Delivery {
            color,
            slot: landed,
            correct: landed.and_then(|s| self.bins[s]) == Some(color),
        };
        self.deliveries.push(delivery);
        delivery
    }

    /// Slot the rover leaves the lane from, requires facing the arena
    pub fn exit_slot(&self) -> Result<usize> {
        if angle_between(self.heading, 90.0) > ALIGN_TOLERANCE_DEG {
            return Err(Error::NotAligned(format!(
                "heading {:.0} does not face the arena",
                self.heading
            )));
        }
        Ok(self.nearest_slot(self.x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{classify_bin, classify_line};

    fn lane() -> Lane {
        Lane::new(
            LaneConfig::default(),
            vec![
                Some(Color::Red),
                Some(Color::Green),
                None,
                Some(Color::Blue),
                Some(Color::Black),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bin_readings_classify() {
        for color in [Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Black] {
            assert_eq!(classify_bin(bin_reading(color)), Some(color));
        }
        assert_eq!(classify_bin(FLOOR), None);
        assert_eq!(classify_line(RED_MARKER), Some(Color::Red));
        assert_eq!(classify_line(LANE_LINE), Some(Color::Black));
    }

    #[test]
    fn test_distance_sees_only_occupied_slots() {
        let mut lane = lane();
        lane.start_at_end();
        lane.travel(150.0).unwrap();
        assert_eq!(lane.side_distance(Side::Left), 60);
        assert_eq!(lane.side_distance(Side::Right), 400);
        // Slot 2 is vacant
        lane.travel(560.0).unwrap();
        assert_eq!(lane.side_distance(Side::Left), 400);
    }

    #[test]
    fn test_reverse_uses_right_sensor() {
        let mut lane = lane();
        lane.start_at_end();
        lane.travel(990.0).unwrap();
        lane.turn(180.0);
        assert_eq!(lane.side_distance(Side::Right), 60);
        assert_eq!(lane.side_distance(Side::Left), 400);
    }

    #[test]
    fn test_color_sensor_trails_distance_sensor() {
        let mut lane = lane();
        lane.start_at_end();
        // Detection edge of slot 0, then the discovery creep
        lane.travel(120.0 + 70.0).unwrap();
        assert_eq!(classify_bin(lane.bin_color()), Some(Color::Red));
    }

    #[test]
    fn test_end_marker_only_ahead() {
        let mut lane = lane();
        lane.start_at_end();
        assert_eq!(classify_line(lane.line_reading()), Some(Color::Black));
        lane.travel(5000.0).unwrap();
        assert_eq!(classify_line(lane.line_reading()), Some(Color::Red));
        lane.turn(180.0);
        assert_eq!(classify_line(lane.line_reading()), Some(Color::Black));
    }

    #[test]
    fn test_deposit_tolerance() {
        let mut lane = lane();
        lane.start_at_end();
        lane.travel(990.0 - 100.0).unwrap();
        let d = lane.deposit(Color::Blue, DepositStyle::Side);
        assert_eq!(d.slot, Some(3));
        assert!(d.correct);

        lane.enter_at(1);
        let d = lane.deposit(Color::Blue, DepositStyle::HeadOn);
        assert_eq!(d.slot, Some(1));
        assert!(!d.correct);
        assert_eq!(lane.deliveries().len(), 2);
    }

    #[test]
    fn test_exit_requires_arena_heading() {
        let mut lane = lane();
        lane.enter_at(3);
        assert!(lane.exit_slot().is_err());
        lane.turn(175.0);
        assert_eq!(lane.exit_slot().unwrap(), 3);
    }

    #[test]
    fn test_travel_across_lane_fails() {
        let mut lane = lane();
        lane.enter_at(0);
        assert!(lane.travel(10.0).is_err());
    }
}
