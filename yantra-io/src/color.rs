//! Threshold color classifiers
//!
//! Three independent tables, one per use-site. Each table is checked in a
//! fixed order and the first matching entry wins. All bounds are inclusive.
//!
//! | Table | Hue scale | Order |
//! |-------|-----------|-------|
//! | line  | 0-127     | red, blue, yellow, green, black |
//! | bin   | 0-360     | blue, red, green, yellow, black |
//! | block | 0-360     | yellow, white, red, green, blue, black |

use crate::core::types::{Color, Hsv, Rgbc};

/// Inclusive band check on one channel
#[inline]
fn within(value: f32, lo: f32, hi: f32) -> bool {
    (lo..=hi).contains(&value)
}

/// Classify a line sensor reading (lane markers, staging floor)
pub fn classify_line(hsv: Hsv) -> Option<Color> {
    let Hsv { h, s, v } = hsv;

    if (within(h, 0.0, 10.0) || within(h, 110.0, 127.0))
        && within(s, 40.0, 90.0)
        && within(v, 55.0, 95.0)
    {
        return Some(Color::Red);
    }
    if within(h, 65.0, 90.0) && within(s, 30.0, 60.0) && within(v, 35.0, 55.0) {
        return Some(Color::Blue);
    }
    if within(h, 12.0, 25.0) && within(s, 45.0, 80.0) && within(v, 60.0, 127.0) {
        return Some(Color::Yellow);
    }
    if within(h, 35.0, 55.0) && within(s, 25.0, 60.0) && within(v, 30.0, 55.0) {
        return Some(Color::Green);
    }
    if v < 20.0 {
        return Some(Color::Black);
    }
    None
}

/// Classify a bin color sensor reading
pub fn classify_bin(hsv: Hsv) -> Option<Color> {
    let Hsv { h, s, v } = hsv;

    if within(h, 180.0, 255.0) && within(s, 155.0, 255.0) && within(v, 35.0, 160.0) {
        return Some(Color::Blue);
    }
    if (within(h, 0.0, 25.0) || within(h, 320.0, 360.0))
        && within(s, 140.0, 255.0)
        && within(v, 31.0, 255.0)
    {
        return Some(Color::Red);
    }
    if within(h, 80.0, 170.0) && within(s, 130.0, 255.0) && within(v, 5.0, 70.0) {
        return Some(Color::Green);
    }
    if within(h, 30.0, 75.0) && within(s, 90.0, 255.0) && within(v, 100.0, 255.0) {
        return Some(Color::Yellow);
    }
    if ((h <= 30.0 || h >= 190.0) && v <= 30.0) || v <= 15.0 {
        return Some(Color::Black);
    }
    None
}

/// Classify a claw sensor reading of a grabbed block
///
/// White is decided on the clear channel alone, black on a narrow clear band.
pub fn classify_block(hsv: Hsv, rgbc: Rgbc) -> Option<Color> {
    let Hsv { h, s, v } = hsv;

    if within(h, 20.0, 60.0) && within(s, 120.0, 200.0) && within(v, 120.0, 255.0) {
        return Some(Color::Yellow);
    }
    if rgbc.c > 20_000 {
        return Some(Color::White);
    }
    if (within(h, 0.0, 10.0) || within(h, 300.0, 360.0))
        && within(s, 130.0, 255.0)
        && within(v, 31.0, 255.0)
    {
        return Some(Color::Red);
    }
    if within(h, 90.0, 175.0) && s >= 65.0 && v > 5.0 {
        return Some(Color::Green);
    }
    if within(h, 135.0, 255.0) && within(s, 200.0, 255.0) && v >= 30.0 {
        return Some(Color::Blue);
    }
    if rgbc.c > 1400 && rgbc.c < 3500 {
        return Some(Color::Black);
    }
    None
}
