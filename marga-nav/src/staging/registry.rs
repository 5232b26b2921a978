//! Bin registry: the colour of every staging-lane slot
//!
//! Slots are stored in discovery order, starting at the forward-start end of
//! the lane. Slot `i` of an `n`-slot lane sits beside arena row `n - 1 - i`.

use crate::error::{NavError, Result};
use std::collections::BTreeMap;
use std::fmt;
use yantra_io::{Color, Side};

/// Most slots a staging lane holds
pub const MAX_SLOTS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinSlot {
    Bin(Color),
    /// Physical slot with no bin
    Empty,
    /// Not identified yet
    Unresolved,
}

impl BinSlot {
    pub fn color(self) -> Option<Color> {
        match self {
            BinSlot::Bin(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for BinSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinSlot::Bin(c) => write!(f, "{}", c),
            BinSlot::Empty => write!(f, "empty"),
            BinSlot::Unresolved => write!(f, "?"),
        }
    }
}

/// Direction of travel along the lane
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneHeading {
    /// Toward the higher slots (lower arena rows)
    Forward,
    Reverse,
}

impl LaneHeading {
    pub fn flip(self) -> Self {
        match self {
            LaneHeading::Forward => LaneHeading::Reverse,
            LaneHeading::Reverse => LaneHeading::Forward,
        }
    }

    /// +1 forward, -1 reverse
    pub fn sign(self) -> f32 {
        match self {
            LaneHeading::Forward => 1.0,
            LaneHeading::Reverse => -1.0,
        }
    }

    /// Distance sensor facing the bins while travelling this way
    pub fn sensor_side(self) -> Side {
        match self {
            LaneHeading::Forward => Side::Left,
            LaneHeading::Reverse => Side::Right,
        }
    }
}

/// Where to look for a bin from a given entrance row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositTarget {
    /// 1-based slot of the bin in discovery order
    pub slot_number: usize,
    /// Empty slots between the entrance and the bin
    pub skipped_empty: usize,
    /// Bins to count before stopping
    pub steps: usize,
    pub heading: LaneHeading,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinRegistry {
    slots: Vec<BinSlot>,
    deposits: BTreeMap<Color, usize>,
}

impl BinRegistry {
    pub fn new(slots: Vec<BinSlot>) -> Self {
        Self {
            slots,
            deposits: BTreeMap::new(),
        }
    }

    /// Build from color names; "empty" or "none" marks a vacant slot
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let slots = names
            .iter()
            .map(|name| match name.as_ref().to_ascii_lowercase().as_str() {
                "empty" | "none" => Ok(BinSlot::Empty),
                other => other
                    .parse::<Color>()
                    .map(BinSlot::Bin)
                    .map_err(NavError::InvalidRegistry),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(slots))
    }

    /// Reject unresolved slots, duplicate colors and bad lengths
    pub fn validate(&self) -> Result<()> {
        if self.slots.is_empty() || self.slots.len() > MAX_SLOTS {
            return Err(NavError::InvalidRegistry(format!(
                "{} slots, expected 1 to {}",
                self.slots.len(),
                MAX_SLOTS
            )));
        }
        if let Some(i) = self.slots.iter().position(|s| *s == BinSlot::Unresolved) {
            return Err(NavError::InvalidRegistry(format!("slot {} unresolved", i)));
        }
        let colors = self.colors();
        for (i, c) in colors.iter().enumerate() {
            if colors[..i].contains(c) {
                return Err(NavError::InvalidRegistry(format!("duplicate {} bin", c)));
            }
        }
        Ok(())
    }

    /// [`Self::validate`] plus one slot per arena row
    pub fn validate_for_rows(&self, rows: usize) -> Result<()> {
        self.validate()?;
        if self.slots.len() != rows {
            return Err(NavError::InvalidRegistry(format!(
                "{} slots beside a {}-row arena",
                self.slots.len(),
                rows
            )));
        }
        Ok(())
    }

    pub fn slots(&self) -> &[BinSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bin colors in slot order
    pub fn colors(&self) -> Vec<Color> {
        self.slots.iter().filter_map(|s| s.color()).collect()
    }

    pub fn contains(&self, color: Color) -> bool {
        self.index_of(color).is_some()
    }

    pub fn index_of(&self, color: Color) -> Option<usize> {
        self.slots.iter().position(|s| *s == BinSlot::Bin(color))
    }

    /// Arena row beside the bin of `color`
    pub fn row_of(&self, color: Color) -> Option<i32> {
        self.index_of(color)
            .map(|i| self.slots.len() as i32 - 1 - i as i32)
    }

    pub fn deposits(&self, color: Color) -> usize {
        self.deposits.get(&color).copied().unwrap_or(0)
    }

    pub fn record_deposit(&mut self, color: Color) {
        *self.deposits.entry(color).or_insert(0) += 1;
    }

    pub fn total_deposits(&self) -> usize {
        self.deposits.values().sum()
    }

    /// Slots to count and direction to take from the entrance at `exit_row`
    ///
    /// The row distance to the bin plus one gives the raw count, since the bin
    /// beside the entrance is counted as well. Empty slots between the entrance
    /// and the bin are never detected and are subtracted. A bin level with the
    /// entrance is searched forward only when head-on deposits are enabled.
    pub fn target_for(&self, color: Color, exit_row: i32, head_on: bool) -> Option<DepositTarget> {
        let index = self.index_of(color)?;
        let n = self.slots.len() as i32;
        if !(0..n).contains(&exit_row) {
            return None;
        }
        let bin_row = n - 1 - index as i32;
        let exit_slot = (n - 1 - exit_row) as usize;
        let raw = (bin_row - exit_row).unsigned_abs() as usize + 1;

        let forward = if head_on {
            bin_row <= exit_row
        } else {
            bin_row < exit_row
        };
        let between = if forward {
            &self.slots[exit_slot.min(index)..index]
        } else {
            &self.slots[(index + 1).min(exit_slot + 1)..=exit_slot]
        };
        let skipped_empty = between.iter().filter(|s| **s == BinSlot::Empty).count();

        Some(DepositTarget {
            slot_number: index + 1,
            skipped_empty,
            steps: raw - skipped_empty,
            heading: if forward {
                LaneHeading::Forward
            } else {
                LaneHeading::Reverse
            },
        })
    }

    /// Bins to count for `color` after turning around at a lane end
    pub fn reroute_steps(&self, color: Color, heading: LaneHeading) -> Option<usize> {
        let colors = self.colors();
        let position = match heading {
            LaneHeading::Forward => colors.iter().position(|c| *c == color),
            LaneHeading::Reverse => colors.iter().rev().position(|c| *c == color),
        };
        position.map(|p| p + 1)
    }
}

impl fmt::Display for BinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", slot)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BinRegistry {
        BinRegistry::parse(&["red", "green", "empty", "blue", "black"]).unwrap()
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());
        assert!(BinRegistry::new(vec![]).validate().is_err());
        assert!(BinRegistry::new(vec![BinSlot::Empty; 6]).validate().is_err());
        assert!(
            BinRegistry::new(vec![BinSlot::Bin(Color::Red), BinSlot::Unresolved])
                .validate()
                .is_err()
        );
        assert!(
            BinRegistry::new(vec![
                BinSlot::Bin(Color::Red),
                BinSlot::Empty,
                BinSlot::Bin(Color::Red)
            ])
            .validate()
            .is_err()
        );
        // Repeated empties are fine
        assert!(
            BinRegistry::new(vec![BinSlot::Empty, BinSlot::Empty, BinSlot::Bin(Color::Blue)])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_validate_for_rows() {
        assert!(sample().validate_for_rows(5).is_ok());
        let short = BinRegistry::parse(&["red", "green", "blue"]).unwrap();
        assert!(short.validate().is_ok());
        assert!(matches!(short.validate_for_rows(5), Err(NavError::InvalidRegistry(_))));
        assert!(short.validate_for_rows(3).is_ok());
        assert!(sample().validate_for_rows(4).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!(matches!(
            BinRegistry::parse(&["red", "mauve"]),
            Err(NavError::InvalidRegistry(_))
        ));
        let registry = BinRegistry::parse(&["None", "BLUE"]).unwrap();
        assert_eq!(registry.slots(), &[BinSlot::Empty, BinSlot::Bin(Color::Blue)]);
    }

    #[test]
    fn test_target_skips_empty_slot_forward() {
        let target = sample().target_for(Color::Blue, 3, true).unwrap();
        assert_eq!(
            target,
            DepositTarget {
                slot_number: 4,
                skipped_empty: 1,
                steps: 2,
                heading: LaneHeading::Forward,
            }
        );
    }

    #[test]
    fn test_target_reverse() {
        let registry = sample();
        // Red sits beside row 4, entering at row 1 means searching back
        let target = registry.target_for(Color::Red, 1, true).unwrap();
        assert_eq!(target.heading, LaneHeading::Reverse);
        // Slots 3, 2 (empty), 1, 0 -> three bins to count
        assert_eq!(target.skipped_empty, 1);
        assert_eq!(target.steps, 3);
    }

    #[test]
    fn test_level_bin_depends_on_head_on() {
        let registry = sample();
        let with = registry.target_for(Color::Green, 3, true).unwrap();
        assert_eq!(with.heading, LaneHeading::Forward);
        assert_eq!(with.steps, 1);
        let without = registry.target_for(Color::Green, 3, false).unwrap();
        assert_eq!(without.heading, LaneHeading::Reverse);
        assert_eq!(without.steps, 1);
        assert_eq!(without.skipped_empty, 0);
    }

    #[test]
    fn test_target_unknown_color_or_row() {
        assert!(sample().target_for(Color::Yellow, 2, true).is_none());
        assert!(sample().target_for(Color::Red, 5, true).is_none());
    }

    #[test]
    fn test_rows_and_reroute() {
        let registry = sample();
        assert_eq!(registry.row_of(Color::Red), Some(4));
        assert_eq!(registry.row_of(Color::Black), Some(0));
        assert_eq!(
            registry.reroute_steps(Color::Blue, LaneHeading::Forward),
            Some(3)
        );
        assert_eq!(
            registry.reroute_steps(Color::Blue, LaneHeading::Reverse),
            Some(2)
        );
        assert_eq!(registry.reroute_steps(Color::White, LaneHeading::Forward), None);
    }

    #[test]
    fn test_deposit_counters() {
        let mut registry = sample();
        assert_eq!(registry.deposits(Color::Green), 0);
        registry.record_deposit(Color::Green);
        registry.record_deposit(Color::Green);
        assert_eq!(registry.deposits(Color::Green), 2);
        assert_eq!(registry.total_deposits(), 2);
        assert_eq!(registry.to_string(), "[red, green, empty, blue, black]");
    }
}
