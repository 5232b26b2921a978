//! Bin discovery run along the staging lane
//!
//! The rover starts at the forward-start end facing along the lane and visits
//! every slot once. Each bin is read by the color sensor after a short creep;
//! a slot with no bin is recognised by the search window running out. The run
//! ends at the lane-end marker, where the registry is validated against the
//! arena rows. An invalid registry, or a bin the color sensor could not read,
//! sends the rover back to the start for another full scan. Only the last scan
//! records an unreadable bin as an empty slot.

use std::time::Duration;

use yantra_io::color::classify_bin;
use yantra_io::{Color, Rover, Side};

use super::lane::return_to_start;
use super::registry::{BinRegistry, BinSlot, MAX_SLOTS};
use super::slot_counter::{SearchOutcome, SlotCounter, SlotSearch};
use crate::config::MargaConfig;
use crate::error::{NavError, Result};

/// Scan the lane from its forward-start end and build the bin registry
pub fn discover_bins(rover: &mut dyn Rover, config: &MargaConfig) -> Result<BinRegistry> {
    let staging = &config.staging;
    let counter = SlotCounter::from_config(staging);
    let attempts = staging.max_scan_attempts.max(1);

    for attempt in 1..=attempts {
        let registry = scan_once(rover, config, &counter, attempt == attempts)?;
        match registry.validate_for_rows(config.arena.rows) {
            Ok(()) => {
                tracing::info!("Bin registry after scan {}: {}", attempt, registry);
                return Ok(registry);
            }
            Err(e) => {
                tracing::warn!("Scan {} of {} rejected: {} ({})", attempt, attempts, e, registry);
                if attempt < attempts {
                    return_to_start(rover, config)?;
                }
            }
        }
    }
    Err(NavError::BinScanFailed { attempts })
}

fn scan_once(
    rover: &mut dyn Rover,
    config: &MargaConfig,
    counter: &SlotCounter,
    last_attempt: bool,
) -> Result<BinRegistry> {
    let staging = &config.staging;
    let mut slots: Vec<BinSlot> = Vec::new();
    let mut last_bin_at: Option<Duration> = None;

    loop {
        let search = SlotSearch::new(1, Side::Left, config.motion.normal)
            .within(staging.search_window_mm)
            .after_bin(last_bin_at);
        match counter.search(rover, &search)? {
            SearchOutcome::LaneEnd => break,
            SearchOutcome::WindowExceeded => {
                tracing::debug!("Slot {} empty", slots.len());
                slots.push(BinSlot::Empty);
            }
            SearchOutcome::Found => {
                let slot = match identify(rover, config, &slots)? {
                    Some(color) => BinSlot::Bin(color),
                    None if last_attempt => {
                        tracing::warn!("Bin {} unreadable, recording an empty slot", slots.len());
                        BinSlot::Empty
                    }
                    None => {
                        tracing::warn!("Bin {} unreadable", slots.len());
                        BinSlot::Unresolved
                    }
                };
                tracing::debug!("Slot {}: {}", slots.len(), slot);
                slots.push(slot);
                last_bin_at = Some(rover.clock()?);
            }
        }
        if slots.len() > MAX_SLOTS {
            tracing::warn!("More than {} slots seen, abandoning scan", MAX_SLOTS);
            break;
        }
    }
    Ok(BinRegistry::new(slots))
}

/// Read the bin beside the rover, once more from slightly further on when
/// the first read is unclassifiable or repeats a known color
fn identify(rover: &mut dyn Rover, config: &MargaConfig, seen: &[BinSlot]) -> Result<Option<Color>> {
    let staging = &config.staging;
    rover.lane_creep(staging.discovery_creep_mm, config.motion.normal)?;
    let first = classify_bin(rover.read_bin_color()?);
    let duplicate = first.is_some_and(|c| seen.contains(&BinSlot::Bin(c)));
    if first.is_some() && !duplicate {
        return Ok(first);
    }

    rover.lane_creep(staging.retry_creep_mm, config.motion.slow)?;
    Ok(classify_bin(rover.read_bin_color()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use yantra_io::devices::virtual_rover::VirtualRover;
    use yantra_io::devices::virtual_rover::config::{NoiseConfig, SimulationConfig};

    fn lane_rover(bins: Vec<Option<Color>>) -> VirtualRover {
        VirtualRover::new(SimulationConfig {
            bins,
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_discovers_full_lane() {
        let mut rover = lane_rover(SimulationConfig::default().bins);
        let observer = rover.observer();
        let registry = discover_bins(&mut rover, &MargaConfig::default()).unwrap();
        assert_eq!(
            registry.colors(),
            vec![Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Black]
        );
        // Ends on the far marker
        assert_eq!(observer.lane_pose(), (1420.0, 0.0));
    }

    #[test]
    fn test_vacant_slots_recorded_as_empty() {
        let mut rover = lane_rover(vec![
            Some(Color::Red),
            Some(Color::Green),
            None,
            Some(Color::Blue),
            None,
        ]);
        let registry = discover_bins(&mut rover, &MargaConfig::default()).unwrap();
        assert_eq!(
            registry.slots(),
            &[
                BinSlot::Bin(Color::Red),
                BinSlot::Bin(Color::Green),
                BinSlot::Empty,
                BinSlot::Bin(Color::Blue),
                BinSlot::Empty,
            ]
        );
    }

    #[test]
    fn test_duplicate_bins_fail_after_bounded_rescans() {
        let mut rover = lane_rover(vec![
            Some(Color::Red),
            Some(Color::Red),
            Some(Color::Blue),
            Some(Color::Yellow),
            Some(Color::Black),
        ]);
        let observer = rover.observer();
        let config = MargaConfig::default();
        let result = discover_bins(&mut rover, &config);
        assert!(matches!(result, Err(NavError::BinScanFailed { attempts: 5 })));
        // Last scan is not followed by a return trip
        assert_eq!(observer.lane_pose(), (1420.0, 0.0));
    }

    #[test]
    fn test_lane_shorter_than_arena_is_rejected() {
        // A three-slot lane against the default five-row arena
        let mut rover = VirtualRover::new(SimulationConfig {
            rows: 3,
            block_count: 0,
            bins: vec![Some(Color::Red), Some(Color::Green), Some(Color::Blue)],
            ..SimulationConfig::default()
        })
        .unwrap();
        let mut config = MargaConfig::default();
        config.staging.max_scan_attempts = 2;
        let result = discover_bins(&mut rover, &config);
        assert!(matches!(result, Err(NavError::BinScanFailed { attempts: 2 })));
    }

    #[test]
    fn test_unreadable_bins_force_a_rescan() {
        let mut rover = VirtualRover::new(SimulationConfig {
            random_seed: 11,
            noise: NoiseConfig {
                bin_dropout_rate: 0.5,
                ..NoiseConfig::default()
            },
            ..SimulationConfig::default()
        })
        .unwrap();
        let mut config = MargaConfig::default();
        config.staging.max_scan_attempts = 50;
        let registry = discover_bins(&mut rover, &config).unwrap();
        // Every accepted scan read all five bins
        assert_eq!(
            registry.colors(),
            vec![Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Black]
        );
    }
}
