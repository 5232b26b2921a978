//! Seeded fault injection for the virtual rover
//!
//! One RNG drives block placement and every injected fault, so a fixed
//! `random_seed` replays a whole mission exactly.

use super::config::NoiseConfig;
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

#[derive(Clone)]
pub struct WorldNoise {
    rng: SmallRng,
    config: NoiseConfig,
}

impl WorldNoise {
    /// Seed 0 draws from entropy; any other seed is reproducible.
    pub fn new(seed: u64, config: NoiseConfig) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng, config }
    }

    /// Random element of `items`, `None` when empty
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.rng).copied()
    }

    /// Side distance as the sensor reports it
    ///
    /// A phantom read reports `bin_mm` whatever is really there.
    pub fn side_reading(&mut self, clean_mm: u32, bin_mm: u32) -> u32 {
        if self.fires(self.config.phantom_rate) {
            return bin_mm;
        }
        let stddev = self.config.distance_stddev;
        if stddev <= 0.0 {
            return clean_mm;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        (clean_mm as f32 + n * stddev).max(0.0).round() as u32
    }

    pub fn pickup_missed(&mut self) -> bool {
        self.fires(self.config.pickup_miss_rate)
    }

    pub fn bin_dropout(&mut self) -> bool {
        self.fires(self.config.bin_dropout_rate)
    }

    fn fires(&mut self, probability: f32) -> bool {
        probability > 0.0 && self.rng.r#gen::<f32>() < probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy() -> NoiseConfig {
        NoiseConfig {
            phantom_rate: 0.3,
            distance_stddev: 2.0,
            ..NoiseConfig::default()
        }
    }

    #[test]
    fn test_same_seed_replays() {
        let mut a = WorldNoise::new(7, noisy());
        let mut b = WorldNoise::new(7, noisy());
        for _ in 0..50 {
            assert_eq!(a.pick(&[1, 2, 3, 4, 5]), b.pick(&[1, 2, 3, 4, 5]));
            assert_eq!(a.side_reading(400, 60), b.side_reading(400, 60));
        }
    }

    #[test]
    fn test_quiet_config_passes_readings_through() {
        let mut noise = WorldNoise::new(1, NoiseConfig::default());
        assert!((0..1000).all(|_| noise.side_reading(400, 60) == 400));
        assert!((0..1000).all(|_| !noise.pickup_missed() && !noise.bin_dropout()));
    }

    #[test]
    fn test_phantom_rate() {
        let mut noise = WorldNoise::new(
            42,
            NoiseConfig {
                phantom_rate: 0.3,
                ..NoiseConfig::default()
            },
        );
        let phantoms = (0..10_000).filter(|_| noise.side_reading(400, 60) == 60).count();
        let ratio = phantoms as f32 / 10_000.0;
        assert!((ratio - 0.3).abs() < 0.05);
    }

    #[test]
    fn test_pick_from_empty() {
        let mut noise = WorldNoise::new(3, NoiseConfig::default());
        assert_eq!(noise.pick::<u8>(&[]), None);
    }
}
