//! Seeded random-walk generator standing in for a Sense HAT.

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{EnvironmentalSample, Orientation, Vector3};
use crate::source::round_to;

const BASE_TEMPERATURE: f64 = 20.0;
const BASE_HUMIDITY: f64 = 50.0;
const BASE_PRESSURE: f64 = 1013.25;

/// Synthetic environmental readings.
///
/// - temperature: 20 °C ± 5 °C on an hour-scale sine, plus ±1 °C noise
/// - humidity: tracks temperature inversely, clamped to [20, 80] %
/// - pitch/roll/yaw: unbounded random walk plus ±2° read noise
/// - acceleration: at rest, z ≈ 1 g ± 0.05, x/y ≈ 0 ± 0.1 g
/// - gyroscope ±5 deg/s, compass ±50 µT uniform noise
///
/// Time is virtual (`reads * step`), so output depends only on the seed.
pub struct SyntheticEnvironment {
    rng: StdRng,
    step: Duration,
    reads: u64,
    walk: Orientation,
}

impl SyntheticEnvironment {
    pub fn new(seed: u64, step: Duration) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            step,
            reads: 0,
            walk: Orientation::default(),
        }
    }

    pub fn read(&mut self) -> EnvironmentalSample {
        let t = self.step.as_secs_f64() * self.reads as f64;
        self.reads += 1;
        let rng = &mut self.rng;

        let temperature =
            BASE_TEMPERATURE + 5.0 * (t / 3600.0).sin() + rng.random_range(-1.0..=1.0);

        let humidity = (BASE_HUMIDITY - (temperature - BASE_TEMPERATURE) * 2.0
            + rng.random_range(-3.0..=3.0))
        .clamp(20.0, 80.0);

        let pressure = BASE_PRESSURE + rng.random_range(-5.0..=5.0);

        self.walk.pitch += rng.random_range(-0.5..=0.5);
        self.walk.roll += rng.random_range(-0.5..=0.5);
        self.walk.yaw += rng.random_range(-0.5..=0.5);
        let orientation = Orientation {
            pitch: round_to(self.walk.pitch + rng.random_range(-2.0..=2.0), 2),
            roll: round_to(self.walk.roll + rng.random_range(-2.0..=2.0), 2),
            yaw: round_to(self.walk.yaw + rng.random_range(-2.0..=2.0), 2),
        };

        let accel = Vector3::new(
            round_to(rng.random_range(-0.1..=0.1), 4),
            round_to(rng.random_range(-0.1..=0.1), 4),
            round_to(1.0 + rng.random_range(-0.05..=0.05), 4),
        );
        let gyro = Vector3::new(
            round_to(rng.random_range(-5.0..=5.0), 2),
            round_to(rng.random_range(-5.0..=5.0), 2),
            round_to(rng.random_range(-5.0..=5.0), 2),
        );
        let compass = Vector3::new(
            round_to(rng.random_range(-50.0..=50.0), 2),
            round_to(rng.random_range(-50.0..=50.0), 2),
            round_to(rng.random_range(-50.0..=50.0), 2),
        );

        EnvironmentalSample {
            sampled_at: Utc::now(),
            temperature: round_to(temperature, 2),
            humidity: round_to(humidity, 2),
            pressure: round_to(pressure, 2),
            orientation,
            accel,
            gyro,
            compass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humidity_and_gravity_bounds() {
        let mut generator = SyntheticEnvironment::new(42, Duration::from_secs(5));

        for _ in 0..10_000 {
            let sample = generator.read();
            assert!(
                (20.0..=80.0).contains(&sample.humidity),
                "humidity {} out of range",
                sample.humidity
            );
            assert!(
                (0.90..=1.10).contains(&sample.accel.z),
                "accel z {} out of range",
                sample.accel.z
            );
            assert!(sample.accel.x.abs() <= 0.1);
            assert!(sample.accel.y.abs() <= 0.1);
            assert!(sample.gyro.x.abs() <= 5.0);
            assert!(sample.compass.z.abs() <= 50.0);
        }
    }

    #[test]
    fn test_temperature_follows_hourly_sine() {
        let mut generator = SyntheticEnvironment::new(3, Duration::from_secs(60));

        for _ in 0..2_000 {
            let sample = generator.read();
            assert!((14.0..=26.0).contains(&sample.temperature));
            assert!((1008.25..=1018.25).contains(&sample.pressure));
        }
    }

    #[test]
    fn test_reproducible_with_seed() {
        let mut a = SyntheticEnvironment::new(1234, Duration::from_secs(5));
        let mut b = SyntheticEnvironment::new(1234, Duration::from_secs(5));
        let mut c = SyntheticEnvironment::new(4321, Duration::from_secs(5));

        let xs: Vec<_> = (0..50).map(|_| a.read().columns()).collect();
        let ys: Vec<_> = (0..50).map(|_| b.read().columns()).collect();
        let zs: Vec<_> = (0..50).map(|_| c.read().columns()).collect();

        assert_eq!(xs, ys);
        assert_ne!(xs, zs);
    }

    #[test]
    fn test_orientation_walk_steps_are_small() {
        let mut generator = SyntheticEnvironment::new(9, Duration::from_secs(5));
        let mut previous = generator.walk;

        for _ in 0..1_000 {
            generator.read();
            assert!((generator.walk.pitch - previous.pitch).abs() <= 0.5 + 1e-9);
            assert!((generator.walk.roll - previous.roll).abs() <= 0.5 + 1e-9);
            assert!((generator.walk.yaw - previous.yaw).abs() <= 0.5 + 1e-9);
            previous = generator.walk;
        }
    }
}
