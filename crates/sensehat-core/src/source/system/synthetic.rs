//! Seeded generator of plausible Raspberry Pi host metrics.

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{DiskUsage, LoadAverage, MemoryUsage, SystemSample};
use crate::source::round_to;

const BASE_CPU_TEMP: f64 = 45.0;
const BASE_CPU_PERCENT: f64 = 20.0;
const BASE_MEM_PERCENT: f64 = 50.0;
const BASE_DISK_PERCENT: f64 = 40.0;
const MEM_TOTAL_GB: f64 = 4.0;
const DISK_TOTAL_GB: f64 = 32.0;

/// Synthetic host metrics for a 4-core, 4 GB, 32 GB-SD Raspberry Pi.
///
/// Time is virtual: read `n` happens at `n * step` seconds, so a given seed
/// always yields the same sequence regardless of wall-clock speed.
pub struct SyntheticSystem {
    rng: StdRng,
    step: Duration,
    reads: u64,
}

impl SyntheticSystem {
    pub fn new(seed: u64, step: Duration) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            step,
            reads: 0,
        }
    }

    pub fn read(&mut self) -> SystemSample {
        let t = self.step.as_secs_f64() * self.reads as f64;
        self.reads += 1;
        let rng = &mut self.rng;

        let cpu_temp = BASE_CPU_TEMP + rng.random_range(-3.0..=8.0);

        let cpu_percent = (BASE_CPU_PERCENT
            + 10.0 * (t / 60.0).sin()
            + rng.random_range(-5.0..=5.0))
        .clamp(5.0, 95.0);

        let cpu_freq_mhz = 1500.0 + rng.random_range(-100.0..=100.0);

        let mem_percent = (BASE_MEM_PERCENT + rng.random_range(-5.0..=5.0)).clamp(30.0, 80.0);
        let mem_used_gb = MEM_TOTAL_GB * mem_percent / 100.0;

        let disk_percent = (BASE_DISK_PERCENT + rng.random_range(-1.0..=1.0)).clamp(35.0, 45.0);
        let disk_used_gb = DISK_TOTAL_GB * disk_percent / 100.0;

        let load1 = cpu_percent / 100.0 * 2.0 + rng.random_range(-0.2..=0.2);
        let load5 = load1 * 0.9 + rng.random_range(-0.1..=0.1);
        let load15 = load5 * 0.95 + rng.random_range(-0.1..=0.1);

        SystemSample {
            sampled_at: Utc::now(),
            cpu_temperature: Some(round_to(cpu_temp, 2)),
            cpu_utilization_percent: round_to(cpu_percent, 2),
            logical_cpu_count: Some(4),
            cpu_frequency_mhz: Some(round_to(cpu_freq_mhz, 2)),
            memory: MemoryUsage {
                total_gb: MEM_TOTAL_GB,
                used_gb: round_to(mem_used_gb, 2),
                available_gb: round_to(MEM_TOTAL_GB - mem_used_gb, 2),
                percent: round_to(mem_percent, 2),
            },
            disk: DiskUsage {
                total_gb: DISK_TOTAL_GB,
                used_gb: round_to(disk_used_gb, 2),
                free_gb: round_to(DISK_TOTAL_GB - disk_used_gb, 2),
                percent: round_to(disk_percent, 2),
            },
            load_average: LoadAverage {
                one: round_to(load1, 2),
                five: round_to(load5, 2),
                fifteen: round_to(load15, 2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SyntheticSystem::new(7, Duration::from_secs(5));
        let mut b = SyntheticSystem::new(7, Duration::from_secs(5));

        for _ in 0..100 {
            let (x, y) = (a.read(), b.read());
            assert_eq!(x.cpu_utilization_percent, y.cpu_utilization_percent);
            assert_eq!(x.memory, y.memory);
            assert_eq!(x.load_average, y.load_average);
        }
    }

    #[test]
    fn test_values_stay_in_range() {
        let mut generator = SyntheticSystem::new(42, Duration::from_secs(5));

        for _ in 0..10_000 {
            let sample = generator.read();
            let cpu_temp = sample.cpu_temperature.unwrap();
            assert!((42.0..=53.0).contains(&cpu_temp));
            assert!((5.0..=95.0).contains(&sample.cpu_utilization_percent));
            assert_eq!(sample.logical_cpu_count, Some(4));
            assert!((30.0..=80.0).contains(&sample.memory.percent));
            assert!((35.0..=45.0).contains(&sample.disk.percent));
            assert!(
                (sample.memory.used_gb + sample.memory.available_gb - MEM_TOTAL_GB).abs() <= 0.011
            );
        }
    }
}
