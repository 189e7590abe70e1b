//! Sample records produced by the sources.
//!
//! Both kinds are plain values: built by a source on a successful read,
//! handed once to the store and dropped. A sample is never partially filled;
//! fields that a platform may legitimately not report are `Option`s.

mod environmental;
mod system;

pub use environmental::{EnvironmentalSample, Orientation, Vector3};
pub use system::{DiskUsage, LoadAverage, MemoryUsage, SystemSample};

/// Bytes per gigabyte (GiB) used for every `*_gb` field.
pub const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Converts a byte count to gigabytes.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(0), 0.0);
        assert_eq!(bytes_to_gb(1 << 30), 1.0);
        assert_eq!(bytes_to_gb(4 * (1 << 30)), 4.0);
        assert!((bytes_to_gb(512 * 1024 * 1024) - 0.5).abs() < f64::EPSILON);
    }
}
