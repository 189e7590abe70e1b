//! Sample sources for the sampling loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  EnvironmentalSource            SystemMetricsSource          │
//! │  ├─ Hardware (IIO sysfs)        ├─ Host (/proc, /sys, statvfs)│
//! │  ├─ Synthetic (seeded)          └─ Synthetic (seeded)        │
//! │  └─ Unavailable                                              │
//! │             │                              │                 │
//! │             └──────────────┬───────────────┘                 │
//! │                     ┌──────▼──────┐                          │
//! │                     │  FileSystem │ (trait)                  │
//! │                     └──────┬──────┘                          │
//! └────────────────────────────┼─────────────────────────────────┘
//!                    ┌─────────┴─────────┐
//!             ┌──────▼──────┐     ┌──────▼──────┐
//!             │   RealFs    │     │   MockFs    │
//!             └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use sensehat_core::source::{EnvironmentalSource, MockFs, SystemMetricsSource};
//! use std::time::Duration;
//!
//! let fs = MockFs::sense_hat_pi();
//! let mut env = EnvironmentalSource::probe(fs.clone(), "/sys");
//! assert!(env.is_available());
//! let sample = env.read().unwrap();
//! assert!(sample.humidity > 0.0);
//!
//! let mut system = SystemMetricsSource::host(fs, "/proc", "/sys", "/", Duration::ZERO);
//! assert!(system.read().is_ok());
//! ```

pub mod environmental;
pub mod mock;
pub mod system;
pub mod traits;

pub use environmental::{EnvironmentalSource, IioSenseHat, SyntheticEnvironment};
pub use mock::MockFs;
pub use system::{HostMetrics, SyntheticSystem, SystemMetricsSource};
pub use traits::{FileSystem, FsUsage, RealFs};

/// Whether a source's underlying capability can currently be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(self) -> bool {
        self == Availability::Available
    }
}

/// Error type for source reads.
///
/// `Unavailable` means the capability is absent. `Io` and `Parse` are
/// transient read failures of an available source.
#[derive(Debug)]
pub enum SourceError {
    /// Hardware not present or probe failed.
    Unavailable(String),
    /// I/O error reading a sensor or metrics file.
    Io(std::io::Error),
    /// Malformed content in a sensor or metrics file.
    Parse(String),
}

impl SourceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "source unavailable: {}", msg),
            SourceError::Io(e) => write!(f, "read error: {}", e),
            SourceError::Parse(msg) => write!(f, "read error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        SourceError::Io(e)
    }
}

/// Rounds `value` to `places` decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let e = SourceError::Unavailable("no IIO devices".into());
        assert_eq!(e.to_string(), "source unavailable: no IIO devices");
        assert!(e.is_unavailable());

        let e = SourceError::Parse("invalid loadavg format".into());
        assert_eq!(e.to_string(), "read error: invalid loadavg format");
        assert!(!e.is_unavailable());

        let e: SourceError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, SourceError::Io(_)));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(20.0, 2), 20.0);
    }
}
