//! Environmental/orientation source.
//!
//! The variant is chosen once at startup: `probe` yields `Hardware` when the
//! Sense HAT's IIO devices are present and `Unavailable` otherwise; synthetic
//! mode builds `Synthetic` directly.

mod iio;
mod synthetic;

pub use iio::{IioSenseHat, orientation};
pub use synthetic::SyntheticEnvironment;

use std::time::Duration;

use tracing::{info, warn};

use crate::models::EnvironmentalSample;
use crate::source::traits::FileSystem;
use crate::source::{Availability, SourceError};

/// Provider of [`EnvironmentalSample`]s.
pub enum EnvironmentalSource<F: FileSystem + Clone> {
    /// Real Sense HAT sensors.
    Hardware(IioSenseHat<F>),
    /// Seeded generator for development and tests.
    Synthetic(SyntheticEnvironment),
    /// Probe failed; keeps what is needed to probe again.
    Unavailable {
        reason: String,
        fs: F,
        sys_path: String,
    },
}

impl<F: FileSystem + Clone> EnvironmentalSource<F> {
    /// Probes for Sense HAT hardware under `sys_path`.
    ///
    /// Never fails: a missing board yields `Unavailable`.
    pub fn probe(fs: F, sys_path: impl Into<String>) -> Self {
        let sys_path = sys_path.into();
        match IioSenseHat::probe(fs.clone(), &sys_path) {
            Ok(hat) => {
                info!("Sense HAT detected");
                Self::Hardware(hat)
            }
            Err(e) => {
                warn!(error = %e, "Sense HAT not available");
                Self::Unavailable {
                    reason: e.to_string(),
                    fs,
                    sys_path,
                }
            }
        }
    }

    /// Creates a synthetic source advancing its virtual clock by `step` per read.
    pub fn synthetic(seed: u64, step: Duration) -> Self {
        Self::Synthetic(SyntheticEnvironment::new(seed, step))
    }

    pub fn availability(&self) -> Availability {
        match self {
            Self::Hardware(_) | Self::Synthetic(_) => Availability::Available,
            Self::Unavailable { .. } => Availability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_available()
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hardware(_) => "hardware",
            Self::Synthetic(_) => "synthetic",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    /// Probes again if currently unavailable. Returns the new availability.
    pub fn reprobe(&mut self) -> Availability {
        if let Self::Unavailable { fs, sys_path, .. } = self
            && let Ok(hat) = IioSenseHat::probe(fs.clone(), sys_path)
        {
            info!("Sense HAT detected on re-probe");
            *self = Self::Hardware(hat);
        }
        self.availability()
    }

    /// Reads one sample.
    ///
    /// Fails with `SourceError::Unavailable` when no board was found.
    pub fn read(&mut self) -> Result<EnvironmentalSample, SourceError> {
        match self {
            Self::Hardware(hat) => hat.read(),
            Self::Synthetic(generator) => Ok(generator.read()),
            Self::Unavailable { reason, .. } => Err(SourceError::Unavailable(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockFs;

    #[test]
    fn test_probe_with_board() {
        let mut source = EnvironmentalSource::probe(MockFs::sense_hat_pi(), "/sys");
        assert_eq!(source.kind(), "hardware");
        assert_eq!(source.availability(), Availability::Available);
        assert!(source.read().is_ok());
    }

    #[test]
    fn test_probe_without_board() {
        let mut source = EnvironmentalSource::probe(MockFs::bare_host(), "/sys");
        assert_eq!(source.kind(), "unavailable");
        assert!(!source.is_available());

        let err = source.read().unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_reprobe_stays_unavailable() {
        let mut source = EnvironmentalSource::probe(MockFs::bare_host(), "/sys");
        assert_eq!(source.reprobe(), Availability::Unavailable);
        assert_eq!(source.kind(), "unavailable");
    }

    #[test]
    fn test_reprobe_keeps_available_source() {
        let mut source: EnvironmentalSource<MockFs> =
            EnvironmentalSource::synthetic(5, Duration::from_secs(1));
        assert_eq!(source.reprobe(), Availability::Available);
        assert_eq!(source.kind(), "synthetic");
    }
}
