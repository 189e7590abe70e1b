//! Host-metrics source.

mod host;
pub mod parser;
mod synthetic;

pub use host::HostMetrics;
pub use synthetic::SyntheticSystem;

use std::path::PathBuf;
use std::time::Duration;

use crate::models::SystemSample;
use crate::source::SourceError;
use crate::source::traits::FileSystem;

/// Provider of [`SystemSample`]s. Always available.
pub enum SystemMetricsSource<F: FileSystem> {
    /// Reads the machine the daemon runs on.
    Host(HostMetrics<F>),
    /// Seeded generator for development and tests.
    Synthetic(SyntheticSystem),
}

impl<F: FileSystem> SystemMetricsSource<F> {
    /// Creates a host-backed source.
    pub fn host(
        fs: F,
        proc_path: impl Into<String>,
        sys_path: impl Into<String>,
        disk_path: impl Into<PathBuf>,
        cpu_window: Duration,
    ) -> Self {
        Self::Host(HostMetrics::new(
            fs, proc_path, sys_path, disk_path, cpu_window,
        ))
    }

    /// Creates a synthetic source advancing its virtual clock by `step` per read.
    pub fn synthetic(seed: u64, step: Duration) -> Self {
        Self::Synthetic(SyntheticSystem::new(seed, step))
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::Synthetic(_) => "synthetic",
        }
    }

    /// Reads one sample. A host read blocks for the CPU sampling window.
    pub fn read(&mut self) -> Result<SystemSample, SourceError> {
        match self {
            Self::Host(host) => host.read(),
            Self::Synthetic(generator) => Ok(generator.read()),
        }
    }
}
