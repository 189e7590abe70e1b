use chrono::{DateTime, Utc};

/// Memory usage in GB plus the used percentage as the kernel accounts it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    pub percent: f64,
}

/// Filesystem usage of the root mount in GB.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskUsage {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// One host-metrics reading.
///
/// `cpu_temperature`, `logical_cpu_count` and `cpu_frequency_mhz` are absent
/// on platforms that cannot report them and are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSample {
    /// Time the read completed.
    pub sampled_at: DateTime<Utc>,
    /// Degrees Celsius.
    pub cpu_temperature: Option<f64>,
    pub cpu_utilization_percent: f64,
    pub logical_cpu_count: Option<i32>,
    pub cpu_frequency_mhz: Option<f64>,
    pub memory: MemoryUsage,
    pub disk: DiskUsage,
    pub load_average: LoadAverage,
}
