//! Host metrics read from `/proc`, `/sys` and `statvfs`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use super::parser::{
    CpuTimes, parse_cpu_stat, parse_cpuinfo_mhz, parse_khz_as_mhz, parse_loadavg,
    parse_meminfo, parse_millidegrees,
};
use crate::models::{DiskUsage, LoadAverage, MemoryUsage, SystemSample, bytes_to_gb};
use crate::source::SourceError;
use crate::source::round_to;
use crate::source::traits::FileSystem;

/// Thermal zone of the SoC on Raspberry Pi OS.
const THERMAL_ZONE: &str = "class/thermal/thermal_zone0/temp";

/// Reads host metrics of the machine the daemon runs on.
///
/// `cpu_temperature`, `logical_cpu_count` and `cpu_frequency_mhz` degrade to
/// `None` when the platform does not expose them; every other field is
/// required and its absence fails the read.
pub struct HostMetrics<F: FileSystem> {
    fs: F,
    proc_path: String,
    sys_path: String,
    disk_path: PathBuf,
    /// How long to observe CPU counters for utilisation.
    cpu_window: Duration,
    /// Counters from the previous call, used when `cpu_window` is zero.
    last_cpu: Option<CpuTimes>,
}

impl<F: FileSystem> HostMetrics<F> {
    /// Creates a new host metrics reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `sys_path` - Base path to sysfs (usually "/sys")
    /// * `disk_path` - Mount whose usage is reported (usually "/")
    /// * `cpu_window` - Blocking window for CPU utilisation
    pub fn new(
        fs: F,
        proc_path: impl Into<String>,
        sys_path: impl Into<String>,
        disk_path: impl Into<PathBuf>,
        cpu_window: Duration,
    ) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            sys_path: sys_path.into(),
            disk_path: disk_path.into(),
            cpu_window,
            last_cpu: None,
        }
    }

    /// Reads one sample.
    ///
    /// Blocks for the CPU sampling window.
    pub fn read(&mut self) -> Result<SystemSample, SourceError> {
        let (cpu_utilization_percent, logical_cpu_count) = self.collect_cpu_utilization()?;
        let memory = self.collect_memory()?;
        let disk = self.collect_disk()?;
        let load_average = self.collect_loadavg()?;

        Ok(SystemSample {
            sampled_at: Utc::now(),
            cpu_temperature: self.collect_cpu_temperature(),
            cpu_utilization_percent,
            logical_cpu_count,
            cpu_frequency_mhz: self.collect_cpu_frequency(),
            memory,
            disk,
            load_average,
        })
    }

    /// SoC temperature, `None` on hosts without the thermal zone.
    pub fn collect_cpu_temperature(&self) -> Option<f64> {
        let path = format!("{}/{}", self.sys_path, THERMAL_ZONE);
        let content = self.fs.read_to_string(Path::new(&path)).ok()?;
        match parse_millidegrees(&content) {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                debug!(path = %path, error = %e, "ignoring unreadable thermal zone");
                None
            }
        }
    }

    /// CPU utilisation over the sampling window and the logical CPU count.
    pub fn collect_cpu_utilization(&mut self) -> Result<(f64, Option<i32>), SourceError> {
        let first = self.read_cpu_stat()?;
        let (prev, current) = if self.cpu_window.is_zero() {
            (self.last_cpu.unwrap_or(first.aggregate), first)
        } else {
            std::thread::sleep(self.cpu_window);
            (first.aggregate, self.read_cpu_stat()?)
        };
        self.last_cpu = Some(current.aggregate);

        let percent = round_to(current.aggregate.busy_percent_since(&prev), 1);
        let count = (current.logical_cpus > 0).then_some(current.logical_cpus as i32);
        Ok((percent, count))
    }

    /// Mean current frequency across cores.
    ///
    /// Tries cpufreq first, then `cpu MHz` from `/proc/cpuinfo`.
    pub fn collect_cpu_frequency(&self) -> Option<f64> {
        let cpu_dir = format!("{}/devices/system/cpu", self.sys_path);
        let mut readings = Vec::new();
        if let Ok(entries) = self.fs.read_dir(Path::new(&cpu_dir)) {
            for entry in entries {
                let is_cpu = entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix("cpu"))
                    .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));
                if !is_cpu {
                    continue;
                }
                if let Ok(content) = self
                    .fs
                    .read_to_string(&entry.join("cpufreq/scaling_cur_freq"))
                    && let Ok(mhz) = parse_khz_as_mhz(&content)
                {
                    readings.push(mhz);
                }
            }
        }

        if !readings.is_empty() {
            return Some(readings.iter().sum::<f64>() / readings.len() as f64);
        }

        let path = format!("{}/cpuinfo", self.proc_path);
        let content = self.fs.read_to_string(Path::new(&path)).ok()?;
        parse_cpuinfo_mhz(&content)
    }

    /// Memory usage from `/proc/meminfo`.
    pub fn collect_memory(&self) -> Result<MemoryUsage, SourceError> {
        let path = format!("{}/meminfo", self.proc_path);
        let content = self.fs.read_to_string(Path::new(&path))?;
        let info = parse_meminfo(&content).map_err(|e| SourceError::Parse(e.message))?;

        let total = info.mem_total * 1024;
        let free = info.mem_free * 1024;
        let available = info.mem_available * 1024;
        let cached = (info.cached + info.s_reclaimable) * 1024;
        let buffers = info.buffers * 1024;

        let used = match total.checked_sub(free + cached + buffers) {
            Some(used) => used,
            None => total.saturating_sub(free),
        };
        let percent = total.saturating_sub(available) as f64 / total as f64 * 100.0;

        Ok(MemoryUsage {
            total_gb: bytes_to_gb(total),
            used_gb: bytes_to_gb(used),
            available_gb: bytes_to_gb(available),
            percent: round_to(percent, 1),
        })
    }

    /// Usage of the configured mount.
    pub fn collect_disk(&self) -> Result<DiskUsage, SourceError> {
        let usage = self.fs.statvfs(&self.disk_path)?;
        let used = usage.total.saturating_sub(usage.free);
        let denominator = used + usage.available;
        let percent = if denominator > 0 {
            used as f64 / denominator as f64 * 100.0
        } else {
            0.0
        };

        Ok(DiskUsage {
            total_gb: bytes_to_gb(usage.total),
            used_gb: bytes_to_gb(used),
            free_gb: bytes_to_gb(usage.available),
            percent: round_to(percent, 1),
        })
    }

    /// Load average from `/proc/loadavg`.
    pub fn collect_loadavg(&self) -> Result<LoadAverage, SourceError> {
        let path = format!("{}/loadavg", self.proc_path);
        let content = self.fs.read_to_string(Path::new(&path))?;
        let info = parse_loadavg(&content).map_err(|e| SourceError::Parse(e.message))?;

        Ok(LoadAverage {
            one: info.load1,
            five: info.load5,
            fifteen: info.load15,
        })
    }

    fn read_cpu_stat(&self) -> Result<super::parser::CpuStat, SourceError> {
        let path = format!("{}/stat", self.proc_path);
        let content = self.fs.read_to_string(Path::new(&path))?;
        parse_cpu_stat(&content).map_err(|e| SourceError::Parse(e.message))
    }
}
