//! Parsers for the `/proc` and `/sys` files read by the host-metrics source.

/// Error from parsing a metrics file.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub s_reclaimable: u64,
}

/// Parses `/proc/meminfo` content.
///
/// `MemTotal` and `MemFree` are required. Kernels older than 3.14 lack
/// `MemAvailable`; it is then estimated as free + buffers + cached.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut has_total = false;
    let mut has_free = false;
    let mut has_available = false;

    let parse_kb = |line: &str| -> Result<u64, ParseError> {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ParseError::new(format!("invalid meminfo line: {}", line)))
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line)?;
            has_total = true;
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line)?;
            has_free = true;
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line)?;
            has_available = true;
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line)?;
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line)?;
        } else if line.starts_with("SReclaimable:") {
            info.s_reclaimable = parse_kb(line)?;
        }
    }

    if !has_total || info.mem_total == 0 {
        return Err(ParseError::new("MemTotal missing from meminfo"));
    }
    if !has_free {
        return Err(ParseError::new("MemFree missing from meminfo"));
    }
    if !has_available {
        info.mem_available = info.mem_free + info.buffers + info.cached;
    }

    Ok(info)
}

/// Load averages from `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    Ok(LoadAvg {
        load1,
        load5,
        load15,
    })
}

/// Aggregate CPU time counters (in USER_HZ ticks) from `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Percent of time busy between `prev` and `self`.
    ///
    /// Returns 0.0 when no time elapsed or counters went backwards.
    pub fn busy_percent_since(&self, prev: &CpuTimes) -> f64 {
        let total = self.total().saturating_sub(prev.total());
        if total == 0 {
            return 0.0;
        }
        let idle = self.idle_total().saturating_sub(prev.idle_total());
        let busy = total.saturating_sub(idle);
        (busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Parsed CPU section of `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct CpuStat {
    pub aggregate: CpuTimes,
    /// Number of `cpuN` lines (logical CPUs online).
    pub logical_cpus: u32,
}

/// Parses the CPU lines of `/proc/stat`.
pub fn parse_cpu_stat(content: &str) -> Result<CpuStat, ParseError> {
    let mut aggregate = None;
    let mut logical_cpus = 0;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(label) = parts.first() else {
            continue;
        };

        if *label == "cpu" {
            let get_val =
                |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };
            if parts.len() < 5 {
                return Err(ParseError::new("invalid cpu line in stat"));
            }
            aggregate = Some(CpuTimes {
                user: get_val(1),
                nice: get_val(2),
                system: get_val(3),
                idle: get_val(4),
                iowait: get_val(5),
                irq: get_val(6),
                softirq: get_val(7),
                steal: get_val(8),
            });
        } else if label
            .strip_prefix("cpu")
            .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        {
            logical_cpus += 1;
        }
    }

    let aggregate = aggregate.ok_or_else(|| ParseError::new("aggregate cpu line missing"))?;
    Ok(CpuStat {
        aggregate,
        logical_cpus,
    })
}

/// Parses a sysfs thermal zone reading (millidegrees) into °C.
pub fn parse_millidegrees(content: &str) -> Result<f64, ParseError> {
    content
        .trim()
        .parse::<f64>()
        .map(|m| m / 1000.0)
        .map_err(|_| ParseError::new(format!("invalid temperature: {:?}", content.trim())))
}

/// Parses a cpufreq `scaling_cur_freq` reading (kHz) into MHz.
pub fn parse_khz_as_mhz(content: &str) -> Result<f64, ParseError> {
    content
        .trim()
        .parse::<f64>()
        .map(|khz| khz / 1000.0)
        .map_err(|_| ParseError::new(format!("invalid frequency: {:?}", content.trim())))
}

/// Mean of the `cpu MHz` entries of `/proc/cpuinfo`, if any.
pub fn parse_cpuinfo_mhz(content: &str) -> Option<f64> {
    let values: Vec<f64> = content
        .lines()
        .filter(|line| line.starts_with("cpu MHz"))
        .filter_map(|line| line.split_once(':'))
        .filter_map(|(_, v)| v.trim().parse().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
