//! Runtime settings.
//!
//! Every setting is read from an environment variable and may also be given
//! as a long flag; flags win over the environment. An invalid value is the
//! only fatal startup error.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::storage::StoreConfig;

/// Default log file name inside the log directory.
pub const DEFAULT_LOG_FILE: &str = "sensehat-logger.log";

/// Whether a source is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceToggle {
    /// Use the source if the probe finds it, otherwise skip it for good.
    Auto,
    /// Source is expected; a failed probe is an error and is retried every tick.
    Enabled,
    Disabled,
}

impl SourceToggle {
    pub fn is_disabled(self) -> bool {
        self == SourceToggle::Disabled
    }
}

impl fmt::Display for SourceToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceToggle::Auto => "auto",
            SourceToggle::Enabled => "true",
            SourceToggle::Disabled => "false",
        };
        f.write_str(s)
    }
}

/// Parses a boolean in any of the accepted spellings.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!(
            "invalid boolean '{}': expected true/false, 1/0, yes/no or on/off",
            other
        )),
    }
}

/// Parses `auto` or a boolean.
pub fn parse_toggle(s: &str) -> Result<SourceToggle, String> {
    if s.trim().eq_ignore_ascii_case("auto") {
        return Ok(SourceToggle::Auto);
    }
    parse_bool(s)
        .map(|on| {
            if on {
                SourceToggle::Enabled
            } else {
                SourceToggle::Disabled
            }
        })
        .map_err(|_| format!("invalid value '{}': expected auto or a boolean", s.trim()))
}

/// Upper bound for any duration setting.
pub const MAX_SECONDS: f64 = 86_400.0;

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid seconds '{}': {}", s.trim(), e))?;
    if !(0.0..=MAX_SECONDS).contains(&secs) {
        return Err(format!(
            "invalid seconds '{}': must be between 0 and {}",
            s.trim(),
            MAX_SECONDS
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid seconds '{}': {}", s.trim(), e))
}

/// Parses a log level name into its `tracing` spelling.
///
/// Accepts the usual aliases (`warning`, `critical`, `fatal`) in any case.
pub fn parse_log_level(s: &str) -> Result<String, String> {
    let level = match s.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        other => {
            return Err(format!(
                "invalid log level '{}': expected error, warn, info, debug or trace",
                other
            ));
        }
    };
    Ok(level.to_string())
}

/// Parses a strictly positive number of seconds (fractions allowed).
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let interval = parse_seconds(s)?;
    if interval.is_zero() {
        return Err("interval must be greater than 0".to_string());
    }
    Ok(interval)
}

/// Parses a non-negative number of seconds (fractions allowed).
pub fn parse_window(s: &str) -> Result<Duration, String> {
    parse_seconds(s)
}

/// Sense HAT telemetry logger.
#[derive(Parser, Clone)]
#[command(
    name = "sensehatd",
    about = "Samples Sense HAT sensors and host metrics into PostgreSQL",
    version
)]
pub struct Config {
    /// PostgreSQL host.
    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    pub postgres_host: String,

    /// PostgreSQL port.
    #[arg(long, env = "POSTGRES_PORT", default_value = "5432")]
    pub postgres_port: u16,

    /// PostgreSQL database name.
    #[arg(long, env = "POSTGRES_DB", default_value = "sensehat")]
    pub postgres_db: String,

    /// PostgreSQL user.
    #[arg(long, env = "POSTGRES_USER", default_value = "postgres")]
    pub postgres_user: String,

    /// PostgreSQL password.
    #[arg(
        long,
        env = "POSTGRES_PASSWORD",
        default_value = "postgres",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub postgres_password: String,

    /// Connection timeout in seconds.
    #[arg(long, env = "POSTGRES_CONNECT_TIMEOUT", default_value = "5")]
    pub postgres_connect_timeout: u64,

    /// Sampling interval in seconds (fractions allowed).
    #[arg(long, env = "SAMPLE_INTERVAL", default_value = "5", value_parser = parse_interval)]
    pub interval: Duration,

    /// Sense HAT source: auto, true or false.
    #[arg(long, env = "ENABLE_SENSEHAT", default_value = "auto", value_parser = parse_toggle)]
    pub enable_sensehat: SourceToggle,

    /// Host metrics source: true or false.
    #[arg(
        long,
        env = "ENABLE_SYSTEM_METRICS",
        default_value = "true",
        value_parser = parse_bool,
        action = ArgAction::Set
    )]
    pub enable_system_metrics: bool,

    /// Device identifier attached to log lines.
    #[arg(long, env = "DEVICE_ID")]
    pub device_id: Option<String>,

    /// Replace hardware and host sources with seeded generators.
    #[arg(
        long,
        env = "FAKE_DATA",
        default_value = "false",
        value_parser = parse_bool,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub fake_data: bool,

    /// Seed for synthetic mode. Derived from the clock if not set.
    #[arg(long, env = "SYNTHETIC_SEED")]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "LOG_LEVEL", default_value = "info", value_parser = parse_log_level)]
    pub log_level: String,

    /// Directory for the log file. Defaults to the platform data directory.
    #[arg(long, env = "LOG_DIR", value_name = "PATH")]
    pub log_dir: Option<PathBuf>,

    /// Log file name inside the log directory.
    #[arg(long, env = "LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Path to /proc filesystem.
    #[arg(long, env = "PROC_PATH", default_value = "/proc")]
    pub proc_path: String,

    /// Path to /sys filesystem.
    #[arg(long, env = "SYS_PATH", default_value = "/sys")]
    pub sys_path: String,

    /// Mount point whose usage is reported as disk metrics.
    #[arg(long, env = "DISK_PATH", default_value = "/")]
    pub disk_path: PathBuf,

    /// CPU utilization sampling window in seconds.
    #[arg(long, env = "CPU_SAMPLE_WINDOW", default_value = "1", value_parser = parse_window)]
    pub cpu_sample_window: Duration,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Config {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            dbname: self.postgres_db.clone(),
            user: self.postgres_user.clone(),
            password: self.postgres_password.clone(),
            connect_timeout: Duration::from_secs(self.postgres_connect_timeout),
        }
    }

    /// Effective log level after `-v`/`-q`.
    pub fn effective_log_level(&self) -> String {
        if self.quiet {
            return "error".to_string();
        }
        match self.verbose {
            0 => self.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}

// One line, password elided.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "store={} interval={:?} sensehat={} system_metrics={} fake_data={} device_id={} \
             proc={} sys={} disk={} cpu_window={:?}",
            self.store_config(),
            self.interval,
            self.enable_sensehat,
            self.enable_system_metrics,
            self.fake_data,
            self.device_id.as_deref().unwrap_or("-"),
            self.proc_path,
            self.sys_path,
            self.disk_path.display(),
            self.cpu_sample_window,
        )
    }
}
