//! sensehatd - Sense HAT telemetry logger.
//!
//! Samples the Sense HAT sensors and host metrics on a fixed interval and
//! appends each sample to PostgreSQL. Runs until SIGINT/SIGTERM.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use directories::ProjectDirs;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use sensehat_core::config::{Config, SourceToggle};
use sensehat_core::sampler::Sampler;
use sensehat_core::source::{EnvironmentalSource, RealFs, SystemMetricsSource};
use sensehat_core::storage::{PgStore, SampleSink};

/// Platform log directory, e.g. `~/.local/share/sensehat-logger/logs` on Linux.
fn default_log_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "sensehat", "sensehat-logger").map(|dirs| dirs.data_local_dir().join("logs"))
}

/// Creates the log directory if needed and opens the log file for appending.
fn open_log_file(dir: &Path, name: &str) -> io::Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Builds the level filter; `RUST_LOG` directives for other targets still apply.
fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for target in ["sensehatd", "sensehat_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Initializes console and file logging.
///
/// Returns the log file path, or the reason file logging is off.
fn init_logging(config: &Config) -> Result<PathBuf, String> {
    let filter = build_filter(&config.effective_log_level());

    let file = config
        .log_dir
        .clone()
        .or_else(default_log_dir)
        .ok_or_else(|| "no log directory available".to_string())
        .and_then(|dir| {
            open_log_file(&dir, &config.log_file)
                .map_err(|e| format!("{}: {}", dir.join(&config.log_file).display(), e))
        });

    let (file_layer, result) = match file {
        Ok((file, path)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            ),
            Ok(path),
        ),
        Err(e) => (None, Err(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    result
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn build_environmental(config: &Config, fs: RealFs, seed: u64) -> EnvironmentalSource<RealFs> {
    if config.fake_data {
        info!("Environmental source: synthetic (seed {})", seed);
        return EnvironmentalSource::synthetic(seed, config.interval);
    }

    let source = EnvironmentalSource::probe(fs, config.sys_path.clone());
    if !source.is_available() && config.enable_sensehat == SourceToggle::Enabled {
        error!("Sense HAT enabled but not detected; probing again every tick");
    }
    info!("Environmental source: {}", source.kind());
    source
}

fn build_system(config: &Config, fs: RealFs, seed: u64) -> SystemMetricsSource<RealFs> {
    let source = if config.fake_data {
        SystemMetricsSource::synthetic(seed.wrapping_add(1), config.interval)
    } else {
        SystemMetricsSource::host(
            fs,
            config.proc_path.clone(),
            config.sys_path.clone(),
            config.disk_path.clone(),
            config.cpu_sample_window,
        )
    };
    info!("System metrics source: {}", source.kind());
    source
}

fn main() {
    let config = Config::parse();

    let log_file = init_logging(&config);

    info!("sensehatd {} starting", env!("CARGO_PKG_VERSION"));
    match &log_file {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => warn!("File logging disabled, console only ({})", e),
    }
    info!("Configuration: {}", config);
    info!(
        "Device: {}, synthetic mode: {}",
        config.device_id.as_deref().unwrap_or("-"),
        config.fake_data
    );

    let seed = config.seed.unwrap_or_else(seed_from_clock);
    let fs = RealFs::new();

    let mut store = PgStore::new(config.store_config());
    if store.init_schema().is_ok() {
        info!("PostgreSQL: schema ready");
    }

    let mut sampler = Sampler::new(store, config.interval).with_device_id(config.device_id.clone());

    if config.enable_sensehat.is_disabled() {
        info!("Environmental source: disabled");
    } else {
        sampler = sampler.with_environmental(
            build_environmental(&config, fs, seed),
            config.enable_sensehat,
        );
    }

    if config.enable_system_metrics {
        sampler = sampler.with_system(build_system(&config, fs, seed));
    } else {
        info!("System metrics source: disabled");
    }

    // Setup graceful shutdown
    let running = sampler.running();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let stats = sampler.run();

    info!("Shutting down...");
    let mut store = sampler.into_sink();
    store.close();

    info!(
        "Shutdown complete: {} ticks, {} environmental and {} system samples written",
        stats.ticks, stats.environmental_written, stats.system_written
    );
}
