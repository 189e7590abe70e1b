//! The fixed-interval sampling loop.
//!
//! Each tick reads the environmental source, persists its sample, then does
//! the same for the system source. Every step is isolated: a failed read or
//! write is logged and the tick moves on. Ticks run at a fixed rate; a tick
//! that overruns the interval is followed immediately by the next one, with
//! no catch-up burst.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span, warn};

use crate::config::SourceToggle;
use crate::source::traits::FileSystem;
use crate::source::{EnvironmentalSource, SourceError, SystemMetricsSource};
use crate::storage::{SampleSink, StoreError};

/// Counters are logged every this many ticks.
const STATS_LOG_EVERY: u64 = 60;

/// Granularity of the shutdown check while waiting for the next tick.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// What happened to one source during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Source turned off in configuration.
    Disabled,
    /// Source has no hardware; nothing was read.
    Unavailable,
    /// Sample read and persisted.
    Written,
    /// The read failed; nothing was written.
    ReadFailed(String),
    /// The sample was read but the store rejected it.
    WriteFailed(StoreError),
}

impl StepOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, StepOutcome::Written)
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based tick number.
    pub tick: u64,
    pub environmental: StepOutcome,
    pub system: StepOutcome,
}

/// Running totals since the sampler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub ticks: u64,
    pub environmental_written: u64,
    pub environmental_failed: u64,
    pub system_written: u64,
    pub system_failed: u64,
    /// Ticks aborted by a panic.
    pub panics: u64,
}

impl SamplerStats {
    fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        match report.environmental {
            StepOutcome::Written => self.environmental_written += 1,
            StepOutcome::ReadFailed(_) | StepOutcome::WriteFailed(_) => {
                self.environmental_failed += 1
            }
            StepOutcome::Disabled | StepOutcome::Unavailable => {}
        }
        match report.system {
            StepOutcome::Written => self.system_written += 1,
            StepOutcome::ReadFailed(_) | StepOutcome::WriteFailed(_) => self.system_failed += 1,
            StepOutcome::Disabled | StepOutcome::Unavailable => {}
        }
    }
}

/// Drives the sources and the sink.
///
/// Owns both sources and the sink for the lifetime of the loop. Everything
/// runs on the calling thread; the only shared state is the `running` flag.
pub struct Sampler<F: FileSystem + Clone, S: SampleSink> {
    environmental: Option<EnvironmentalSource<F>>,
    environmental_toggle: SourceToggle,
    system: Option<SystemMetricsSource<F>>,
    sink: S,
    interval: Duration,
    device_id: Option<String>,
    running: Arc<AtomicBool>,
    stats: SamplerStats,
}

impl<F: FileSystem + Clone, S: SampleSink> Sampler<F, S> {
    /// Creates a sampler with both sources disabled.
    pub fn new(sink: S, interval: Duration) -> Self {
        Self {
            environmental: None,
            environmental_toggle: SourceToggle::Disabled,
            system: None,
            sink,
            interval,
            device_id: None,
            running: Arc::new(AtomicBool::new(true)),
            stats: SamplerStats::default(),
        }
    }

    /// Enables the environmental source.
    ///
    /// With `SourceToggle::Enabled` an unavailable source is re-probed at the
    /// start of every tick.
    pub fn with_environmental(mut self, source: EnvironmentalSource<F>, toggle: SourceToggle) -> Self {
        if !toggle.is_disabled() {
            self.environmental = Some(source);
            self.environmental_toggle = toggle;
        }
        self
    }

    /// Enables the system metrics source.
    pub fn with_system(mut self, source: SystemMetricsSource<F>) -> Self {
        self.system = Some(source);
        self
    }

    pub fn with_device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id;
        self
    }

    /// Flag that keeps the loop going; store `false` to stop it.
    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs one tick: environmental source first, then system metrics.
    pub fn tick(&mut self) -> TickReport {
        let tick = self.stats.ticks + 1;
        let environmental = self.sample_environmental();
        let system = self.sample_system();

        let report = TickReport {
            tick,
            environmental,
            system,
        };
        self.stats.record(&report);

        if self.stats.ticks.is_multiple_of(STATS_LOG_EVERY) {
            info!(
                "Stats after {} ticks: environmental {} written / {} failed, system {} written / {} failed",
                self.stats.ticks,
                self.stats.environmental_written,
                self.stats.environmental_failed,
                self.stats.system_written,
                self.stats.system_failed,
            );
        }

        report
    }

    /// Runs until the `running` flag is cleared.
    pub fn run(&mut self) -> SamplerStats {
        self.run_loop(None)
    }

    /// Runs at most `ticks` ticks, stopping early if the `running` flag is cleared.
    pub fn run_ticks(&mut self, ticks: u64) -> SamplerStats {
        self.run_loop(Some(ticks))
    }

    fn run_loop(&mut self, limit: Option<u64>) -> SamplerStats {
        let span = info_span!("sampler", device = self.device_id.as_deref().unwrap_or("-"));
        let _enter = span.enter();

        info!(
            "Starting sampling loop: interval {:?}, environmental {}, system {}",
            self.interval,
            self.environmental.as_ref().map_or("disabled", |s| s.kind()),
            self.system.as_ref().map_or("disabled", |s| s.kind()),
        );

        let mut done: u64 = 0;
        let mut next_tick = Instant::now();

        loop {
            if !self.running.load(Ordering::SeqCst) || limit.is_some_and(|n| done >= n) {
                break;
            }

            self.guarded_tick();
            done += 1;

            if limit.is_some_and(|n| done >= n) {
                break;
            }

            let Some(due) = next_tick.checked_add(self.interval) else {
                warn!("Interval {:?} cannot be scheduled, waiting for shutdown", self.interval);
                while self.running.load(Ordering::SeqCst) {
                    std::thread::sleep(SLEEP_SLICE);
                }
                break;
            };
            next_tick = due;
            let now = Instant::now();
            if next_tick < now {
                debug!("Tick overran interval by {:?}", now - next_tick);
                next_tick = now;
            }
            self.sleep_until(next_tick);
        }

        info!("Sampling loop stopped after {} ticks", done);
        self.stats
    }

    /// Runs a tick, turning a panic into a logged error.
    fn guarded_tick(&mut self) -> Option<TickReport> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
            Ok(report) => Some(report),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.stats.ticks += 1;
                self.stats.panics += 1;
                error!("Tick #{} aborted: {}", self.stats.ticks, msg);
                None
            }
        }
    }

    /// Sleeps in short slices so a cleared `running` flag is noticed quickly.
    fn sleep_until(&self, deadline: Instant) {
        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }

    fn sample_environmental(&mut self) -> StepOutcome {
        let Some(source) = self.environmental.as_mut() else {
            return StepOutcome::Disabled;
        };

        if !source.is_available() {
            if self.environmental_toggle == SourceToggle::Enabled {
                source.reprobe();
            }
            if !source.is_available() {
                debug!("Environmental source unavailable, skipping");
                return StepOutcome::Unavailable;
            }
        }

        let sample = match source.read() {
            Ok(sample) => sample,
            Err(e) => {
                log_read_error("environmental", &e);
                return StepOutcome::ReadFailed(e.to_string());
            }
        };

        match self.sink.write_environmental(&sample) {
            Ok(()) => {
                info!(
                    "Environmental sample written: {:.2} °C, {:.2} %, {:.2} hPa",
                    sample.temperature, sample.humidity, sample.pressure
                );
                StepOutcome::Written
            }
            Err(e) => {
                error!("Failed to write environmental sample: {}", e);
                StepOutcome::WriteFailed(e)
            }
        }
    }

    fn sample_system(&mut self) -> StepOutcome {
        let Some(source) = self.system.as_mut() else {
            return StepOutcome::Disabled;
        };

        let sample = match source.read() {
            Ok(sample) => sample,
            Err(e) => {
                log_read_error("system", &e);
                return StepOutcome::ReadFailed(e.to_string());
            }
        };

        match self.sink.write_system(&sample) {
            Ok(()) => {
                info!(
                    "System sample written: cpu {:.1} %, mem {:.1} %, disk {:.1} %",
                    sample.cpu_utilization_percent, sample.memory.percent, sample.disk.percent
                );
                StepOutcome::Written
            }
            Err(e) => {
                error!("Failed to write system sample: {}", e);
                StepOutcome::WriteFailed(e)
            }
        }
    }
}

fn log_read_error(source: &str, e: &SourceError) {
    if e.is_unavailable() {
        warn!("Failed to read {} sample: {}", source, e);
    } else {
        error!("Failed to read {} sample: {}", source, e);
    }
}
