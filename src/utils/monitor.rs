use crate::domain::model::RunStats;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct ResourceStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
}

/// Samples CPU and memory of the current process.
#[cfg(feature = "cli")]
pub struct ResourceSampler {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl ResourceSampler {
    pub fn new() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Resource monitoring disabled: {}", e);
                return None;
            }
        };
        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();
        Some(Self {
            system,
            pid,
            peak_memory_mb: 0,
        })
    }

    pub fn sample(&mut self) -> Option<ResourceStats> {
        self.system.refresh_all();
        let process = self.system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);
        Some(ResourceStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            peak_memory_mb: self.peak_memory_mb,
        })
    }
}

#[cfg(not(feature = "cli"))]
pub struct ResourceSampler;

#[cfg(not(feature = "cli"))]
impl ResourceSampler {
    pub fn new() -> Option<Self> {
        None
    }

    pub fn sample(&mut self) -> Option<ResourceStats> {
        None
    }
}

/// Periodic progress logging for one file run.
pub struct ProgressMonitor {
    label: String,
    interval: usize,
    started: Instant,
    sampler: Option<ResourceSampler>,
}

impl ProgressMonitor {
    pub fn new(label: impl Into<String>, interval: usize, resource_stats: bool) -> Self {
        Self {
            label: label.into(),
            interval,
            started: Instant::now(),
            sampler: if resource_stats {
                ResourceSampler::new()
            } else {
                None
            },
        }
    }

    pub fn is_due(&self, stats: &RunStats) -> bool {
        self.interval > 0 && stats.evaluated > 0 && stats.evaluated % self.interval == 0
    }

    /// Called after every evaluated row; logs only on interval boundaries.
    pub fn row_done(&mut self, stats: &RunStats) {
        if self.is_due(stats) {
            self.log(stats, "progress");
        }
    }

    pub fn finish(&mut self, stats: &RunStats) {
        self.log(stats, "done");
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn log(&mut self, stats: &RunStats, phase: &str) {
        tracing::info!(
            "{} {}: {}/{} rows evaluated, {} skipped ({}) in {:.1?}",
            self.label,
            phase,
            stats.evaluated,
            stats.total_rows,
            stats.skipped,
            stats.summary(),
            self.started.elapsed()
        );
        if let Some(resources) = self.sampler.as_mut().and_then(|s| s.sample()) {
            tracing::info!(
                "{} resources: CPU {:.1}%, memory {}MB, peak {}MB",
                self.label,
                resources.cpu_usage,
                resources.memory_usage_mb,
                resources.peak_memory_mb
            );
        }
    }
}
