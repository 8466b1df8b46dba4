use crate::domain::ports::Clock;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Clock that only moves when slept on. Sleeps return immediately.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: std::sync::Arc<std::sync::Mutex<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Default::default(),
        }
    }

    pub fn advance(&self, duration: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += duration;
        }
    }

    /// Total simulated time since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|o| *o).unwrap_or_default()
    }
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
