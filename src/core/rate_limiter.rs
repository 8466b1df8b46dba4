use crate::domain::ports::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Spaces outbound requests at least `1 / rate` seconds apart, then applies
/// an optional fixed politeness delay after every permit.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    extra_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// A non-positive `requests_per_second` disables interval enforcement.
    pub fn new(clock: Arc<dyn Clock>, requests_per_second: f64, extra_delay: Duration) -> Self {
        Self {
            clock,
            min_interval: interval_for(requests_per_second),
            extra_delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn extra_delay(&self) -> Duration {
        self.extra_delay
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let mut now = self.clock.now();
        if !self.min_interval.is_zero() {
            if let Some(previous) = *last {
                let elapsed = now.saturating_duration_since(previous);
                if elapsed < self.min_interval {
                    let wait = self.min_interval - elapsed;
                    tracing::trace!("rate limiter waiting {:?}", wait);
                    self.clock.sleep(wait).await;
                    now = self.clock.now();
                }
            }
        }
        *last = Some(now);
        drop(last);

        if !self.extra_delay.is_zero() {
            self.clock.sleep(self.extra_delay).await;
        }
    }
}

fn interval_for(requests_per_second: f64) -> Duration {
    if requests_per_second.is_finite() && requests_per_second > 0.0 {
        // Rounded up so the limiter never admits more than the configured rate.
        Duration::from_nanos((1e9 / requests_per_second).ceil() as u64)
    } else {
        Duration::ZERO
    }
}
