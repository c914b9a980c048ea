//! Request spacing for web-service lookups, with adaptive backoff.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Enforces a minimum interval between requests.  Failures double the
/// interval (up to a maximum), runs of successes halve it again.
pub struct RateLimiter {
    service: String,
    last_request: Option<Instant>,
    current_interval: Duration,
    base_interval: Duration,
    max_interval: Duration,
    success_count: u32,
    successes_to_reduce: u32,
}

impl RateLimiter {
    /// * `service` — name used in log messages
    /// * `base_interval` — minimum time between requests
    /// * `max_interval` — upper bound after repeated failures
    /// * `successes_to_reduce` — consecutive successes before the interval is
    ///   halved; 0 disables the reduction
    pub fn new(
        service: &str,
        base_interval: Duration,
        max_interval: Duration,
        successes_to_reduce: u32,
    ) -> Self {
        RateLimiter {
            service: service.to_string(),
            last_request: None,
            current_interval: base_interval,
            base_interval,
            max_interval,
            success_count: 0,
            successes_to_reduce,
        }
    }

    /// Base interval in milliseconds; backs off to 16× and recovers after
    /// 10 successes.
    pub fn from_millis(service: &str, millis: u64) -> Self {
        let base = Duration::from_millis(millis);
        Self::new(service, base, base * 16, 10)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Sleep until the interval since the previous request has passed.
    /// Call this right before sending a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.current_interval {
                let wait = self.current_interval - elapsed;
                debug!(service = %self.service, "rate limiting: waiting {:.2}s", wait.as_secs_f64());
                thread::sleep(wait);
            }
        }
        self.last_request = Some(Instant::now());
    }

    pub fn report_success(&mut self) {
        if self.successes_to_reduce == 0 {
            return;
        }

        self.success_count += 1;

        if self.success_count >= self.successes_to_reduce
            && self.current_interval > self.base_interval
        {
            self.current_interval = (self.current_interval / 2).max(self.base_interval);
            info!(
                service = %self.service,
                "rate limit reduced to {:.2}s after {} successes",
                self.current_interval.as_secs_f64(),
                self.success_count
            );
            self.success_count = 0;
        }
    }

    pub fn report_failure(&mut self) {
        self.current_interval = (self.current_interval * 2).min(self.max_interval);
        info!(
            service = %self.service,
            "rate limit increased to {:.2}s after an error",
            self.current_interval.as_secs_f64()
        );
        self.success_count = 0;
    }
}
