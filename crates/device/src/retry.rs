//! Bounded retry with exponential backoff for device operations.

use std::time::Duration;

use tracing::warn;

use crate::DeviceError;

/// Retry policy for connecting and per-file transfers.
///
/// Only [transient](DeviceError::is_transient) failures are retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one. `1` disables retry.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Backoff cap.
    pub max_delay: Duration,
    /// Multiplier for each subsequent attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation = what,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "device operation failed, retrying"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
