//! Bounded retry with randomised backoff.
//!
//! Transient failures against the public query services (timeouts,
//! rate-limits, load shedding) are retried a bounded number of times, with
//! a randomised pause between attempts so parallel workers do not hammer
//! the service in lockstep.

use std::future::Future;
use std::time::Duration;

use log::debug;
use rand::Rng;

/// Retry bounds for one operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Shortest pause between attempts.
    pub min_delay: Duration,
    /// Longest pause between attempts.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_millis(300),
            max_delay: Duration::from_millis(800),
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt budget and default delays.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the backoff bounds.
    #[must_use]
    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    /// A uniformly random pause within the configured bounds.
    fn jittered_delay(&self) -> Duration {
        let min = self.min_delay.as_secs_f64();
        let max = self.max_delay.as_secs_f64().max(min);
        let secs = rand::thread_rng().gen_range(min..=max);
        Duration::from_secs_f64(secs)
    }
}

/// Run `operation` until it succeeds, the error is not transient, or the
/// attempt budget is spent. The final error is returned as-is.
pub async fn with_retry<T, E, Op, Fut>(
    policy: RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut operation: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let budget = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < budget && is_transient(&error) => {
                let delay = policy.jittered_delay();
                debug!("attempt {attempt}/{budget} failed, retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
