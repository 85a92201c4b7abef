//! Linear retry pacing used by the request executor.

use std::time::Duration;

use tokio::time::sleep;

/// Attempt budget and the delay step between failed attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    step: Duration,
}

impl RetryPolicy {
    /// Creates a policy; a zero budget still allows one attempt.
    pub fn new(attempts: u32, step: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            step,
        }
    }

    /// Returns the total number of attempts allowed.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether `attempt` (zero-based) is the last one the budget allows.
    pub fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.attempts
    }

    /// Delay after the zero-based `attempt` failed: `(attempt + 1) * step`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt.saturating_add(1))
    }

    /// Sleeps for the delay that follows a failed `attempt`.
    pub async fn pause(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
