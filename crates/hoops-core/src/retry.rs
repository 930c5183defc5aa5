//! Retry decorator for record stores.
//!
//! The pipeline itself never retries; wrap the store in [`RetryingStore`]
//! to retry transient failures inside a single persist call. All attempts
//! share that call's per-record timeout.

use std::time::Duration;

use crate::error::AppError;
use crate::models::SalaryRecord;
use crate::traits::RecordStore;

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retrying.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (1-indexed): base, 2x base, 4x base, ... capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        std::cmp::min(self.base_delay.saturating_mul(1 << exp), self.max_delay)
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 100ms base delay, 2s cap.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// A [`RecordStore`] wrapper that retries errors where [`AppError::is_retryable`] holds.
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: RecordStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<S: RecordStore> RecordStore for RetryingStore<S> {
    async fn persist(&self, record: &SalaryRecord) -> Result<(), AppError> {
        let mut attempt = 1;
        loop {
            match self.inner.persist(record).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::debug!(
                        name = %record.name(),
                        %attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Retrying persist"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
