use std::future::Future;
use std::time::Duration;

use sw_config::RetryConfig;
use sw_schemas::{BusinessHoursRule, PollingObservation, StoreId};
use tracing::warn;

use crate::{SourceError, StoreDataSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Budget for a single attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `failed + 1`: `initial * 2^(failed - 1)`, capped.
    pub fn backoff_after(&self, failed: u32) -> Duration {
        let exp = failed.saturating_sub(1).min(20);
        self.initial_backoff
            .saturating_mul(1_u32 << exp)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }
}

/// Wraps a source with per-call timeouts and bounded exponential backoff.
///
/// Only transient errors are retried. Anything else, and the last transient
/// error once attempts are exhausted, is returned to the caller unchanged.
#[derive(Debug, Clone)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: StoreDataSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn call<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, SourceError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, SourceError>> + Send,
        T: Send,
    {
        let timeout_ms = u64::try_from(self.policy.timeout.as_millis()).unwrap_or(u64::MAX);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let res = match tokio::time::timeout(self.policy.timeout, f()).await {
                Ok(r) => r,
                Err(_) => Err(SourceError::Timeout { op, timeout_ms }),
            };

            match res {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff_after(attempt);
                    warn!(
                        op,
                        source = self.inner.source_name(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient source error; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: StoreDataSource> StoreDataSource for RetryingSource<S> {
    fn source_name(&self) -> &'static str {
        self.inner.source_name()
    }

    async fn list_store_ids(&self) -> Result<Vec<StoreId>, SourceError> {
        self.call("list_store_ids", || self.inner.list_store_ids()).await
    }

    async fn get_timezone(&self, store_id: &str) -> Result<Option<String>, SourceError> {
        self.call("get_timezone", || self.inner.get_timezone(store_id)).await
    }

    async fn get_business_hours(&self, store_id: &str) -> Result<Vec<BusinessHoursRule>, SourceError> {
        self.call("get_business_hours", || self.inner.get_business_hours(store_id))
            .await
    }

    async fn get_observations(&self, store_id: &str) -> Result<Vec<PollingObservation>, SourceError> {
        self.call("get_observations", || self.inner.get_observations(store_id))
            .await
    }
}
