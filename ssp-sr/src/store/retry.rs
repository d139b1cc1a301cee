//! Bounded retry around store appends
//!
//! Transient store failures (timeouts, 429, 5xx) are retried with exponential
//! backoff up to a fixed attempt budget. An exhausted budget is reported as a
//! permanent failure; the retry budget is the de facto timeout, and there is
//! no cancellation mid-retry. Either way the trial stays current, so the
//! participant can submit again.

use std::time::Duration;
use tracing::{error, info, warn};

use ssp_common::config::RetrySettings;
use ssp_common::time::millis_to_duration;
use ssp_common::{Error, Result};

use super::RowStore;

/// Backoff schedule for append attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per submission, first try included
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: millis_to_duration(settings.base_delay_ms),
        }
    }

    /// Delay to sleep after the given failed attempt (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        // 500ms, 1s, 2s, 4s, ... for the default base
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

/// Append a row, retrying transient failures within the policy's budget
///
/// Transient failures that outlive the budget come back as a permanent
/// failure naming the exhausted budget; genuinely permanent failures pass
/// through on the first attempt.
pub async fn append_with_retry(
    store: &dyn RowStore,
    row: &[String],
    policy: &RetryPolicy,
) -> Result<()> {
    let mut attempt = 1u32;
    loop {
        match store.append_row(row).await {
            Ok(()) => {
                if attempt > 1 {
                    info!(attempt, "store append succeeded after retry");
                }
                return Ok(());
            }
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient store failure, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_transient() => {
                error!(attempt, error = %e, "store append failed; retry budget exhausted");
                return Err(Error::StorePermanent(format!(
                    "retry budget exhausted ({} attempts): {}",
                    policy.max_attempts, e
                )));
            }
            Err(e) => {
                error!(attempt, error = %e, "store append failed");
                return Err(e);
            }
        }
    }
}
