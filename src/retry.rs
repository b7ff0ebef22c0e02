//! Bounded retry with a fixed delay schedule.
//!
//! Confirmation polling and other eventually-consistent lookups share this
//! utility instead of ad hoc sleep loops. The closure reports per-attempt
//! whether the value is ready or the attempt should be retried; terminal
//! errors propagate immediately and the budget is never exceeded.

use std::time::Duration;

use tracing::debug;

/// Outcome of a single retryable attempt.
pub enum Attempt<T> {
    /// The value is available; stop retrying.
    Ready(T),
    /// Not available yet; retry after the policy delay. The string names
    /// the reason for the log line.
    Retry(String),
}

/// Maximum attempts plus the delay schedule between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Delay multiplier applied after each attempt (1 = fixed delay).
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Fixed delay between every attempt.
    #[must_use]
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1,
        }
    }

    /// Doubling delay, capped at `max_delay`.
    #[must_use]
    pub const fn doubling(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier: 2,
        }
    }

    /// Delay to sleep after the given 1-based attempt number.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Runs `op` until it returns [`Attempt::Ready`], a terminal error, or the
/// attempt budget is exhausted.
///
/// Returns `Ok(None)` when every attempt asked for a retry; the caller
/// decides what exhaustion means (the confirmation tracker maps it to
/// [`DexterError::Unconfirmed`](crate::DexterError::Unconfirmed)).
///
/// # Errors
///
/// Propagates the first terminal error returned by `op`.
pub async fn poll_until<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> crate::Result<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = crate::Result<Attempt<T>>>,
{
    for attempt in 1..=policy.max_attempts {
        match op(attempt).await? {
            Attempt::Ready(value) => return Ok(Some(value)),
            Attempt::Retry(reason) => {
                debug!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    reason,
                    "attempt not ready"
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                }
            }
        }
    }

    Ok(None)
}
