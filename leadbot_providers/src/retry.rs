use std::fmt::Display;
use std::time::Duration;

use leadbot_core::{LLMProvider, ProviderError};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

/// Bounded exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of calls, first attempt included
    pub max_attempts: u32,
    /// Wait before the first retry; doubled after every retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("non-retriable failure on attempt {attempt}: {error}")]
    NonRetriable { attempt: u32, error: E },

    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// Number of calls made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::NonRetriable { attempt, .. } => *attempt,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::NonRetriable { error, .. } => error,
            Self::Exhausted { last, .. } => last,
        }
    }
}

/// Retry an async operation while it fails with a transient error.
///
/// Makes at most `policy.max_attempts` calls (a zero policy still makes one).
/// Errors for which `is_transient` returns false abort immediately.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_transient(&e) => {
                error!("Request failed with non-retriable error (attempt {attempt}/{max_attempts}): {e}");
                return Err(RetryError::NonRetriable { attempt, error: e });
            }
            Err(e) if attempt >= max_attempts => {
                error!("Request still failing after {attempt} attempts, giving up: {e}");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                warn!(
                    "Transient failure (attempt {attempt}/{max_attempts}): {e}. Retrying after {}ms...",
                    delay.as_millis()
                );
                sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
    }
}

/// Call the generation service, retrying only on transient overload.
pub async fn generate_with_retry<P>(
    provider: &P,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<String, RetryError<ProviderError>>
where
    P: LLMProvider + ?Sized,
{
    retry_with_backoff(
        || provider.generate(prompt),
        policy,
        ProviderError::is_overloaded,
    )
    .await
}
