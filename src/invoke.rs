//! Resilient invocation of the generation provider.
//!
//! A small explicit state machine: `Attempt(n)` either succeeds, fails
//! fatally, or — on rate-limit backpressure with budget left — moves to
//! `Backoff(n)` and then `Attempt(n + 1)`. The retry bound counts
//! attempts, not retries: `max_retries = 3` means at most three calls.
//! Backoff is exponential, `2^n + 1` seconds, unjittered. All retry
//! state is owned by the single invocation; nothing persists across
//! requests.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::provider::{GenerationOutput, GenerationProvider, GenerationRequest, ProviderError};

/// Default attempt bound.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry-loop state. `Attempt` carries the zero-based attempt index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryState {
    /// Make the call for attempt `n`.
    Attempt(u32),
    /// Sleep the backoff for failed attempt `n`, then try `n + 1`.
    Backoff(u32),
}

/// Wraps a provider with bounded rate-limit retry.
#[derive(Clone)]
pub struct Invoker {
    provider: Arc<dyn GenerationProvider>,
    max_retries: u32,
}

impl Invoker {
    /// Create an invoker over the given provider. A zero bound is
    /// clamped to one attempt.
    pub fn new(provider: Arc<dyn GenerationProvider>, max_retries: u32) -> Self {
        Self {
            provider,
            max_retries: max_retries.max(1),
        }
    }

    /// Send the request, retrying rate-limit failures up to the bound.
    ///
    /// # Errors
    ///
    /// Returns the last observed [`ProviderError`] when attempts exhaust,
    /// or immediately for any non-rate-limit failure. No call is made
    /// after a fatal failure or once the bound is reached.
    pub async fn invoke(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, ProviderError> {
        let mut state = RetryState::Attempt(0);

        loop {
            match state {
                RetryState::Attempt(n) => match self.provider.generate(request).await {
                    Ok(output) => {
                        debug!(attempt = n.saturating_add(1), "generation succeeded");
                        return Ok(output);
                    }
                    Err(e) if e.is_rate_limit() && n.saturating_add(1) < self.max_retries => {
                        warn!(
                            attempt = n.saturating_add(1),
                            max_retries = self.max_retries,
                            error = %e,
                            "rate limited, backing off"
                        );
                        state = RetryState::Backoff(n);
                    }
                    Err(e) if e.is_rate_limit() => {
                        warn!(
                            attempts = self.max_retries,
                            error = %e,
                            "rate limited, retry budget exhausted"
                        );
                        return Err(e);
                    }
                    Err(e) => return Err(e),
                },
                RetryState::Backoff(n) => {
                    tokio::time::sleep(backoff_delay(n)).await;
                    state = RetryState::Attempt(n.saturating_add(1));
                }
            }
        }
    }
}

/// Backoff after failed attempt `n` (zero-based): `2^n + 1` seconds.
fn backoff_delay(attempt: u32) -> Duration {
    let seconds = 2u64
        .saturating_pow(attempt)
        .saturating_add(1);
    Duration::from_secs(seconds)
}
