//! Retry-loop behavior of the invoker.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use healthchat::invoke::Invoker;
use healthchat::provider::{
    GenerationOutput, GenerationProvider, GenerationRequest, ProviderError, UsageStats,
};
use healthchat::types::Message;

/// Fails every attempt with the configured error builder, counting calls.
struct FailingProvider {
    attempts: AtomicU32,
    make_error: fn() -> ProviderError,
    succeed_after: Option<u32>,
}

impl FailingProvider {
    fn rate_limited() -> Self {
        Self {
            attempts: AtomicU32::new(0),
            make_error: rate_limit_error,
            succeed_after: None,
        }
    }

    fn rate_limited_then_ok(failures: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            make_error: rate_limit_error,
            succeed_after: Some(failures),
        }
    }

    fn fatal() -> Self {
        Self {
            attempts: AtomicU32::new(0),
            make_error: || ProviderError::HttpStatus {
                status: 401,
                body: "invalid api key".to_owned(),
            },
            succeed_after: None,
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

fn rate_limit_error() -> ProviderError {
    ProviderError::HttpStatus {
        status: 429,
        body: "rate limit exceeded".to_owned(),
    }
}

#[async_trait]
impl GenerationProvider for FailingProvider {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, ProviderError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(failures) = self.succeed_after {
            if n >= failures {
                return Ok(GenerationOutput {
                    text: "generated".to_owned(),
                    usage: UsageStats::default(),
                    model: "stub".to_owned(),
                });
            }
        }
        Err((self.make_error)())
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

fn request() -> GenerationRequest {
    GenerationRequest {
        messages: vec![Message::user("hello")],
        max_tokens: 100,
    }
}

#[tokio::test(start_paused = true)]
async fn always_rate_limited_makes_exactly_max_retries_attempts() {
    let provider = Arc::new(FailingProvider::rate_limited());
    let invoker = Invoker::new(provider.clone(), 3);

    let result = invoker.invoke(&request()).await;
    assert!(result.is_err());
    let err = result.expect_err("retries must exhaust");
    assert!(err.is_rate_limit(), "last observed error is returned");
    assert_eq!(provider.attempts(), 3, "bound counts attempts, not retries");
}

#[tokio::test(start_paused = true)]
async fn fatal_error_makes_exactly_one_attempt() {
    let provider = Arc::new(FailingProvider::fatal());
    let invoker = Invoker::new(provider.clone(), 3);

    let result = invoker.invoke(&request()).await;
    assert!(matches!(
        result,
        Err(ProviderError::HttpStatus { status: 401, .. })
    ));
    assert_eq!(provider.attempts(), 1, "fatal failures are never retried");
}

#[tokio::test(start_paused = true)]
async fn success_after_one_rate_limit_uses_two_attempts() {
    let provider = Arc::new(FailingProvider::rate_limited_then_ok(1));
    let invoker = Invoker::new(provider.clone(), 3);

    let output = invoker.invoke(&request()).await.expect("second attempt succeeds");
    assert_eq!(output.text, "generated");
    assert_eq!(provider.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn immediate_success_makes_one_attempt() {
    let provider = Arc::new(FailingProvider::rate_limited_then_ok(0));
    let invoker = Invoker::new(provider.clone(), 3);

    let output = invoker.invoke(&request()).await.expect("first attempt succeeds");
    assert_eq!(output.text, "generated");
    assert_eq!(provider.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_bound_is_clamped_to_one_attempt() {
    let provider = Arc::new(FailingProvider::rate_limited());
    let invoker = Invoker::new(provider.clone(), 0);

    let result = invoker.invoke(&request()).await;
    assert!(result.is_err());
    assert_eq!(provider.attempts(), 1);
}
