//! Generation-service abstraction layer.
//!
//! Defines the [`GenerationProvider`] trait and the shared request and
//! response types, plus the error classification the retry loop relies
//! on. One provider is implemented: [`openai::OpenAiProvider`] against
//! the `/v1/chat/completions` API.

use async_trait::async_trait;
use regex::Regex;

use crate::types::Message;

pub mod openai;

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// A request for one generated completion.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Ordered prompt messages. Never reordered or deduplicated.
    pub messages: Vec<Message>,
    /// Token budget for the completion.
    pub max_tokens: u32,
}

/// Token usage counters reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
}

/// The result of one successful generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Generated answer text.
    pub text: String,
    /// Token usage for this call.
    pub usage: UsageStats,
    /// Model identifier that served the response.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by generation providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match the expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream responded with a non-success status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized, truncated response body.
        body: String,
    },
    /// Provider cannot satisfy the request with current configuration.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Whether this failure is rate-limit backpressure and therefore
    /// worth retrying. Detected via the 429 status or a rate-limit
    /// substring in the provider's message; everything else is fatal.
    pub fn is_rate_limit(&self) -> bool {
        if let Self::HttpStatus { status: 429, .. } = self {
            return true;
        }
        let message = self.to_string().to_lowercase();
        message.contains("rate limit") || message.contains("rate_limit")
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure and
/// `ProviderError::HttpStatus` with a sanitized body on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace, redact credential-shaped tokens, and truncate an
/// upstream error body before it enters an error value. Raw provider
/// errors must never leak secrets into logs or caller-facing messages.
fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"sk-ant-[A-Za-z0-9_\-]{10,}",
        r"sk-[A-Za-z0-9]{32,}",
        r"Bearer [A-Za-z0-9._\-]{16,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Core generation-service interface.
///
/// Implementations must be `Send + Sync`; the pipeline shares one
/// provider instance across concurrent requests and holds no per-request
/// state in it.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Request one completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on API, network, or parse failure.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationOutput, ProviderError>;

    /// The model identifier this provider is configured for.
    fn model_id(&self) -> &str;
}
