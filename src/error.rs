//! Error taxonomy for the chat pipeline.
//!
//! Validation and configuration errors short-circuit before any network
//! call. Transient provider failures are absorbed by the invoker's retry
//! loop and only surface here once retries exhaust. Raw provider error
//! text never crosses the caller boundary — the HTTP layer maps every
//! variant to a machine-readable code and a generic message.

use crate::provider::ProviderError;

/// Machine-readable error code for a missing or malformed request field.
pub const CODE_INVALID_REQUEST: &str = "INVALID_REQUEST";
/// Machine-readable error code for a missing pseudonymization secret.
pub const CODE_PII_SALT_MISSING: &str = "PII_SALT_MISSING";
/// Machine-readable error code for any other failure.
pub const CODE_INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Errors surfaced by the chat pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// A required request field is missing or empty (user-correctable).
    #[error("invalid request: {0}")]
    Validation(String),
    /// A required secret or setting is absent (operator-correctable, fatal).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The generation provider failed after the retry budget was spent,
    /// or failed with a non-retryable error.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Anything uncaught. Logged in full server-side, never detailed to
    /// the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// The machine-readable code externalized to callers.
    ///
    /// Distinct from any HTTP status: configuration errors must never be
    /// confused with user input mistakes.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => CODE_INVALID_REQUEST,
            Self::Configuration(_) => CODE_PII_SALT_MISSING,
            Self::Provider(_) | Self::Internal(_) => CODE_INTERNAL_ERROR,
        }
    }
}
