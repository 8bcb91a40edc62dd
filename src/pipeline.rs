//! The per-request pipeline: sanitize → build context → invoke → segment.
//!
//! Strictly sequential; each stage's output is the next stage's only
//! input. One pipeline instance is shared across requests and holds only
//! read-only configuration — retry state lives inside each invocation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::context::build_messages;
use crate::error::ChatError;
use crate::invoke::Invoker;
use crate::provider::{GenerationProvider, GenerationRequest};
use crate::sanitize::Sanitizer;
use crate::segment::segment;
use crate::types::{ChatReply, ChatRequest};

/// Fixed medical disclaimer appended to every reply.
pub const DISCLAIMER: &str = "この情報は参考情報です。医療的な判断は医師にご相談ください。";

/// Default token budget for one completion.
pub const DEFAULT_MAX_TOKENS: u32 = 2500;

/// The composed chat pipeline.
#[derive(Clone)]
pub struct ChatPipeline {
    sanitizer: Sanitizer,
    invoker: Invoker,
    max_tokens: u32,
}

impl ChatPipeline {
    /// Compose a pipeline over the given provider.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] when the pseudonymization
    /// salt is absent — the pipeline refuses to start unsalted.
    pub fn new(
        salt: Option<String>,
        provider: Arc<dyn GenerationProvider>,
        max_retries: u32,
        max_tokens: u32,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            sanitizer: Sanitizer::new(salt)?,
            invoker: Invoker::new(provider, max_retries),
            max_tokens,
        })
    }

    /// Handle one chat request end to end.
    ///
    /// # Errors
    ///
    /// - [`ChatError::Validation`] when identity or message is empty,
    ///   before any network call.
    /// - [`ChatError::Provider`] when generation fails fatally or the
    ///   retry budget is exhausted.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        validate(request)?;

        let sanitized = self.sanitizer.sanitize(request);
        debug!(
            user_token = %sanitized.user_token,
            history_len = sanitized.history.len(),
            has_blood = sanitized.blood_panel.is_some(),
            has_vitals = sanitized.vitals.is_some(),
            has_genes = sanitized.gene_data.is_some(),
            "request sanitized"
        );

        let messages = build_messages(&sanitized);
        debug!(message_count = messages.len(), "context built");

        let output = self
            .invoker
            .invoke(&GenerationRequest {
                messages,
                max_tokens: self.max_tokens,
            })
            .await?;

        let chunks = segment(&output.text);
        info!(
            user_token = %sanitized.user_token,
            chunk_count = chunks.len(),
            prompt_tokens = output.usage.prompt_tokens,
            completion_tokens = output.usage.completion_tokens,
            "reply generated"
        );

        Ok(ChatReply {
            raw_text: output.text,
            chunks,
            chunked: true,
            timestamp: Utc::now(),
            disclaimer: DISCLAIMER.to_owned(),
        })
    }
}

/// Reject requests missing required fields before any work happens.
fn validate(request: &ChatRequest) -> Result<(), ChatError> {
    if request.user_identity.trim().is_empty() || request.message.trim().is_empty() {
        return Err(ChatError::Validation(
            "userIdentity and message are required".to_owned(),
        ));
    }
    Ok(())
}
