//! OpenAI provider implementation using the `/v1/chat/completions` API.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Message;

use super::{
    check_http_response, GenerationOutput, GenerationProvider, GenerationRequest, ProviderError,
    UsageStats,
};

/// Default completions endpoint, overridable for testing.
pub const OPENAI_API_BASE: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// OpenAI chat completions API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OpenAiMessage>,
    /// Maximum completion tokens.
    pub max_completion_tokens: u32,
}

/// A message in OpenAI chat format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiMessage {
    /// Role (`system`, `user`, `assistant`).
    pub role: String,
    /// Plain text content.
    pub content: String,
}

/// OpenAI chat completions API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiResponse {
    /// Response choices.
    pub choices: Vec<OpenAiChoice>,
    /// Model that served the response.
    #[serde(default)]
    pub model: String,
    /// Token usage.
    pub usage: Option<OpenAiUsage>,
}

/// A response choice from OpenAI.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    /// Assistant message for this choice.
    pub message: OpenAiResponseMessage,
}

/// Assistant message from OpenAI.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiResponseMessage {
    /// Optional text content.
    pub content: Option<String>,
}

/// OpenAI usage statistics.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiUsage {
    /// Prompt token count.
    pub prompt_tokens: Option<u32>,
    /// Completion token count.
    pub completion_tokens: Option<u32>,
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build an OpenAI API request from a generation request.
#[doc(hidden)]
pub fn build_request(model: &str, request: &GenerationRequest) -> OpenAiRequest {
    OpenAiRequest {
        model: model.to_owned(),
        messages: request.messages.iter().map(to_wire_message).collect(),
        max_completion_tokens: request.max_tokens,
    }
}

fn to_wire_message(message: &Message) -> OpenAiMessage {
    OpenAiMessage {
        role: message.role.as_str().to_owned(),
        content: message.content.clone(),
    }
}

/// Parse an OpenAI API response into a generation output.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized or
/// the first choice has no text content.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<GenerationOutput, ProviderError> {
    let resp: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("missing choices[0]".to_owned()))?;

    let text = choice
        .message
        .content
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ProviderError::Parse("choices[0] has no text content".to_owned()))?;

    let usage = UsageStats {
        prompt_tokens: resp
            .usage
            .as_ref()
            .and_then(|u| u.prompt_tokens)
            .unwrap_or(0),
        completion_tokens: resp
            .usage
            .as_ref()
            .and_then(|u| u.completion_tokens)
            .unwrap_or(0),
    };

    Ok(GenerationOutput {
        text,
        usage,
        model: resp.model,
    })
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// OpenAI chat completions API provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new provider instance for the given model.
    pub fn new(model: String, api_key: String, base_url: String) -> Self {
        Self {
            model,
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OpenAiProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, ProviderError> {
        let api_request = build_request(&self.model, request);
        let url = format!("{}{COMPLETIONS_PATH}", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        let output = parse_response(&payload)?;
        debug!(
            model = %output.model,
            prompt_tokens = output.usage.prompt_tokens,
            completion_tokens = output.usage.completion_tokens,
            "completion received"
        );
        Ok(output)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
