//! End-to-end pipeline tests with a stub provider.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use healthchat::error::ChatError;
use healthchat::pipeline::{ChatPipeline, DISCLAIMER};
use healthchat::provider::{
    GenerationOutput, GenerationProvider, GenerationRequest, ProviderError, UsageStats,
};
use healthchat::types::{ChatRequest, Message, Role};

/// Returns a fixed answer and records the prompt it was given.
struct StubProvider {
    answer: String,
    calls: AtomicU32,
    last_messages: Mutex<Vec<Message>>,
}

impl StubProvider {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_owned(),
            calls: AtomicU32::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .expect("lock is never poisoned")
            .clone()
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_messages
            .lock()
            .expect("lock is never poisoned") = request.messages.clone();
        Ok(GenerationOutput {
            text: self.answer.clone(),
            usage: UsageStats {
                prompt_tokens: 100,
                completion_tokens: 50,
            },
            model: "stub".to_owned(),
        })
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

fn pipeline_with(provider: Arc<StubProvider>) -> ChatPipeline {
    ChatPipeline::new(Some("e2e-salt".to_owned()), provider, 3, 2500)
        .expect("salt is configured")
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        user_identity: "u1".to_owned(),
        message: message.to_owned(),
        topic: "general_health".to_owned(),
        conversation_history: Vec::new(),
        blood_data: None,
        vital_data: None,
        gene_data: None,
    }
}

#[tokio::test]
async fn reply_carries_chunks_raw_text_and_disclaimer() {
    let provider = Arc::new(StubProvider::new(
        "【セクション1: あなたの分析】\n分析です。---【セクション2: データ分析】\nデータです。",
    ));
    let pipeline = pipeline_with(provider.clone());

    let reply = pipeline
        .handle(&request("おすすめの朝食は？"))
        .await
        .expect("pipeline succeeds");

    assert_eq!(reply.chunks, vec!["分析です。", "データです。"]);
    assert!(reply.raw_text.contains("セクション1"));
    assert!(reply.chunked);
    assert_eq!(reply.disclaimer, DISCLAIMER);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn outbound_prompt_contains_no_pii() {
    let provider = Arc::new(StubProvider::new("回答"));
    let pipeline = pipeline_with(provider.clone());

    let mut req = request("rs123 says I'm at risk, email me at a@b.com, call 090-1234-5678");
    req.conversation_history = vec![Message::user("my id is u1, born 1990-04-01")];

    pipeline.handle(&req).await.expect("pipeline succeeds");

    let messages = provider.seen_messages();
    assert!(messages.len() >= 3);
    assert_eq!(messages.first().map(|m| m.role), Some(Role::System));
    assert_eq!(messages.last().map(|m| m.role), Some(Role::User));

    let joined: String = messages
        .iter()
        .skip(1) // the static instruction text is not user data
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    for leaked in ["rs123", "a@b.com", "090-1234-5678", "1990-04-01"] {
        assert!(!joined.contains(leaked), "PII leaked: {leaked}");
    }
    for placeholder in ["[SNP]", "[EMAIL]", "[PHONE]", "[DATE]"] {
        assert!(joined.contains(placeholder), "missing {placeholder}");
    }
}

#[tokio::test]
async fn validation_short_circuits_before_any_provider_call() {
    let provider = Arc::new(StubProvider::new("回答"));
    let pipeline = pipeline_with(provider.clone());

    let result = pipeline.handle(&request("   ")).await;
    assert!(matches!(result, Err(ChatError::Validation(_))));
    assert_eq!(provider.calls(), 0, "no network call for invalid input");

    let mut req = request("hello");
    req.user_identity = String::new();
    let result = pipeline.handle(&req).await;
    assert!(matches!(result, Err(ChatError::Validation(_))));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn missing_salt_is_a_configuration_error_before_any_call() {
    let provider = Arc::new(StubProvider::new("回答"));
    let result = ChatPipeline::new(None, provider.clone(), 3, 2500);
    assert!(matches!(result, Err(ChatError::Configuration(_))));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn undelimited_answer_is_a_single_chunk() {
    let provider = Arc::new(StubProvider::new("  短い回答です。  "));
    let pipeline = pipeline_with(provider);

    let reply = pipeline
        .handle(&request("質問"))
        .await
        .expect("pipeline succeeds");
    assert_eq!(reply.chunks, vec!["短い回答です。"]);
    assert_eq!(reply.raw_text, "  短い回答です。  ");
}
