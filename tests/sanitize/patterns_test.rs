//! Free-text redaction pattern tests.

use healthchat::sanitize::Sanitizer;
use healthchat::types::{ChatRequest, Message, Role};

fn sanitizer() -> Sanitizer {
    Sanitizer::new(Some("integration-salt".to_owned())).expect("salt is set")
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

#[test]
fn email_is_replaced_with_placeholder() {
    let out = sanitizer().redact_text("reach me at alice.smith+health@example.co.jp please");
    assert_eq!(out, "reach me at [EMAIL] please");
}

#[test]
fn phone_shaped_digit_groups_are_replaced() {
    let out = sanitizer().redact_text("連絡先は 090-1234-5678 です");
    assert!(out.contains("[PHONE]"));
    assert!(!out.contains("090"));
}

#[test]
fn long_digit_identifiers_are_replaced() {
    let out = sanitizer().redact_text("my insurance id is 123-4567-8901");
    assert!(out.contains("[ID]"));
    assert!(!out.contains("4567"));
}

#[test]
fn date_shaped_tokens_are_replaced() {
    let out = sanitizer().redact_text("tested on 2024-01-15 and 2024/3/9");
    assert_eq!(out, "tested on [DATE] and [DATE]");
}

#[test]
fn snp_identifiers_are_replaced_case_insensitively() {
    let out = sanitizer().redact_text("rs762551 and RS1801133 both matter");
    assert_eq!(out, "[SNP] and [SNP] both matter");
}

#[test]
fn history_entries_are_redacted_with_roles_preserved() {
    let mut req = request("follow-up");
    req.conversation_history = vec![
        Message {
            role: Role::User,
            content: "my email is a@b.com".to_owned(),
        },
        Message {
            role: Role::Assistant,
            content: "rs123 relates to caffeine".to_owned(),
        },
    ];
    let sanitized = sanitizer().sanitize(&req);
    assert_eq!(sanitized.history.len(), 2);
    assert_eq!(sanitized.history[0].role, Role::User);
    assert_eq!(sanitized.history[0].content, "my email is [EMAIL]");
    assert_eq!(sanitized.history[1].role, Role::Assistant);
    assert_eq!(sanitized.history[1].content, "[SNP] relates to caffeine");
}

#[test]
fn scenario_snp_and_email_in_one_message() {
    let req = request("rs123 says I'm at risk, email me at a@b.com");
    let sanitized = sanitizer().sanitize(&req);
    assert!(sanitized.message.contains("[SNP]"));
    assert!(sanitized.message.contains("[EMAIL]"));
    assert!(!sanitized.message.contains("rs123"));
    assert!(!sanitized.message.contains("a@b.com"));
    assert!(sanitized.user_token.starts_with("user_"));
    assert!(!sanitized.user_token.contains("u1"));
}
