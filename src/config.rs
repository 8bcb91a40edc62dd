//! Configuration loading and management.
//!
//! Loads configuration from `./config.toml` (or `$HEALTHCHAT_CONFIG_PATH`).
//! Environment variables override file values; file values override
//! defaults. The pseudonymization salt and the provider API key are
//! secrets and normally arrive via the environment only.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::invoke::DEFAULT_MAX_RETRIES;
use crate::pipeline::DEFAULT_MAX_TOKENS;
use crate::provider::openai::OPENAI_API_BASE;

// ── Top-level config ────────────────────────────────────────────

/// Top-level service configuration loaded from TOML.
///
/// Precedence: env vars > config file > defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthChatConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Sanitizer settings.
    pub sanitize: SanitizeConfig,
    /// Generation provider settings.
    pub llm: LlmConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_owned(),
        }
    }
}

/// Sanitizer settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Pseudonymization salt. Required at request time; without it the
    /// service answers every chat request with a configuration error.
    pub pii_salt: Option<String>,
}

/// Generation provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI API key.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// API base URL (overridable for testing).
    pub base_url: String,
    /// Completion token budget per request.
    pub max_tokens: u32,
    /// Invocation attempt bound for rate-limit retry.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-5.1-chat-latest".to_owned(),
            base_url: OPENAI_API_BASE.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl HealthChatConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$HEALTHCHAT_CONFIG_PATH` or `./config.toml`.
    /// A missing file is not an error; defaults apply.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::config_path(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: HealthChatConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(HealthChatConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    fn config_path(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("HEALTHCHAT_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("HEALTHCHAT_ADDR") {
            self.server.addr = v;
        }
        if let Some(v) = env("HEALTHCHAT_PII_SALT") {
            self.sanitize.pii_salt = Some(v);
        }
        if let Some(v) = env("HEALTHCHAT_OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = env("HEALTHCHAT_OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = env("HEALTHCHAT_OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = env("HEALTHCHAT_MAX_TOKENS") {
            match v.parse() {
                Ok(n) => self.llm.max_tokens = n,
                Err(_) => tracing::warn!(
                    var = "HEALTHCHAT_MAX_TOKENS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("HEALTHCHAT_MAX_RETRIES") {
            match v.parse() {
                Ok(n) => self.llm.max_retries = n,
                Err(_) => tracing::warn!(
                    var = "HEALTHCHAT_MAX_RETRIES",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }
}
