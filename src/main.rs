#![allow(missing_docs)]

//! Healthchat service binary.
//!
//! `serve` runs the HTTP server over the chat pipeline; `check-config`
//! loads configuration and reports which secrets are present without
//! starting anything.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use healthchat::config::HealthChatConfig;
use healthchat::pipeline::ChatPipeline;
use healthchat::provider::openai::OpenAiProvider;
use healthchat::server::{self, AppState};

#[derive(Parser)]
#[command(name = "healthchat", about = "Privacy-safe health-advice chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Directory for rotating JSON logs; console-only when omitted.
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },
    /// Load configuration and report its state.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { logs_dir: None }) {
        Command::Serve { logs_dir } => serve(logs_dir).await,
        Command::CheckConfig => check_config(),
    }
}

async fn serve(logs_dir: Option<PathBuf>) -> Result<()> {
    // The guard must outlive the server for log flushing.
    let _logging_guard = match &logs_dir {
        Some(dir) => Some(healthchat::logging::init_production(dir)?),
        None => {
            healthchat::logging::init_cli();
            None
        }
    };

    let config = HealthChatConfig::load().context("failed to load configuration")?;

    let pipeline = build_pipeline(&config);
    if pipeline.is_none() {
        // Serve anyway: chat requests get a structured configuration
        // error code the operator can act on, and /health stays up.
        error!("pipeline not configured; chat requests will fail until secrets are set");
    }

    server::serve(
        &config.server.addr,
        AppState {
            pipeline: pipeline.map(Arc::new),
        },
    )
    .await
}

fn build_pipeline(config: &HealthChatConfig) -> Option<ChatPipeline> {
    let api_key = match &config.llm.api_key {
        Some(key) if !key.is_empty() => key.clone(),
        _ => {
            error!("HEALTHCHAT_OPENAI_API_KEY is not set");
            return None;
        }
    };

    let provider = Arc::new(OpenAiProvider::new(
        config.llm.model.clone(),
        api_key,
        config.llm.base_url.clone(),
    ));

    match ChatPipeline::new(
        config.sanitize.pii_salt.clone(),
        provider,
        config.llm.max_retries,
        config.llm.max_tokens,
    ) {
        Ok(pipeline) => {
            info!(model = %config.llm.model, "pipeline configured");
            Some(pipeline)
        }
        Err(e) => {
            error!(error = %e, "failed to build pipeline");
            None
        }
    }
}

fn check_config() -> Result<()> {
    healthchat::logging::init_cli();
    let config = HealthChatConfig::load().context("failed to load configuration")?;

    println!("addr:         {}", config.server.addr);
    println!("model:        {}", config.llm.model);
    println!("base_url:     {}", config.llm.base_url);
    println!("max_tokens:   {}", config.llm.max_tokens);
    println!("max_retries:  {}", config.llm.max_retries);
    println!(
        "pii_salt:     {}",
        if config.sanitize.pii_salt.as_deref().is_some_and(|s| !s.is_empty()) {
            "set"
        } else {
            "MISSING"
        }
    );
    println!(
        "api_key:      {}",
        if config.llm.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            "set"
        } else {
            "MISSING"
        }
    );
    Ok(())
}
