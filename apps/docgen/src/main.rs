mod cli;
mod config;
mod errors;
mod generation;
mod llm_client;
mod outline;
mod progress;
mod state;
mod tasks;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;
use crate::errors::AppError;
use crate::generation::render::OutlineFileRenderer;
use crate::llm_client::LlmClient;
use crate::state::AppState;
use crate::tasks::TaskStore;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse arguments before touching the environment so --help always works
    let cli = Cli::parse();

    // Load configuration (fails on a missing API credential)
    let config = Config::from_env()?;

    // Initialize structured logging on stderr; stdout carries outline / status JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting docgen v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::from_config(&config).map_err(AppError::from)?;
    info!(provider = ?config.ai_provider, "LLM client ready (model: {})", llm.model());

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        tasks: TaskStore::new(),
        renderer: Arc::new(OutlineFileRenderer::new(config.output_dir.clone())),
        config,
    };

    cli::run(cli.command, state).await
}
