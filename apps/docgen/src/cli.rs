//! Command-line surface.
//!
//! `outline` prints the outline JSON to stdout. `generate` runs the
//! background document task and prints each status change as a
//! `data: {...}` line. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures_util::{pin_mut, StreamExt};
use tracing::info;

use crate::generation::pipeline::spawn_document_task;
use crate::outline::{generate_outline, DocumentFormat, OutlineRequest, UserContent};
use crate::progress::{Monotonic, TracingProgress};
use crate::state::AppState;
use crate::tasks::TaskStatus;

#[derive(Parser, Debug)]
#[command(name = "docgen")]
#[command(version, about = "Outline-first presentation and document generation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an outline and print it as JSON
    Outline(OutlineArgs),

    /// Generate a document in the background and stream its status
    Generate {
        #[command(flatten)]
        args: OutlineArgs,

        /// Status poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        poll_ms: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    /// Document topic
    #[arg(short, long)]
    pub topic: String,

    /// Output format: ppt, word or pdf
    #[arg(short, long, default_value = "ppt")]
    pub format: DocumentFormat,

    /// Extra instructions passed to the model
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// Maximum slides (ppt) or sections (word/pdf)
    #[arg(short, long)]
    pub max_units: Option<u32>,

    /// JSON file with a list of {title, content, position} items
    #[arg(short, long)]
    pub user_content: Option<PathBuf>,

    /// Build the outline from the user content instead of the model
    #[arg(long)]
    pub from_user_content: bool,

    /// Ask the model for body text of document sections
    #[arg(long)]
    pub expand_content: bool,
}

impl OutlineArgs {
    pub fn into_request(self) -> Result<OutlineRequest> {
        let user_content = match &self.user_content {
            Some(path) => read_user_content(path)?,
            None => Vec::new(),
        };

        Ok(OutlineRequest {
            additional_instructions: self.instructions,
            max_units: self.max_units,
            user_content,
            outline_from_user_content: self.from_user_content,
            expand_content: self.expand_content,
            ..OutlineRequest::new(self.topic, self.format)
        })
    }
}

fn read_user_content(path: &Path) -> Result<Vec<UserContent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read user content file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("User content file {} is not a JSON list of items", path.display()))
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

pub async fn run(command: Command, state: AppState) -> Result<ExitCode> {
    match command {
        Command::Outline(args) => {
            let request = args.into_request()?;
            request.validate()?;

            let progress = Monotonic::new(TracingProgress);
            let outline = generate_outline(state.llm.as_ref(), &request, &progress).await;
            println!("{}", serde_json::to_string_pretty(&outline)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate { args, poll_ms } => {
            let request = args.into_request()?;
            let task = spawn_document_task(&state, request)?;
            info!(task_id = %task.id, "Watching document task");

            let updates = state.tasks.watch(task.id, Duration::from_millis(poll_ms.max(1)));
            pin_mut!(updates);

            let mut last_status = task.status;
            while let Some(update) = updates.next().await {
                println!("data: {}", serde_json::to_string(&update)?);
                last_status = update.status;
            }

            Ok(if last_status == TaskStatus::Completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
