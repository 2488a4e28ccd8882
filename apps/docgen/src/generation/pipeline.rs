//! Background document pipeline: outline generation, then renderer hand-off,
//! with every step mirrored into the task record.

use std::path::PathBuf;

use anyhow::anyhow;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::render::file_stem_for;
use crate::outline::{generate_outline, OutlineRequest};
use crate::state::AppState;
use crate::tasks::{GenerationTask, TaskProgress};

/// Validates the request, records a queued task and starts one background
/// unit of work for it. Returns the queued snapshot.
pub fn spawn_document_task(state: &AppState, request: OutlineRequest) -> Result<GenerationTask, AppError> {
    request.validate()?;

    let task = GenerationTask::queued(request.topic.trim(), request.format);
    state.tasks.insert(task.clone());
    info!(task_id = %task.id, topic = %task.topic, format = %request.format, "Document task queued");

    let state = state.clone();
    let id = task.id;
    tokio::spawn(async move {
        if let Ok(path) = run_document_task(&state, id, &request).await {
            info!(task_id = %id, path = %path.display(), "Document task finished");
        }
    });

    Ok(task)
}

/// Runs the pipeline for an already-recorded task. Failures are written to
/// the record as well as returned; nothing is retried.
pub async fn run_document_task(
    state: &AppState,
    id: Uuid,
    request: &OutlineRequest,
) -> Result<PathBuf, AppError> {
    let result = execute(state, id, request).await;
    if let Err(e) = &result {
        error!(task_id = %id, error = %e, code = e.code(), "Document task failed");
        state.tasks.mark_failed(id, format!("Document generation failed: {e}"));
    }
    result
}

async fn execute(state: &AppState, id: Uuid, request: &OutlineRequest) -> Result<PathBuf, AppError> {
    if state.tasks.get(id).is_none() {
        return Err(AppError::NotFound(format!("task {id}")));
    }
    state.tasks.mark_processing(id, 0.05, "Preparing generation");
    info!(task_id = %id, topic = %request.topic, "[1/3] Generating outline");

    let progress = TaskProgress::new(state.tasks.clone(), id);
    let outline = generate_outline(state.llm.as_ref(), request, &progress).await;

    info!(task_id = %id, sections = ?outline.section_titles(), "[2/3] Rendering document");
    state.tasks.set_progress(id, 0.97, "Rendering document");
    let path = state
        .renderer
        .render(&outline, request.format, &file_stem_for(&request.topic, id))
        .await?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("rendered path {} has no file name", path.display()))?;
    let base = &state.config.public_base_url;
    let download_url = format!("{base}/downloads/{file_name}");
    let preview_url = format!("{base}/previews/{file_name}");

    info!(task_id = %id, %download_url, "[3/3] Document ready");
    state.tasks.mark_completed(id, download_url, preview_url);
    Ok(path)
}
