//! In-memory generation task records.
//!
//! Each record is written only by the pipeline that owns its id; readers may
//! observe any intermediate state. Records live for the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outline::DocumentFormat;
use crate::progress::ProgressReporter;

/// Minimum progress change that `watch` reports on its own.
const WATCH_PROGRESS_STEP: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub id: Uuid,
    pub status: TaskStatus,
    pub progress: f32,
    pub message: String,
    pub topic: String,
    pub doc_type: DocumentFormat,
    pub download_url: Option<String>,
    pub preview_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GenerationTask {
    pub fn queued(topic: impl Into<String>, doc_type: DocumentFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TaskStatus::Queued,
            progress: 0.0,
            message: "Queued".to_string(),
            topic: topic.into(),
            doc_type,
            download_url: None,
            preview_url: None,
            created_at: Utc::now(),
        }
    }
}

fn advance(task: &mut GenerationTask, fraction: f32, message: &str) {
    if task.status.is_terminal() {
        return;
    }
    task.progress = task.progress.max(fraction.clamp(0.0, 1.0));
    task.message = message.to_string();
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// Keyed task table, cheap to clone and shared between the spawner, the
/// pipeline and status readers.
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, GenerationTask>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Records are plain data, so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, GenerationTask>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, GenerationTask>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, task: GenerationTask) {
        self.write().insert(task.id, task);
    }

    pub fn get(&self, id: Uuid) -> Option<GenerationTask> {
        self.read().get(&id).cloned()
    }

    /// Applies `f` to the record. Returns false when the id is unknown.
    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut GenerationTask)) -> bool {
        match self.write().get_mut(&id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }

    /// Records progress. The stored value never decreases and terminal
    /// records are left alone.
    pub fn set_progress(&self, id: Uuid, fraction: f32, message: &str) {
        self.update(id, |task| advance(task, fraction, message));
    }

    pub fn mark_processing(&self, id: Uuid, fraction: f32, message: &str) {
        self.update(id, |task| {
            if !task.status.is_terminal() {
                task.status = TaskStatus::Processing;
                advance(task, fraction, message);
            }
        });
    }

    pub fn mark_completed(&self, id: Uuid, download_url: String, preview_url: String) {
        self.update(id, |task| {
            task.status = TaskStatus::Completed;
            task.progress = 1.0;
            task.message = "Document generated".to_string();
            task.download_url = Some(download_url);
            task.preview_url = Some(preview_url);
        });
    }

    /// Progress is kept where the run stopped.
    pub fn mark_failed(&self, id: Uuid, message: impl Into<String>) {
        let message = message.into();
        self.update(id, |task| {
            task.status = TaskStatus::Failed;
            task.message = message;
        });
    }

    /// Polls the record every `interval`. Yields the current record first,
    /// then every record whose status changed or whose progress moved by at
    /// least 0.01. Ends after a terminal record or when the id disappears.
    pub fn watch(&self, id: Uuid, interval: Duration) -> impl Stream<Item = GenerationTask> + Send {
        let store = self.clone();
        stream::unfold(Watch::Start, move |state| {
            let store = store.clone();
            async move {
                let (last_status, last_progress) = match state {
                    Watch::Done => return None,
                    Watch::Start => {
                        let task = store.get(id)?;
                        let next = Watch::after(&task);
                        return Some((task, next));
                    }
                    Watch::Polling { status, progress } => (status, progress),
                };

                loop {
                    tokio::time::sleep(interval).await;
                    let task = store.get(id)?;
                    let moved = (task.progress - last_progress).abs() >= WATCH_PROGRESS_STEP;
                    if task.status != last_status || moved {
                        let next = Watch::after(&task);
                        return Some((task, next));
                    }
                }
            }
        })
    }
}

/// Position of a `watch` stream.
enum Watch {
    Start,
    Polling { status: TaskStatus, progress: f32 },
    Done,
}

impl Watch {
    fn after(task: &GenerationTask) -> Self {
        if task.status.is_terminal() {
            Watch::Done
        } else {
            Watch::Polling {
                status: task.status,
                progress: task.progress,
            }
        }
    }
}

/// Progress reporter bound to one task record.
pub struct TaskProgress {
    store: TaskStore,
    id: Uuid,
}

impl TaskProgress {
    pub fn new(store: TaskStore, id: Uuid) -> Self {
        Self { store, id }
    }
}

impl ProgressReporter for TaskProgress {
    fn report(&self, fraction: f32, message: &str) {
        self.store.set_progress(self.id, fraction, message);
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn store_with_task() -> (TaskStore, Uuid) {
        let store = TaskStore::new();
        let task = GenerationTask::queued("Rust", DocumentFormat::Ppt);
        let id = task.id;
        store.insert(task);
        (store, id)
    }

    #[test]
    fn test_queued_record_defaults() {
        let (store, id) = store_with_task();
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.progress, 0.0);
        assert!(task.download_url.is_none());
    }

    #[test]
    fn test_progress_never_decreases() {
        let (store, id) = store_with_task();
        store.mark_processing(id, 0.05, "Preparing generation");
        store.set_progress(id, 0.4, "later");
        store.set_progress(id, 0.2, "earlier");
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.progress, 0.4);
        assert_eq!(task.message, "earlier");
    }

    #[test]
    fn test_terminal_records_ignore_progress() {
        let (store, id) = store_with_task();
        store.mark_completed(id, "d".into(), "p".into());
        store.set_progress(id, 0.5, "late report");
        store.mark_processing(id, 0.5, "late start");
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 1.0);
        assert_eq!(task.download_url.as_deref(), Some("d"));
    }

    #[test]
    fn test_unknown_id_is_not_updated() {
        let store = TaskStore::new();
        assert!(!store.update(Uuid::new_v4(), |t| t.progress = 1.0));
    }

    #[test]
    fn test_task_progress_reporter_writes_record() {
        let (store, id) = store_with_task();
        let reporter = TaskProgress::new(store.clone(), id);
        reporter.report(0.3, "Outline complete");
        assert_eq!(store.get(id).unwrap().message, "Outline complete");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let (store, id) = store_with_task();
        let json = serde_json::to_value(store.get(id).unwrap()).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["doc_type"], "ppt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_changes_until_terminal() {
        let (store, id) = store_with_task();
        let writer = store.clone();
        tokio::spawn(async move {
            let tick = Duration::from_millis(100);
            tokio::time::sleep(tick).await;
            writer.mark_processing(id, 0.05, "Preparing generation");
            tokio::time::sleep(tick).await;
            writer.set_progress(id, 0.055, "tiny step");
            tokio::time::sleep(tick).await;
            writer.set_progress(id, 0.5, "halfway");
            tokio::time::sleep(tick).await;
            writer.mark_completed(id, "d".into(), "p".into());
        });

        let seen: Vec<GenerationTask> = store.watch(id, Duration::from_millis(30)).collect().await;
        let states: Vec<(TaskStatus, f32)> = seen.iter().map(|t| (t.status, t.progress)).collect();
        assert_eq!(
            states,
            vec![
                (TaskStatus::Queued, 0.0),
                (TaskStatus::Processing, 0.05),
                (TaskStatus::Processing, 0.5),
                (TaskStatus::Completed, 1.0),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_unknown_id_is_empty() {
        let store = TaskStore::new();
        let seen: Vec<GenerationTask> = store.watch(Uuid::new_v4(), Duration::from_millis(10)).collect().await;
        assert!(seen.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_terminal_record_yields_once() {
        let (store, id) = store_with_task();
        store.mark_failed(id, "renderer exploded");
        let seen: Vec<GenerationTask> = store.watch(id, Duration::from_millis(10)).collect().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "renderer exploded");
    }
}
