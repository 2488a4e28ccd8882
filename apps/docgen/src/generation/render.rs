//! Renderer hand-off.
//!
//! Binary PPTX/DOCX/PDF encoding happens outside this crate. The shipped
//! renderer persists the outline as JSON next to where the document would
//! go, for an external builder to pick up.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::outline::{DocumentFormat, Outline};

/// Longest topic fragment kept in a file stem.
const MAX_STEM_TOPIC_CHARS: usize = 40;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Consumes an outline read-only and produces a file.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Returns the path of the written file.
    async fn render(
        &self,
        outline: &Outline,
        format: DocumentFormat,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError>;
}

/// Writes `<stem>.<format>.outline.json` into `output_dir`.
pub struct OutlineFileRenderer {
    output_dir: PathBuf,
}

impl OutlineFileRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for OutlineFileRenderer {
    async fn render(
        &self,
        outline: &Outline,
        format: DocumentFormat,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self
            .output_dir
            .join(format!("{file_stem}.{}.outline.json", format.as_str()));
        let body = serde_json::to_vec_pretty(outline)?;
        tokio::fs::write(&path, body).await?;

        info!(
            path = %path.display(),
            kind = %outline.kind(),
            sections = outline.section_count(),
            "Outline written"
        );
        Ok(path)
    }
}

/// File-system safe stem: the topic reduced to ASCII alphanumerics joined by
/// underscores, then the first eight hex digits of the task id.
pub fn file_stem_for(topic: &str, id: Uuid) -> String {
    let words: Vec<String> = topic
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let mut slug: String = words.join("_").chars().take(MAX_STEM_TOPIC_CHARS).collect();
    slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        slug.push_str("document");
    }

    let id = id.simple().to_string();
    format!("{slug}_{}", &id[..8])
}
