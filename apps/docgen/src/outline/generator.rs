//! Outline generator: skeleton, per-section detail, user content, budget.
//!
//! Never fails outward. Every completion may come back empty and every parse
//! may fall through to the canned tier; the result always has at least one
//! section and a non-empty title.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{CONTENT_SYSTEM, OUTLINE_SYSTEM};
use crate::llm_client::{CompletionBackend, CompletionRequest};
use crate::outline::budget::apply_budget;
use crate::outline::model::{DocumentFormat, DraftOutline, Outline, OutlineBody, OutlineKind};
use crate::outline::prompts::{section_content_prompt, section_detail_prompt, skeleton_prompt};
use crate::outline::repair::{parse_outline, parse_units, ParseTier};
use crate::outline::user_content::{apply_user_content, outline_from_user_content, UserContent};
use crate::progress::ProgressReporter;

/// Token budget for prose section bodies.
const CONTENT_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineRequest {
    pub topic: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub additional_instructions: Option<String>,
    /// Cap on rendered slides (presentations) or sections (documents).
    #[serde(default)]
    pub max_units: Option<u32>,
    #[serde(default)]
    pub user_content: Vec<UserContent>,
    /// Build the outline from `user_content` instead of asking the model.
    #[serde(default)]
    pub outline_from_user_content: bool,
    /// Ask the model for body text of document sections that have none.
    #[serde(default)]
    pub expand_content: bool,
}

impl OutlineRequest {
    pub fn new(topic: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            topic: topic.into(),
            format,
            additional_instructions: None,
            max_units: None,
            user_content: Vec::new(),
            outline_from_user_content: false,
            expand_content: false,
        }
    }

    pub fn kind(&self) -> OutlineKind {
        self.format.kind()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.topic.trim().is_empty() {
            return Err(AppError::Validation("topic cannot be empty".into()));
        }
        if self.max_units == Some(0) {
            return Err(AppError::Validation("max_units must be at least 1".into()));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Produces the outline for `request`, reporting progress at fixed checkpoints:
/// 0.1 after the skeleton, 0.3 once the structure is complete, then
/// `0.3 + 0.65 * i / n` before section `i`, and 0.95 when done.
pub async fn generate_outline(
    llm: &dyn CompletionBackend,
    request: &OutlineRequest,
    progress: &dyn ProgressReporter,
) -> Outline {
    let topic = request.topic.trim();
    let kind = request.kind();
    info!(topic, %kind, max_units = ?request.max_units, "Generating outline");

    let from_user = request
        .outline_from_user_content
        .then(|| outline_from_user_content(kind, &request.user_content))
        .flatten();

    let draft = match from_user {
        Some(draft) => {
            info!(items = request.user_content.len(), "Outline built from supplied content");
            progress.report(0.1, "Outline built from supplied content");
            draft
        }
        None => {
            let mut draft = generate_skeleton(llm, request).await;
            progress.report(0.1, "Outline skeleton generated");
            fill_section_details(llm, topic, kind, &mut draft, progress).await;
            draft
        }
    };

    let mut outline = draft.into_outline(topic, kind);
    progress.report(0.3, "Outline complete, filling in section content");

    apply_user_content(&mut outline, &request.user_content);
    fill_section_content(llm, topic, request.expand_content, &mut outline, progress).await;

    let outline = apply_budget(outline, request.max_units);
    info!(
        sections = outline.section_count(),
        leaves = outline.leaf_count(),
        units = outline.rendered_units(),
        "Outline ready"
    );
    progress.report(0.95, "Outline ready");
    outline
}

async fn generate_skeleton(llm: &dyn CompletionBackend, request: &OutlineRequest) -> DraftOutline {
    let prompt = skeleton_prompt(
        &request.topic,
        request.kind(),
        request.additional_instructions.as_deref(),
        request.max_units,
    );
    let text = llm.complete(&CompletionRequest::new(OUTLINE_SYSTEM, prompt)).await;

    let parsed = parse_outline(text.as_deref(), &request.topic);
    match parsed.tier {
        ParseTier::Strict => debug!("Skeleton decoded strictly"),
        ParseTier::Canned => warn!(topic = %request.topic, "No usable skeleton, using canned outline"),
        tier => info!(?tier, "Skeleton recovered by a lenient tier"),
    }
    parsed.value
}

/// Asks for the slides/subsections of every section that came back without a
/// child list. An explicit empty list is kept as is. Progress moves from 0.1 towards 0.3 as sections are detailed.
async fn fill_section_details(
    llm: &dyn CompletionBackend,
    topic: &str,
    kind: OutlineKind,
    draft: &mut DraftOutline,
    progress: &dyn ProgressReporter,
) {
    let total = draft.sections.len();
    for (i, section) in draft.sections.iter_mut().enumerate() {
        if section.units.is_some() {
            continue;
        }
        progress.report(
            0.1 + 0.2 * i as f32 / total as f32,
            &format!("Detailing section {}/{}: {}", i + 1, total, section.title),
        );

        let prompt = section_detail_prompt(topic, &section.title, kind);
        let text = llm.complete(&CompletionRequest::new(OUTLINE_SYSTEM, prompt)).await;
        let parsed = parse_units(text.as_deref(), &section.title);
        if parsed.tier == ParseTier::Canned {
            warn!(section = %section.title, "No usable {}s, using canned units", kind.unit_noun());
        }
        section.units = Some(parsed.value);
    }
}

/// Walks the sections in order, reporting per-section progress. Document
/// sections still lacking body text get one when `expand` is set.
async fn fill_section_content(
    llm: &dyn CompletionBackend,
    topic: &str,
    expand: bool,
    outline: &mut Outline,
    progress: &dyn ProgressReporter,
) {
    let total = outline.section_count();
    if total == 0 {
        return;
    }
    let step = |i: usize| 0.3 + 0.65 * i as f32 / total as f32;

    match &mut outline.body {
        OutlineBody::Presentation { sections } => {
            for (i, section) in sections.iter().enumerate() {
                progress.report(step(i), &format!("Preparing section {}/{}: {}", i + 1, total, section.title));
            }
        }
        OutlineBody::Document { sections } => {
            for (i, section) in sections.iter_mut().enumerate() {
                progress.report(step(i), &format!("Preparing section {}/{}: {}", i + 1, total, section.title));
                if !expand || section.content.is_some() {
                    continue;
                }
                let request = CompletionRequest::new(CONTENT_SYSTEM, section_content_prompt(topic, &section.title))
                    .with_max_tokens(CONTENT_MAX_TOKENS);
                match llm.complete(&request).await {
                    Some(text) if !text.trim().is_empty() => section.content = Some(text.trim().to_string()),
                    _ => warn!(section = %section.title, "No content generated for section"),
                }
            }
        }
    }
}
