//! Caller-supplied page/chapter content.
//!
//! Items either override the content of generated units whose title matches
//! exactly, or, when requested, become the outline themselves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::outline::model::{DraftOutline, DraftSection, DraftUnit, Outline, OutlineBody, OutlineKind, SlideType};

/// Title of the single section a presentation built from user content gets.
pub const USER_SECTION_TITLE: &str = "Main Content";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContent {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
}

impl UserContent {
    fn supplied_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Overwrites `content` on every slide, subsection or document section whose
/// title equals a supplied title. Matching is exact and case-sensitive; items
/// without content are ignored and a later duplicate title wins.
///
/// Returns the number of units overwritten.
pub fn apply_user_content(outline: &mut Outline, items: &[UserContent]) -> usize {
    let supplied: HashMap<&str, &str> = items
        .iter()
        .filter_map(|item| item.supplied_content().map(|c| (item.title.as_str(), c)))
        .collect();
    if supplied.is_empty() {
        return 0;
    }

    let mut replaced = 0;
    let mut apply = |title: &str, slot: &mut Option<String>| {
        if let Some(content) = supplied.get(title) {
            *slot = Some((*content).to_string());
            replaced += 1;
        }
    };

    match &mut outline.body {
        OutlineBody::Presentation { sections } => {
            for slide in sections.iter_mut().flat_map(|s| s.slides.iter_mut()) {
                apply(&slide.title, &mut slide.content);
            }
        }
        OutlineBody::Document { sections } => {
            for section in sections.iter_mut() {
                apply(&section.title, &mut section.content);
                for sub in section.subsections.iter_mut() {
                    apply(&sub.title, &mut sub.content);
                }
            }
        }
    }

    if replaced > 0 {
        info!(replaced, "Applied user-supplied content");
    }
    replaced
}

/// Builds a draft outline directly from the items, ordered by position with
/// unpositioned items last. Returns `None` when no item carries a title.
pub fn outline_from_user_content(kind: OutlineKind, items: &[UserContent]) -> Option<DraftOutline> {
    let mut ordered: Vec<&UserContent> = items.iter().filter(|i| !i.title.trim().is_empty()).collect();
    if ordered.is_empty() {
        return None;
    }
    ordered.sort_by_key(|i| (i.position.is_none(), i.position));

    let content_for = |item: &UserContent| {
        item.supplied_content()
            .map(str::to_string)
            .unwrap_or_else(|| format!("About {}", item.title.trim()))
    };

    let sections = match kind {
        OutlineKind::Presentation => vec![DraftSection {
            title: USER_SECTION_TITLE.to_string(),
            content: None,
            units: Some(
                ordered
                    .iter()
                    .map(|item| DraftUnit {
                        title: item.title.trim().to_string(),
                        content: Some(content_for(item)),
                        slide_type: Some(SlideType::Content),
                        position: item.position,
                    })
                    .collect(),
            ),
        }],
        OutlineKind::Document => ordered
            .iter()
            .map(|item| DraftSection {
                title: item.title.trim().to_string(),
                content: Some(content_for(item)),
                units: Some(Vec::new()),
            })
            .collect(),
    };

    Some(DraftOutline { title: None, sections })
}
