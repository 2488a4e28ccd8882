//! Outline data model: the title/section/slide tree handed to renderers.
//!
//! Presentation and document outlines are two variants of one entity. The
//! variant is fixed by `OutlineKind`, so a presentation section can only hold
//! slides and a document section can only hold subsections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Formats and kinds
// ────────────────────────────────────────────────────────────────────────────

/// Output file format requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Ppt,
    Word,
    Pdf,
}

impl DocumentFormat {
    pub fn kind(self) -> OutlineKind {
        match self {
            DocumentFormat::Ppt => OutlineKind::Presentation,
            DocumentFormat::Word | DocumentFormat::Pdf => OutlineKind::Document,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Ppt => "ppt",
            DocumentFormat::Word => "word",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppt" | "pptx" | "presentation" => Ok(DocumentFormat::Ppt),
            "word" | "docx" | "document" => Ok(DocumentFormat::Word),
            "pdf" => Ok(DocumentFormat::Pdf),
            other => Err(format!(
                "unsupported document type '{other}' (expected ppt, word or pdf)"
            )),
        }
    }
}

/// Shape of the outline tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineKind {
    Presentation,
    Document,
}

impl OutlineKind {
    /// Name of one leaf unit, used in prompts and logs.
    pub fn unit_noun(self) -> &'static str {
        match self {
            OutlineKind::Presentation => "slide",
            OutlineKind::Document => "subsection",
        }
    }

    /// Name of the unit that `max_units` counts.
    pub fn budget_noun(self) -> &'static str {
        match self {
            OutlineKind::Presentation => "slides",
            OutlineKind::Document => "sections",
        }
    }
}

impl fmt::Display for OutlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlineKind::Presentation => f.write_str("presentation"),
            OutlineKind::Document => f.write_str("document"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Slides and subsections
// ────────────────────────────────────────────────────────────────────────────

/// Slide layout. Parsed leniently: unknown labels become `Content`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    #[default]
    Content,
    TwoColumn,
    ImageContent,
}

impl SlideType {
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("two") || label.contains("column") {
            SlideType::TwoColumn
        } else if label.contains("image") || label.contains("picture") {
            SlideType::ImageContent
        } else {
            SlideType::Content
        }
    }
}

impl<'de> Deserialize<'de> for SlideType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(SlideType::from_label(&label))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub slide_type: SlideType,
    /// Only meaningful for slides built from user-supplied content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections and outline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSection {
    pub title: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutlineBody {
    Presentation { sections: Vec<PresentationSection> },
    Document { sections: Vec<DocumentSection> },
}

/// The structured outline. Section order is reading/slide order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    #[serde(flatten)]
    pub body: OutlineBody,
}

/// Fixed slides every presentation gets: title slide and closing slide.
pub const FIXED_PRESENTATION_SLIDES: usize = 2;

impl Outline {
    pub fn kind(&self) -> OutlineKind {
        match &self.body {
            OutlineBody::Presentation { .. } => OutlineKind::Presentation,
            OutlineBody::Document { .. } => OutlineKind::Document,
        }
    }

    pub fn section_count(&self) -> usize {
        match &self.body {
            OutlineBody::Presentation { sections } => sections.len(),
            OutlineBody::Document { sections } => sections.len(),
        }
    }

    pub fn section_titles(&self) -> Vec<&str> {
        match &self.body {
            OutlineBody::Presentation { sections } => {
                sections.iter().map(|s| s.title.as_str()).collect()
            }
            OutlineBody::Document { sections } => {
                sections.iter().map(|s| s.title.as_str()).collect()
            }
        }
    }

    /// Total slides or subsections across all sections.
    pub fn leaf_count(&self) -> usize {
        match &self.body {
            OutlineBody::Presentation { sections } => sections.iter().map(|s| s.slides.len()).sum(),
            OutlineBody::Document { sections } => {
                sections.iter().map(|s| s.subsections.len()).sum()
            }
        }
    }

    /// Units counted against `max_units`: for presentations the fixed title and
    /// closing slides, one title slide per section, and every content slide;
    /// for documents, the number of sections.
    pub fn rendered_units(&self) -> usize {
        match &self.body {
            OutlineBody::Presentation { sections } => presentation_units(sections),
            OutlineBody::Document { sections } => sections.len(),
        }
    }
}

pub fn presentation_units(sections: &[PresentationSection]) -> usize {
    FIXED_PRESENTATION_SLIDES
        + sections.len()
        + sections.iter().map(|s| s.slides.len()).sum::<usize>()
}

// ────────────────────────────────────────────────────────────────────────────
// Drafts: loosely-typed trees produced by the repair tiers
// ────────────────────────────────────────────────────────────────────────────

/// A leaf unit before it is committed to a slide or a subsection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftUnit {
    pub title: String,
    pub content: Option<String>,
    pub slide_type: Option<SlideType>,
    pub position: Option<u32>,
}

impl DraftUnit {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftSection {
    pub title: String,
    pub content: Option<String>,
    /// `None` when the source named no child list at all; such sections are
    /// still to be detailed. An explicit empty list stays empty.
    pub units: Option<Vec<DraftUnit>>,
}

impl DraftSection {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn units(&self) -> &[DraftUnit] {
        self.units.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftOutline {
    pub title: Option<String>,
    pub sections: Vec<DraftSection>,
}

impl DraftOutline {
    /// Commits the draft to a typed outline of the given kind.
    /// The title falls back to the topic when the draft has none.
    pub fn into_outline(self, topic: &str, kind: OutlineKind) -> Outline {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| topic.trim().to_string());

        let body = match kind {
            OutlineKind::Presentation => OutlineBody::Presentation {
                sections: self
                    .sections
                    .into_iter()
                    .map(|s| PresentationSection {
                        title: s.title,
                        slides: s
                            .units
                            .unwrap_or_default()
                            .into_iter()
                            .map(|u| Slide {
                                title: u.title,
                                content: u.content,
                                slide_type: u.slide_type.unwrap_or_default(),
                                position: u.position,
                            })
                            .collect(),
                    })
                    .collect(),
            },
            OutlineKind::Document => OutlineBody::Document {
                sections: self
                    .sections
                    .into_iter()
                    .map(|s| DocumentSection {
                        title: s.title,
                        content: s.content,
                        subsections: s
                            .units
                            .unwrap_or_default()
                            .into_iter()
                            .map(|u| Subsection {
                                title: u.title,
                                content: u.content,
                                position: u.position,
                            })
                            .collect(),
                    })
                    .collect(),
            },
        };

        Outline { title, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_maps_to_kind() {
        assert_eq!(DocumentFormat::Ppt.kind(), OutlineKind::Presentation);
        assert_eq!(DocumentFormat::Word.kind(), OutlineKind::Document);
        assert_eq!(DocumentFormat::Pdf.kind(), OutlineKind::Document);
    }

    #[test]
    fn test_format_parses_aliases() {
        assert_eq!("PPTX".parse::<DocumentFormat>().unwrap(), DocumentFormat::Ppt);
        assert_eq!("docx".parse::<DocumentFormat>().unwrap(), DocumentFormat::Word);
        assert!("xls".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn test_slide_type_labels_are_lenient() {
        assert_eq!(SlideType::from_label("two_column"), SlideType::TwoColumn);
        assert_eq!(SlideType::from_label("Two Columns"), SlideType::TwoColumn);
        assert_eq!(SlideType::from_label("image_content"), SlideType::ImageContent);
        assert_eq!(SlideType::from_label("bullets"), SlideType::Content);

        let slide: Slide = serde_json::from_str(r#"{"title": "X", "type": "picture"}"#).unwrap();
        assert_eq!(slide.slide_type, SlideType::ImageContent);
    }

    #[test]
    fn test_outline_serializes_with_kind_discriminator() {
        let outline = Outline {
            title: "Rust".into(),
            body: OutlineBody::Presentation {
                sections: vec![PresentationSection {
                    title: "Intro".into(),
                    slides: vec![Slide {
                        title: "Why Rust".into(),
                        content: None,
                        slide_type: SlideType::TwoColumn,
                        position: None,
                    }],
                }],
            },
        };

        let value = serde_json::to_value(&outline).unwrap();
        assert_eq!(value["kind"], "presentation");
        assert_eq!(value["sections"][0]["slides"][0]["type"], "two_column");
        assert!(value["sections"][0]["slides"][0].get("content").is_none());

        let back: Outline = serde_json::from_value(value).unwrap();
        assert_eq!(back, outline);
    }

    #[test]
    fn test_rendered_units_counts_fixed_and_section_slides() {
        let outline = DraftOutline {
            title: None,
            sections: vec![
                DraftSection {
                    title: "A".into(),
                    content: None,
                    units: Some(vec![DraftUnit::titled("a1"), DraftUnit::titled("a2")]),
                },
                DraftSection::titled("B"),
            ],
        };

        let ppt = outline.clone().into_outline("Topic", OutlineKind::Presentation);
        assert_eq!(ppt.rendered_units(), 2 + 2 + 2);

        let doc = outline.into_outline("Topic", OutlineKind::Document);
        assert_eq!(doc.rendered_units(), 2);
        assert_eq!(doc.leaf_count(), 2);
    }

    #[test]
    fn test_draft_title_falls_back_to_topic() {
        let draft = DraftOutline {
            title: Some("   ".into()),
            sections: vec![DraftSection::titled("Only")],
        };
        let outline = draft.into_outline(" Quantum Computing ", OutlineKind::Document);
        assert_eq!(outline.title, "Quantum Computing");
        assert_eq!(outline.section_titles(), vec!["Only"]);
    }
}
