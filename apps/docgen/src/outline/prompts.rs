// LLM prompt templates for outline generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::outline::model::OutlineKind;

/// Skeleton prompt. Replace `{topic}`, `{kind}`, `{child_key}`,
/// `{constraints}` and `{json_only}` before sending.
pub const SKELETON_PROMPT_TEMPLATE: &str = r#"Create an outline for a {kind} about "{topic}".

Requirements:
1. Create 5-7 main sections in a logical order, from introduction to conclusion.
2. Each section covers one important aspect of the topic.
3. Sections may list their {child_key} already; leave the list empty if unsure.
{constraints}
Return a JSON object with this EXACT shape:
{
  "title": "Outline title",
  "sections": [
    {"title": "Section title", "{child_key}": [{"title": "Item title"}]}
  ]
}

{json_only}"#;

/// Per-section slide prompt. Replace `{topic}`, `{section}` and `{json_only}`.
pub const SLIDES_PROMPT_TEMPLATE: &str = r#"Create the slides for the section "{section}" of a presentation about "{topic}".

Requirements:
1. Create 3-5 slides.
2. Each slide has a title and a type.
3. The type is one of "content", "two_column" or "image_content".

Return a JSON array:
[
  {"title": "Slide title", "type": "content"}
]

{json_only}"#;

/// Per-section subsection prompt. Replace `{topic}`, `{section}` and `{json_only}`.
pub const SUBSECTIONS_PROMPT_TEMPLATE: &str = r#"Create the subsections for the chapter "{section}" of a document about "{topic}".

Requirements:
1. Create 3-5 subsections.
2. Each subsection has a concise title.

Return a JSON array:
[
  {"title": "Subsection title"}
]

{json_only}"#;

/// Section body prompt. Plain prose, no JSON. Replace `{topic}` and `{section}`.
pub const SECTION_CONTENT_PROMPT_TEMPLATE: &str = r#"Write the body text for the chapter "{section}" of a document about "{topic}".

Write two to four informative paragraphs of plain prose.
Do not repeat the chapter title and do not use markdown headings."#;

pub fn skeleton_prompt(
    topic: &str,
    kind: OutlineKind,
    additional_instructions: Option<&str>,
    max_units: Option<u32>,
) -> String {
    let child_key = match kind {
        OutlineKind::Presentation => "slides",
        OutlineKind::Document => "subsections",
    };

    let mut constraints = String::new();
    if let Some(max) = max_units {
        constraints.push_str(&format!(
            "4. The outline must contain at most {max} {}.\n",
            kind.budget_noun()
        ));
    }
    if let Some(extra) = additional_instructions.map(str::trim).filter(|s| !s.is_empty()) {
        constraints.push_str(&format!("\nAdditional instructions: {extra}\n"));
    }

    fill(
        SKELETON_PROMPT_TEMPLATE,
        &[
            ("kind", &kind.to_string()),
            ("child_key", child_key),
            ("constraints", &constraints),
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("topic", topic.trim()),
        ],
    )
}

pub fn section_detail_prompt(topic: &str, section: &str, kind: OutlineKind) -> String {
    let template = match kind {
        OutlineKind::Presentation => SLIDES_PROMPT_TEMPLATE,
        OutlineKind::Document => SUBSECTIONS_PROMPT_TEMPLATE,
    };
    fill(
        template,
        &[
            ("section", section),
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("topic", topic.trim()),
        ],
    )
}

pub fn section_content_prompt(topic: &str, section: &str) -> String {
    fill(SECTION_CONTENT_PROMPT_TEMPLATE, &[("section", section), ("topic", topic.trim())])
}

/// Substitutes `{name}` placeholders in one pass over the template. Inserted
/// text is never scanned again, and unknown braces are copied as is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = values.iter().find_map(|&(name, value)| {
            let tail = after.strip_prefix(name)?.strip_prefix('}')?;
            Some((value, tail))
        });
        match hit {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_prompt_states_budget_and_instructions() {
        let prompt = skeleton_prompt("Rust", OutlineKind::Presentation, Some(" for beginners "), Some(8));
        assert!(prompt.contains(r#"presentation about "Rust""#));
        assert!(prompt.contains("at most 8 slides"));
        assert!(prompt.contains("Additional instructions: for beginners"));
        assert!(prompt.contains(r#""slides": [{"title": "Item title"}]"#));
        assert!(!prompt.contains("{topic}") && !prompt.contains("{constraints}"));
    }

    #[test]
    fn test_skeleton_prompt_without_constraints() {
        let prompt = skeleton_prompt("Rust", OutlineKind::Document, None, None);
        assert!(!prompt.contains("at most"));
        assert!(prompt.contains("subsections"));
    }

    #[test]
    fn test_detail_prompt_depends_on_kind() {
        assert!(section_detail_prompt("Rust", "Ownership", OutlineKind::Presentation).contains("two_column"));
        assert!(section_detail_prompt("Rust", "Ownership", OutlineKind::Document).contains(r#"chapter "Ownership""#));
    }

    #[test]
    fn test_inserted_text_keeps_its_braces() {
        let prompt = section_detail_prompt("Rust", "Using {topic} and {json_only}", OutlineKind::Document);
        assert!(prompt.contains(r#"chapter "Using {topic} and {json_only}""#));
        assert_eq!(prompt.matches(JSON_ONLY_INSTRUCTION).count(), 1);

        let prompt = skeleton_prompt("Rust", OutlineKind::Presentation, Some("mention {section} literally"), None);
        assert!(prompt.contains("Additional instructions: mention {section} literally"));

        let content = section_content_prompt("{section}", "Intro");
        assert!(content.contains(r#"about "{section}""#));
    }
}
