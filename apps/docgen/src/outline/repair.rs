//! Outline parser and repair: turns raw LLM text into a draft outline tree.
//!
//! Recovery strategies are an ordered list of pure `text -> Option<T>`
//! functions tried cheapest-first:
//!
//! 1. strict decode of the whole text
//! 2. decode from the first `{` / `[` onwards, through `repair_json` when
//!    the span does not decode as is
//! 3. line heuristics (enumerators, bullets, headings)
//!
//! followed by a canned default that always succeeds. Strict decode runs
//! first so well-formed structure is never replaced by a lossy heuristic.

use serde_json::{Map, Value};

use crate::outline::fallback::{canned_outline, canned_units};
use crate::outline::heuristics::{outline_from_lines, units_from_lines};
use crate::outline::model::{DraftOutline, DraftSection, DraftUnit, SlideType};

/// Which recovery strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Strict,
    Substring,
    LineHeuristic,
    Canned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub tier: ParseTier,
}

type Tier<T> = (ParseTier, fn(&str) -> Option<T>);

const OUTLINE_TIERS: [Tier<DraftOutline>; 3] = [
    (ParseTier::Strict, strict_outline),
    (ParseTier::Substring, substring_outline),
    (ParseTier::LineHeuristic, outline_from_lines),
];

const UNIT_TIERS: [Tier<Vec<DraftUnit>>; 3] = [
    (ParseTier::Strict, strict_units),
    (ParseTier::Substring, substring_units),
    (ParseTier::LineHeuristic, units_from_lines),
];

/// Child collections an LLM may use for a section's leaf units.
const CHILD_KEYS: [&str; 4] = ["slides", "subsections", "children", "units"];

const FENCE: &str = "```";

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Tries each tier in order and returns the first success.
fn run_tiers<T>(text: &str, tiers: &[Tier<T>]) -> Option<Parsed<T>> {
    tiers
        .iter()
        .find_map(|(tier, parse)| parse(text).map(|value| Parsed { value, tier: *tier }))
}

/// Parses a whole outline. Never fails: absent or unusable text yields the
/// canned skeleton for `topic`.
pub fn parse_outline(text: Option<&str>, topic: &str) -> Parsed<DraftOutline> {
    text.and_then(|t| run_tiers(t, &OUTLINE_TIERS))
        .unwrap_or_else(|| Parsed {
            value: canned_outline(topic),
            tier: ParseTier::Canned,
        })
}

/// Parses the leaf units of one section. Never returns an empty list.
pub fn parse_units(text: Option<&str>, section_title: &str) -> Parsed<Vec<DraftUnit>> {
    text.and_then(|t| run_tiers(t, &UNIT_TIERS))
        .unwrap_or_else(|| Parsed {
            value: canned_units(section_title),
            tier: ParseTier::Canned,
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 1: strict decode
// ────────────────────────────────────────────────────────────────────────────

/// Accepts only a top-level object whose `sections` is a non-empty list of
/// objects that each carry a title.
fn strict_outline(text: &str) -> Option<DraftOutline> {
    let value: Value = serde_json::from_str(strict_body(text)).ok()?;
    outline_from_object(&value)
}

fn strict_units(text: &str) -> Option<Vec<DraftUnit>> {
    let value: Value = serde_json::from_str(strict_body(text)).ok()?;
    units_from_value(&value)
}

/// The whole text, or the body of the code fence it is wrapped in.
fn strict_body(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with(FENCE) {
        fenced_body(text).unwrap_or(text)
    } else {
        text
    }
}

/// Body of the first Markdown code fence anywhere in the text. The fence may
/// follow a line of prose, and a truncated reply may never close it.
fn fenced_body(text: &str) -> Option<&str> {
    let opened = &text[text.find(FENCE)? + FENCE.len()..];
    let body = &opened[opened.find('\n')? + 1..];
    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };
    Some(body.trim())
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 2: substring extraction
// ────────────────────────────────────────────────────────────────────────────

fn substring_outline(text: &str) -> Option<DraftOutline> {
    decode_spans(text, |value| {
        outline_from_object(value).or_else(|| sections_from_array(value))
    })
}

fn substring_units(text: &str) -> Option<Vec<DraftUnit>> {
    decode_spans(text, units_from_value)
}

/// Candidate spans run from the first `{` and the first `[` to the end of the
/// text, ordered by where they start. A fenced body is searched before the
/// surrounding text.
fn candidate_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    for scope in fenced_body(text).into_iter().chain([text]) {
        let mut starts: Vec<usize> = ['{', '['].iter().filter_map(|&open| scope.find(open)).collect();
        starts.sort_unstable();
        spans.extend(starts.into_iter().map(|start| &scope[start..]));
    }
    spans
}

fn decode_spans<T>(text: &str, accept: impl Fn(&Value) -> Option<T>) -> Option<T> {
    candidate_spans(text).into_iter().find_map(|span| {
        let direct = serde_json::from_str::<Value>(span).ok();
        let value = direct.or_else(|| serde_json::from_str::<Value>(&repair_json(span)).ok())?;
        accept(&value)
    })
}

/// Fixes the common LLM JSON slips outside string literals: typographic quote
/// delimiters, trailing commas, text after the value, and a reply cut off
/// mid-value. String contents are copied through untouched.
///
/// A cut-off reply is closed at the last complete element, so partial keys
/// and values are dropped. Returns the closed-off text as is when no cut
/// decodes.
pub fn repair_json(text: &str) -> String {
    let start = text.find(|c: char| c == '{' || c == '[').unwrap_or(text.len());
    let scan = JsonScan::run(&text[start..]);

    if scan.is_complete() && serde_json::from_str::<Value>(&scan.out).is_ok() {
        return scan.out;
    }
    scan.cuts
        .iter()
        .rev()
        .map(|cut| format!("{}{}", &scan.out[..cut.len], cut.closers))
        .find(|candidate| serde_json::from_str::<Value>(candidate).is_ok())
        .unwrap_or_else(|| scan.closed_off())
}

/// A point between complete elements where the output can be closed off.
struct Cut {
    len: usize,
    closers: String,
}

/// Single pass over JSON-ish text that tracks strings and open brackets.
#[derive(Default)]
struct JsonScan {
    out: String,
    /// Closers owed for the open brackets, innermost last.
    open: Vec<char>,
    in_string: bool,
    /// The open string started with a typographic quote.
    smart_string: bool,
    escaped: bool,
    cuts: Vec<Cut>,
}

impl JsonScan {
    fn run(text: &str) -> Self {
        let mut scan = Self::default();
        for c in text.chars() {
            if scan.in_string {
                scan.string_char(c);
            } else {
                scan.structural_char(c);
            }
        }
        scan
    }

    fn string_char(&mut self, c: char) {
        if self.escaped {
            self.escaped = false;
            self.out.push(c);
            return;
        }
        match c {
            '\\' => {
                self.escaped = true;
                self.out.push(c);
            }
            '"' => {
                self.in_string = false;
                self.out.push('"');
            }
            '\u{201C}' | '\u{201D}' if self.smart_string => {
                self.in_string = false;
                self.out.push('"');
            }
            _ => self.out.push(c),
        }
    }

    fn structural_char(&mut self, c: char) {
        match c {
            '"' | '\u{201C}' | '\u{201D}' => {
                self.in_string = true;
                self.smart_string = c != '"';
                self.out.push('"');
            }
            '{' => {
                self.open.push('}');
                self.out.push(c);
            }
            '[' => {
                self.open.push(']');
                self.out.push(c);
            }
            '}' | ']' => {
                let kept = self.out.trim_end().len();
                if self.out[..kept].ends_with(',') {
                    self.out.truncate(kept - 1);
                }
                if self.open.last() == Some(&c) {
                    self.open.pop();
                }
                self.out.push(c);
                self.mark_cut();
            }
            ',' => {
                if !self.open.is_empty() {
                    self.mark_cut();
                }
                self.out.push(c);
            }
            _ => self.out.push(c),
        }
    }

    fn mark_cut(&mut self) {
        self.cuts.push(Cut {
            len: self.out.len(),
            closers: self.open.iter().rev().collect(),
        });
    }

    fn is_complete(&self) -> bool {
        !self.in_string && self.open.is_empty()
    }

    /// The output with any open string and brackets closed.
    fn closed_off(&self) -> String {
        let mut out = self.out.clone();
        if self.in_string {
            if self.escaped {
                out.pop();
            }
            out.push('"');
        }
        out.extend(self.open.iter().rev());
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Value → draft conversion
// ────────────────────────────────────────────────────────────────────────────

fn non_blank_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn outline_from_object(value: &Value) -> Option<DraftOutline> {
    let object = value.as_object()?;
    let sections = sections_from_list(object.get("sections")?)?;
    Some(DraftOutline {
        title: non_blank_str(object, "title").map(str::to_string),
        sections,
    })
}

/// A bare list of section objects, the shape many models fall back to.
fn sections_from_array(value: &Value) -> Option<DraftOutline> {
    Some(DraftOutline {
        title: None,
        sections: sections_from_list(value)?,
    })
}

/// Every element must be an object with a non-blank title.
fn sections_from_list(value: &Value) -> Option<Vec<DraftSection>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| {
            let object = item.as_object()?;
            let title = non_blank_str(object, "title")?;
            let units = CHILD_KEYS
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_array))
                .map(|children| children.iter().filter_map(unit_from_value).collect());
            Some(DraftSection {
                title: title.to_string(),
                content: content_of(object),
                units,
            })
        })
        .collect()
}

/// Accepts a list of unit objects (or plain title strings), or an object
/// wrapping such a list under a child key.
fn units_from_value(value: &Value) -> Option<Vec<DraftUnit>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => CHILD_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };
    if items.is_empty() {
        return None;
    }
    items.iter().map(unit_from_value).collect()
}

fn unit_from_value(value: &Value) -> Option<DraftUnit> {
    match value {
        Value::String(title) => {
            let title = title.trim();
            (!title.is_empty()).then(|| DraftUnit::titled(title))
        }
        Value::Object(object) => {
            let title = non_blank_str(object, "title")?;
            Some(DraftUnit {
                title: title.to_string(),
                content: content_of(object),
                slide_type: non_blank_str(object, "type").map(SlideType::from_label),
                position: object
                    .get("position")
                    .and_then(Value::as_u64)
                    .and_then(|p| u32::try_from(p).ok()),
            })
        }
        _ => None,
    }
}

/// `content` as text, or a list of points joined one per line.
fn content_of(object: &Map<String, Value>) -> Option<String> {
    if let Some(text) = non_blank_str(object, "content") {
        return Some(text.to_string());
    }
    ["points", "bullets", "content"].iter().find_map(|key| {
        let points: Vec<&str> = object
            .get(*key)?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!points.is_empty()).then(|| points.join("\n"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT_OUTLINE: &str = r#"{
        "title": "Rust in Production",
        "sections": [
            {"title": "Introduction", "slides": [{"title": "Why Rust", "type": "content"}]},
            {"title": "Adoption", "slides": [{"title": "Case Studies", "type": "two_column"}]}
        ]
    }"#;

    #[test]
    fn test_strict_tier_accepts_well_formed_outline() {
        let parsed = parse_outline(Some(STRICT_OUTLINE), "Rust");
        assert_eq!(parsed.tier, ParseTier::Strict);
        assert_eq!(parsed.value.title.as_deref(), Some("Rust in Production"));
        assert_eq!(parsed.value.sections.len(), 2);
        assert_eq!(
            parsed.value.sections[1].units()[0].slide_type,
            Some(SlideType::TwoColumn)
        );
    }

    #[test]
    fn test_strict_tier_tolerates_code_fences() {
        let fenced = format!("```json\n{STRICT_OUTLINE}\n```");
        assert_eq!(parse_outline(Some(&fenced), "Rust").tier, ParseTier::Strict);
    }

    #[test]
    fn test_strict_tier_rejects_section_without_title() {
        let text = r#"{"sections": [{"title": "A"}, {"heading": "B"}]}"#;
        assert!(strict_outline(text).is_none());
    }

    #[test]
    fn test_substring_tier_extracts_embedded_object() {
        let text = format!("Sure! Here is the outline you asked for:\n{STRICT_OUTLINE}\nHope it helps.");
        let parsed = parse_outline(Some(&text), "Rust");
        assert_eq!(parsed.tier, ParseTier::Substring);
        assert_eq!(parsed.value.sections[0].title, "Introduction");
    }

    #[test]
    fn test_substring_tier_accepts_bare_section_list() {
        let text = r#"Outline: [{"title": "Basics"}, {"title": "Advanced"}] done"#;
        let parsed = parse_outline(Some(text), "Rust");
        assert_eq!(parsed.tier, ParseTier::Substring);
        assert_eq!(parsed.value.title, None);
        assert_eq!(parsed.value.sections.len(), 2);
    }

    #[test]
    fn test_substring_tier_repairs_trailing_commas_and_smart_quotes() {
        let text = "Result:\n{\u{201C}sections\u{201D}: [{\"title\": \"One\",}, {\"title\": \"Two\"},],}";
        let parsed = parse_outline(Some(text), "Rust");
        assert_eq!(parsed.tier, ParseTier::Substring);
        assert_eq!(parsed.value.sections.len(), 2);
    }

    #[test]
    fn test_line_tier_used_for_plain_text() {
        let text = "1. Introduction\n2. Ownership\n3. Conclusion";
        let parsed = parse_outline(Some(text), "Rust");
        assert_eq!(parsed.tier, ParseTier::LineHeuristic);
        assert_eq!(parsed.value.sections.len(), 3);
    }

    #[test]
    fn test_canned_tier_for_empty_or_absent_text() {
        assert_eq!(parse_outline(Some(""), "Rust").tier, ParseTier::Canned);
        assert_eq!(parse_outline(None, "Rust").tier, ParseTier::Canned);
        assert_eq!(parse_outline(Some("{ not json"), "Rust").tier, ParseTier::Canned);
        assert!(!parse_outline(None, "Rust").value.sections.is_empty());
    }

    #[test]
    fn test_units_accept_strings_points_and_wrapped_lists() {
        let parsed = parse_units(Some(r#"["Overview", "Details"]"#), "S");
        assert_eq!(parsed.tier, ParseTier::Strict);
        assert_eq!(parsed.value.len(), 2);

        let wrapped = r#"{"slides": [{"title": "A", "points": ["x", "y"], "type": "image"}]}"#;
        let parsed = parse_units(Some(wrapped), "S");
        assert_eq!(parsed.value[0].content.as_deref(), Some("x\ny"));
        assert_eq!(parsed.value[0].slide_type, Some(SlideType::ImageContent));
    }

    #[test]
    fn test_units_fall_back_to_canned_per_section() {
        let parsed = parse_units(Some("   "), "Ownership");
        assert_eq!(parsed.tier, ParseTier::Canned);
        assert!(parsed.value.iter().all(|u| u.title.contains("Ownership")));
    }

    #[test]
    fn test_strict_tier_tolerates_code_fences_after_prose() {
        let text = format!("Here is the outline:\n```json\n{STRICT_OUTLINE}\n```\nEnjoy!");
        let parsed = parse_outline(Some(&text), "Rust");
        assert_eq!(parsed.tier, ParseTier::Substring);
        assert_eq!(parsed.value.sections.len(), 2);
        assert_eq!(fenced_body("```\n[1]\n```"), Some("[1]"));
        assert_eq!(fenced_body("no fence here"), None);
    }

    #[test]
    fn test_explicit_empty_child_list_is_kept() {
        let text = r#"{"sections": [{"title": "A", "subsections": []}, {"title": "B"}]}"#;
        let parsed = parse_outline(Some(text), "Rust");
        assert_eq!(parsed.value.sections[0].units, Some(Vec::new()));
        assert_eq!(parsed.value.sections[1].units, None);
    }

    #[test]
    fn test_truncated_skeleton_keeps_complete_sections() {
        let text = r#"{"title": "Rust", "sections": [
            {"title": "Introduction", "slides": [{"title": "Why Rust"}]},
            {"title": "Ownership", "slides": [{"title": "Borrowing"}, {"title": "Lifetimes"}]},
            {"title": "Cargo", "ty"#;
        let parsed = parse_outline(Some(text), "Rust");
        assert_eq!(parsed.tier, ParseTier::Substring);
        let titles: Vec<&str> = parsed.value.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Introduction", "Ownership", "Cargo"]);
        assert_eq!(parsed.value.sections[1].units().len(), 2);
    }

    #[test]
    fn test_truncation_inside_a_string_drops_the_partial_element() {
        let text = r#"{"sections": [{"title": "Basics"}, {"title": "Advan"#;
        let value: Value = serde_json::from_str(&repair_json(text)).unwrap();
        assert_eq!(value["sections"].as_array().unwrap().len(), 1);
        assert_eq!(value["sections"][0]["title"], "Basics");
    }

    #[test]
    fn test_truncated_unit_list_is_recovered() {
        let parsed = parse_units(Some(r#"[{"title": "Overview"}, {"title": "Details", "type": "two_col"#), "S");
        assert_eq!(parsed.tier, ParseTier::Substring);
        let titles: Vec<&str> = parsed.value.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["Overview", "Details"]);
        assert_eq!(parsed.value[1].slide_type, None);
    }

    #[test]
    fn test_repair_leaves_string_contents_alone() {
        let text = r#"{"sections": [{"title": "Lists, ]", "content": "a, } \"b,]\" ‘c’"},]}"#;
        let parsed = parse_outline(Some(text), "Rust");
        assert_eq!(parsed.tier, ParseTier::Substring);
        assert_eq!(parsed.value.sections[0].title, "Lists, ]");
        assert_eq!(parsed.value.sections[0].content.as_deref(), Some("a, } \"b,]\" ‘c’"));
    }

    #[test]
    fn test_repair_drops_prose_after_the_value() {
        let repaired = repair_json(r#"{"a": [1, 2,],} and that is all, "really"."#);
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["a"][1], 2);
    }
}
