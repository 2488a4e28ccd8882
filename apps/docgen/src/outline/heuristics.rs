//! Line heuristics: the last text-based recovery tier.
//!
//! Each line is classified as a marker (heading, keyword, number, dotted
//! number, bullet), a `title:` / `type:` directive, or plain text. The
//! shallowest marker style at the smallest indent opens sections; every other
//! marker becomes a child unit; plain text is supporting detail for the most
//! recent title.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::outline::model::{DraftOutline, DraftSection, DraftUnit, SlideType};

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^
        (?:
            (?P<hashes>\#{1,6})\s+
          | (?P<keyword>section|chapter|part|slide)\b
              (?:\s*(?:\d+|[ivxlc]+)\b\s*[:.)\-–]?|\s*[:\-–])\s*
          | (?P<dotted>\d+(?:\.\d+)+)\.?\s+
          | (?P<number>\d+)[.)]\s*
          | (?P<bullet>[-*•·+])\s+
        )
        (?P<title>\S.*)$",
    )
    .unwrap()
});

static TITLE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:[-*•]\s*)?(?:title|topic)\s*[:：]\s*(?P<value>\S.*)$").unwrap());

static TYPE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[-*•]\s*)?(?:type|layout)\s*[:：]\s*(?P<value>\S.*)$").unwrap()
});

static CONTENT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[-*•]\s*)?(?:content|description|summary)\s*[:：]\s*(?P<value>\S.*)$")
        .unwrap()
});

const TAB_WIDTH: usize = 4;

// ────────────────────────────────────────────────────────────────────────────
// Line classification
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum LineKind {
    /// `rank` orders marker styles from outermost (0) to innermost.
    Marker { rank: u8, heading: bool, title: String },
    Title(String),
    Type(SlideType),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    indent: usize,
    kind: LineKind,
}

impl Line {
    fn level(&self) -> Option<(usize, u8)> {
        match &self.kind {
            LineKind::Marker { rank, .. } => Some((self.indent, *rank)),
            _ => None,
        }
    }
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Strips emphasis, quotes and trailing colons from a candidate title.
fn clean_title(raw: &str) -> String {
    let mut title = raw.trim().trim_end_matches([':', '：']).trim();
    for wrapper in ["**", "__", "`", "\"", "'"] {
        if let Some(inner) = title
            .strip_prefix(wrapper)
            .and_then(|t| t.strip_suffix(wrapper))
        {
            title = inner.trim();
        }
    }
    title.trim_end_matches([':', '：']).trim().to_string()
}

/// Code fences and bare JSON punctuation carry no content.
fn is_noise(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.chars().all(|c| "{}[](),;".contains(c))
}

fn classify(raw: &str) -> Option<Line> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_noise(trimmed) {
        return None;
    }
    let indent = indent_of(raw);

    // Directives first: "- type: two_column" must not read as a bullet.
    if let Some(caps) = TYPE_DIRECTIVE.captures(trimmed) {
        return Some(Line {
            indent,
            kind: LineKind::Type(SlideType::from_label(&caps["value"])),
        });
    }
    if let Some(caps) = TITLE_DIRECTIVE.captures(trimmed) {
        let title = clean_title(&caps["value"]);
        return (!title.is_empty()).then_some(Line {
            indent,
            kind: LineKind::Title(title),
        });
    }
    if let Some(caps) = CONTENT_DIRECTIVE.captures(trimmed) {
        return Some(Line {
            indent,
            kind: LineKind::Text(caps["value"].trim().to_string()),
        });
    }

    if let Some(caps) = MARKER.captures(trimmed) {
        let title = clean_title(&caps["title"]);
        if title.is_empty() {
            return None;
        }
        let (rank, heading) = if let Some(hashes) = caps.name("hashes") {
            (hashes.as_str().len() as u8 - 1, true)
        } else if let Some(keyword) = caps.name("keyword") {
            if keyword.as_str().eq_ignore_ascii_case("slide") {
                (10, false)
            } else {
                (6, false)
            }
        } else if caps.name("number").is_some() {
            (7, false)
        } else if caps.name("dotted").is_some() {
            (8, false)
        } else {
            (11, false)
        };
        return Some(Line {
            indent,
            kind: LineKind::Marker {
                rank,
                heading,
                title,
            },
        });
    }

    Some(Line {
        indent,
        kind: LineKind::Text(trimmed.to_string()),
    })
}

fn append_detail(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outline extraction
// ────────────────────────────────────────────────────────────────────────────

/// Builds a section tree from enumerated / bulleted text.
/// Returns `None` when the text contains no recognisable titles.
pub fn outline_from_lines(text: &str) -> Option<DraftOutline> {
    let mut lines: Vec<Line> = text.lines().filter_map(classify).collect();

    let mut title = None;
    let mut top = lines.iter().filter_map(Line::level).min()?;

    // A lone outermost heading in front of everything else is the document title.
    let at_top: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.level() == Some(top))
        .map(|(i, _)| i)
        .collect();
    let first_marker = lines.iter().position(|l| l.level().is_some());
    if let [only] = at_top.as_slice() {
        let lone_heading = matches!(lines[*only].kind, LineKind::Marker { heading: true, .. });
        let more_markers = lines.iter().filter(|l| l.level().is_some()).count() > 1;
        if lone_heading && more_markers && first_marker == Some(*only) {
            if let LineKind::Marker { title: t, .. } = lines.remove(*only).kind {
                title = Some(t);
            }
            top = lines.iter().filter_map(Line::level).min()?;
        }
    }

    let mut sections: Vec<DraftSection> = Vec::new();
    for line in lines {
        let is_top = line.level() == Some(top);
        match line.kind {
            LineKind::Marker { title: t, .. } => {
                if is_top || sections.is_empty() {
                    sections.push(DraftSection::titled(t));
                } else if let Some(section) = sections.last_mut() {
                    section.units.get_or_insert_with(Vec::new).push(DraftUnit::titled(t));
                }
            }
            LineKind::Title(t) => {
                if sections.is_empty() && title.is_none() {
                    title = Some(t);
                }
            }
            LineKind::Type(slide_type) => {
                if let Some(unit) = sections.last_mut().and_then(|s| s.units.as_mut()?.last_mut()) {
                    unit.slide_type = Some(slide_type);
                }
            }
            LineKind::Text(detail) => {
                if let Some(section) = sections.last_mut() {
                    match section.units.as_mut().and_then(|u| u.last_mut()) {
                        Some(unit) => append_detail(&mut unit.content, &detail),
                        None => append_detail(&mut section.content, &detail),
                    }
                }
            }
        }
    }

    (!sections.is_empty()).then_some(DraftOutline { title, sections })
}

/// Builds a flat unit list for one section: every marker or `title:` line
/// opens a unit, `type:` lines set its layout, text lines are its detail.
pub fn units_from_lines(text: &str) -> Option<Vec<DraftUnit>> {
    let mut units: Vec<DraftUnit> = Vec::new();

    for line in text.lines().filter_map(classify) {
        match line.kind {
            LineKind::Marker { title, .. } | LineKind::Title(title) => {
                units.push(DraftUnit::titled(title));
            }
            LineKind::Type(slide_type) => {
                if let Some(unit) = units.last_mut() {
                    unit.slide_type = Some(slide_type);
                }
            }
            LineKind::Text(detail) => {
                if let Some(unit) = units.last_mut() {
                    append_detail(&mut unit.content, &detail);
                }
            }
        }
    }

    (!units.is_empty()).then_some(units)
}
