//! Constraint enforcement: trims an outline to a rendered-unit budget.
//!
//! Presentations count the fixed title and closing slides, one title slide per
//! section and every content slide. Slides are removed from the back; a
//! section left without slides goes too, unless it is the only one left.
//! Documents count sections and keep the final section whenever the budget
//! allows more than one.

use tracing::debug;

use crate::outline::model::{
    presentation_units, DocumentSection, Outline, OutlineBody, PresentationSection,
};

/// Applies `max_units` to `outline`. `None` returns the outline untouched.
/// A budget of zero is treated as one. Re-applying the same budget is a no-op.
pub fn apply_budget(outline: Outline, max_units: Option<u32>) -> Outline {
    let Some(max_units) = max_units else {
        return outline;
    };
    let max = max_units.max(1) as usize;
    let before = outline.rendered_units();

    let Outline { title, body } = outline;
    let body = match body {
        OutlineBody::Presentation { sections } => OutlineBody::Presentation {
            sections: trim_presentation(sections, max),
        },
        OutlineBody::Document { sections } => OutlineBody::Document {
            sections: trim_document(sections, max),
        },
    };
    let trimmed = Outline { title, body };

    if trimmed.rendered_units() != before {
        debug!(
            before,
            after = trimmed.rendered_units(),
            max,
            "Outline trimmed to budget"
        );
    }
    trimmed
}

fn trim_presentation(mut sections: Vec<PresentationSection>, max: usize) -> Vec<PresentationSection> {
    while presentation_units(&sections) > max {
        let sole = sections.len() == 1;
        let Some(last) = sections.last_mut() else {
            break;
        };

        if last.slides.pop().is_some() {
            if last.slides.is_empty() && !sole {
                sections.pop();
            }
        } else if !sole {
            sections.pop();
        } else {
            // Only an empty sole section remains: nothing left to remove.
            break;
        }
    }
    sections
}

fn trim_document(mut sections: Vec<DocumentSection>, max: usize) -> Vec<DocumentSection> {
    if sections.len() <= max {
        return sections;
    }
    if max >= 2 {
        let last = sections.pop();
        sections.truncate(max - 1);
        sections.extend(last);
    } else {
        sections.truncate(max);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::model::{Slide, SlideType, Subsection};

    fn presentation(shape: &[usize]) -> Outline {
        Outline {
            title: "X".into(),
            body: OutlineBody::Presentation {
                sections: shape
                    .iter()
                    .enumerate()
                    .map(|(i, &slides)| PresentationSection {
                        title: format!("S{}", i + 1),
                        slides: (0..slides)
                            .map(|j| Slide {
                                title: format!("S{}.{}", i + 1, j + 1),
                                content: None,
                                slide_type: SlideType::Content,
                                position: None,
                            })
                            .collect(),
                    })
                    .collect(),
            },
        }
    }

    fn document(sections: usize) -> Outline {
        Outline {
            title: "X".into(),
            body: OutlineBody::Document {
                sections: (0..sections)
                    .map(|i| DocumentSection {
                        title: format!("D{}", i + 1),
                        content: None,
                        subsections: vec![Subsection {
                            title: "sub".into(),
                            content: None,
                            position: None,
                        }],
                    })
                    .collect(),
            },
        }
    }

    fn shapes() -> Vec<Outline> {
        vec![
            presentation(&[]),
            presentation(&[0]),
            presentation(&[3, 3, 3]),
            presentation(&[1, 0, 4]),
            presentation(&[5]),
            presentation(&[2, 2, 2, 2, 2]),
            document(0),
            document(1),
            document(2),
            document(7),
        ]
    }

    #[test]
    fn test_no_budget_is_noop() {
        for outline in shapes() {
            assert_eq!(apply_budget(outline.clone(), None), outline);
        }
    }

    #[test]
    fn test_trimming_is_idempotent() {
        for outline in shapes() {
            for n in 1..=16 {
                let once = apply_budget(outline.clone(), Some(n));
                let twice = apply_budget(once.clone(), Some(n));
                assert_eq!(once, twice, "budget {n} on {outline:?}");
            }
        }
    }

    #[test]
    fn test_presentation_budget_respected() {
        for outline in shapes().into_iter().filter(|o| matches!(o.body, OutlineBody::Presentation { .. })) {
            for n in 3..=16u32 {
                let trimmed = apply_budget(outline.clone(), Some(n));
                assert!(trimmed.rendered_units() <= n as usize, "budget {n} on {outline:?}");
            }
        }
    }

    #[test]
    fn test_document_budget_respected() {
        for outline in shapes().into_iter().filter(|o| matches!(o.body, OutlineBody::Document { .. })) {
            for n in 1..=10u32 {
                let trimmed = apply_budget(outline.clone(), Some(n));
                assert!(trimmed.section_count() <= n as usize);
            }
        }
    }

    #[test]
    fn test_three_by_three_presentation_with_budget_four() {
        let trimmed = apply_budget(presentation(&[3, 3, 3]), Some(4));
        assert!(trimmed.rendered_units() <= 4);
        let OutlineBody::Presentation { sections } = &trimmed.body else {
            panic!("kind changed");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "S1");
        assert_eq!(sections[0].slides.len(), 1);
        assert_eq!(sections[0].slides[0].title, "S1.1");
    }

    #[test]
    fn test_slides_removed_from_the_back() {
        let trimmed = apply_budget(presentation(&[2, 2]), Some(6));
        // Emptying S2 removes its title slide as well.
        let OutlineBody::Presentation { sections } = &trimmed.body else {
            panic!("kind changed");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].slides.len(), 2);
        assert_eq!(trimmed.rendered_units(), 5);
    }

    #[test]
    fn test_sole_section_is_never_removed() {
        let trimmed = apply_budget(presentation(&[4]), Some(1));
        assert_eq!(trimmed.section_count(), 1);
        assert_eq!(trimmed.leaf_count(), 0);
    }

    #[test]
    fn test_document_keeps_conclusion() {
        let trimmed = apply_budget(document(7), Some(3));
        assert_eq!(trimmed.section_titles(), vec!["D1", "D2", "D7"]);
    }

    #[test]
    fn test_document_budget_of_one_keeps_first_section() {
        assert_eq!(apply_budget(document(4), Some(1)).section_titles(), vec!["D1"]);
        assert_eq!(apply_budget(document(4), Some(0)).section_titles(), vec!["D1"]);
    }
}
