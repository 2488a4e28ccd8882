//! Canned outlines used when no completion text could be recovered.

use crate::outline::model::{DraftOutline, DraftSection, DraftUnit, SlideType};

/// Fixed introduction / body / conclusion skeleton for `topic`.
/// The draft carries no title, so the outline title becomes the topic.
pub fn canned_outline(topic: &str) -> DraftOutline {
    let topic = topic.trim();
    let titles = [
        "Introduction".to_string(),
        format!("Fundamentals of {topic}"),
        format!("Key Features of {topic}"),
        format!("Applications of {topic}"),
        format!("Trends in {topic}"),
        "Conclusion".to_string(),
    ];

    DraftOutline {
        title: None,
        sections: titles
            .into_iter()
            .map(|title| DraftSection {
                units: Some(canned_units(&title)),
                title,
                content: None,
            })
            .collect(),
    }
}

/// Generic leaf units for one section.
pub fn canned_units(section_title: &str) -> Vec<DraftUnit> {
    let section = section_title.trim();
    [
        (format!("Overview of {section}"), SlideType::Content),
        (format!("Key Elements of {section}"), SlideType::TwoColumn),
        (format!("Examples of {section}"), SlideType::ImageContent),
        (format!("Best Practices for {section}"), SlideType::Content),
    ]
    .into_iter()
    .map(|(title, slide_type)| DraftUnit {
        title,
        slide_type: Some(slide_type),
        ..Default::default()
    })
    .collect()
}
