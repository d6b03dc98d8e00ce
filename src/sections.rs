//! Section extraction.
//!
//! A section is a heading paragraph plus the non-empty paragraphs that
//! follow it up to the next heading. Extraction is a single pass over the
//! document's paragraphs and never fails: a document without headings simply
//! has no sections.

use serde::{Deserialize, Serialize};

use crate::config::DocumentConfig;
use crate::model::{Document, Paragraph};

/// Characters of content preview per section in [`section_context`].
const CONTEXT_PREVIEW_CHARS: usize = 200;

/// Content paragraphs per section used in [`section_context`].
const CONTEXT_PREVIEW_PARAGRAPHS: usize = 2;

/// A heading and the content paragraphs that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Trimmed heading text
    pub title: String,
    /// Heading depth, starting at 1
    pub level: u32,
    /// Trimmed, non-empty content paragraph texts
    pub content: Vec<String>,
    /// Whether a content paragraph contains the placeholder marker
    pub has_placeholder: bool,
    /// Index into `content` of the last paragraph containing the marker
    pub placeholder_index: Option<usize>,
    /// Block position of the heading paragraph
    pub position: usize,
}

impl Section {
    fn start(title: &str, level: u32, position: usize) -> Self {
        Self {
            title: title.trim().to_string(),
            level,
            content: Vec::new(),
            has_placeholder: false,
            placeholder_index: None,
            position,
        }
    }

    /// Content paragraphs that are not placeholders, i.e. the author's
    /// description of what the section should contain.
    pub fn description(&self) -> impl Iterator<Item = &str> + '_ {
        self.content
            .iter()
            .map(String::as_str)
            .filter(|text| !text.contains("{{"))
    }
}

/// Splits a document into sections.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    heading_styles: Vec<String>,
    placeholder: String,
}

impl SectionExtractor {
    /// Create an extractor from document settings.
    pub fn new(config: &DocumentConfig) -> Self {
        Self {
            heading_styles: config.section_heading_styles.clone(),
            placeholder: config.placeholder_pattern.clone(),
        }
    }

    /// Placeholder marker this extractor looks for.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Whether `text` carries the marker. An empty marker matches nothing.
    fn is_placeholder(&self, text: &str) -> bool {
        !self.placeholder.is_empty() && text.contains(&self.placeholder)
    }

    /// Whether a style name starts a new section.
    pub fn is_heading_style(&self, style: &str) -> bool {
        self.heading_styles.iter().any(|s| s == style)
    }

    /// Extract the sections of a document.
    pub fn extract(&self, doc: &Document) -> Vec<Section> {
        self.extract_from(doc.paragraphs())
    }

    /// Extract sections from `(position, paragraph)` pairs in document order.
    pub fn extract_from<'a, I>(&self, paragraphs: I) -> Vec<Section>
    where
        I: IntoIterator<Item = (usize, &'a Paragraph)>,
    {
        let mut sections = Vec::new();
        let mut current: Option<Section> = None;

        for (position, paragraph) in paragraphs {
            if self.is_heading_style(paragraph.style()) {
                if let Some(done) = current.take() {
                    sections.push(done);
                }
                let level = heading_level(paragraph.style());
                let section = Section::start(&paragraph.text, level, position);
                log::debug!("New section started: {} (Level {})", section.title, level);
                current = Some(section);
                continue;
            }

            let Some(section) = current.as_mut() else {
                continue;
            };
            let text = paragraph.text.trim();
            if text.is_empty() {
                continue;
            }
            section.content.push(text.to_string());
            if self.is_placeholder(text) {
                section.has_placeholder = true;
                section.placeholder_index = Some(section.content.len() - 1);
                log::debug!("Placeholder found in section: {}", section.title);
            }
        }

        if let Some(done) = current {
            sections.push(done);
        }

        log::info!("Extracted {} sections from document", sections.len());
        sections
    }
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::new(&DocumentConfig::default())
    }
}

/// Heading level from a style name: the first all-digit word, or 1.
///
/// ```
/// assert_eq!(docfill::sections::heading_level("Heading 2"), 2);
/// assert_eq!(docfill::sections::heading_level("Title"), 1);
/// ```
pub fn heading_level(style: &str) -> u32 {
    style
        .split_whitespace()
        .find(|word| word.chars().all(|c| c.is_ascii_digit()))
        .and_then(|word| word.parse().ok())
        .unwrap_or(1)
}

/// Sections that carry a placeholder, in document order.
pub fn sections_needing_content(sections: &[Section]) -> Vec<&Section> {
    let pending: Vec<&Section> = sections.iter().filter(|s| s.has_placeholder).collect();
    log::info!("Found {} sections needing content", pending.len());
    pending
}

/// Describe the `window` sections preceding `target`.
///
/// Returns an empty string when `target` is not one of `sections`.
pub fn section_context(sections: &[Section], target: &Section, window: usize) -> String {
    let Some(index) = sections.iter().position(|s| s == target) else {
        log::warn!("Section '{}' not found for context", target.title);
        return String::new();
    };

    let context = sections[index.saturating_sub(window)..index]
        .iter()
        .map(|section| {
            let joined = section
                .content
                .iter()
                .take(CONTEXT_PREVIEW_PARAGRAPHS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            let preview: String = joined.chars().take(CONTEXT_PREVIEW_CHARS).collect();
            format!("Previous section '{}': {}...", section.title, preview)
        })
        .collect::<Vec<_>>()
        .join("\n");

    log::debug!(
        "Built context for section '{}': {} chars",
        target.title,
        context.chars().count()
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLACEHOLDER;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("Preamble before any heading"));
        doc.add_paragraph(Paragraph::heading("  Introduction ", 1));
        doc.add_paragraph(Paragraph::with_text("Describe the project."));
        doc.add_paragraph(Paragraph::with_text("   "));
        doc.add_paragraph(Paragraph::with_text(DEFAULT_PLACEHOLDER));
        doc.add_paragraph(Paragraph::heading("Budget", 2));
        doc.add_paragraph(Paragraph::with_text("Costs only."));
        doc.add_paragraph(Paragraph::heading("Results", 3));
        doc.add_paragraph(Paragraph::with_text(format!("First {}", DEFAULT_PLACEHOLDER)));
        doc.add_paragraph(Paragraph::with_text("Between"));
        doc.add_paragraph(Paragraph::with_text(format!("Second {}", DEFAULT_PLACEHOLDER)));
        doc
    }

    #[test]
    fn test_extract_sections() {
        let sections = SectionExtractor::default().extract(&sample());
        assert_eq!(sections.len(), 3);

        let intro = &sections[0];
        assert_eq!(intro.title, "Introduction");
        assert_eq!(intro.level, 1);
        assert_eq!(intro.position, 1);
        assert_eq!(intro.content, vec!["Describe the project.", DEFAULT_PLACEHOLDER]);
        assert!(intro.has_placeholder);
        assert_eq!(intro.placeholder_index, Some(1));

        assert_eq!(sections[1].level, 2);
        assert!(!sections[1].has_placeholder);
        assert_eq!(sections[1].placeholder_index, None);
    }

    #[test]
    fn test_last_placeholder_wins() {
        let sections = SectionExtractor::default().extract(&sample());
        assert_eq!(sections[2].placeholder_index, Some(2));
    }

    #[test]
    fn test_no_headings() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text(DEFAULT_PLACEHOLDER));
        assert!(SectionExtractor::default().extract(&doc).is_empty());
    }

    #[test]
    fn test_empty_marker_flags_nothing() {
        let config = DocumentConfig {
            placeholder_pattern: String::new(),
            ..DocumentConfig::default()
        };
        let sections = SectionExtractor::new(&config).extract(&sample());
        assert_eq!(sections.len(), 3);
        assert!(sections.iter().all(|s| !s.has_placeholder && s.placeholder_index.is_none()));
    }

    #[test]
    fn test_custom_heading_styles() {
        let config = DocumentConfig {
            section_heading_styles: vec!["Title".into()],
            ..DocumentConfig::default()
        };
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::new("Cover", "Title"));
        doc.add_paragraph(Paragraph::heading("Ignored", 1));
        let sections = SectionExtractor::new(&config).extract(&doc);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, vec!["Ignored"]);
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("Heading 3"), 3);
        assert_eq!(heading_level("Heading"), 1);
        assert_eq!(heading_level("Level 12 Heading"), 12);
        assert_eq!(heading_level("Heading2"), 1);
    }

    #[test]
    fn test_sections_needing_content() {
        let sections = SectionExtractor::default().extract(&sample());
        let pending = sections_needing_content(&sections);
        let titles: Vec<_> = pending.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Introduction", "Results"]);
    }

    #[test]
    fn test_section_context() {
        let sections = SectionExtractor::default().extract(&sample());
        let context = section_context(&sections, &sections[2], 2);
        let lines: Vec<_> = context.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            format!(
                "Previous section 'Introduction': Describe the project. {}...",
                DEFAULT_PLACEHOLDER
            )
        );
        assert_eq!(lines[1], "Previous section 'Budget': Costs only....");

        assert_eq!(section_context(&sections, &sections[0], 2), "");
    }

    #[test]
    fn test_section_context_truncates_and_handles_missing() {
        let long = Section {
            content: vec!["x".repeat(500)],
            ..Section::start("Long", 1, 0)
        };
        let target = Section::start("Target", 1, 1);
        let sections = vec![long, target.clone()];
        let context = section_context(&sections, &target, 5);
        assert_eq!(context, format!("Previous section 'Long': {}...", "x".repeat(200)));

        let stranger = Section::start("Elsewhere", 1, 9);
        assert_eq!(section_context(&sections, &stranger, 2), "");
    }

    #[test]
    fn test_description_skips_markers() {
        let sections = SectionExtractor::default().extract(&sample());
        let description: Vec<_> = sections[0].description().collect();
        assert_eq!(description, vec!["Describe the project."]);
    }
}
