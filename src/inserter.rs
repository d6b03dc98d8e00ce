//! Content insertion at placeholder paragraphs.

use std::collections::BTreeMap;

use crate::config::DocumentConfig;
use crate::model::{Document, Paragraph};
use crate::sections::Section;

/// Splices generated text into a document.
#[derive(Debug, Clone)]
pub struct ContentInserter {
    placeholder: String,
}

impl ContentInserter {
    /// Create an inserter from document settings.
    pub fn new(config: &DocumentConfig) -> Self {
        Self::with_placeholder(config.placeholder_pattern.clone())
    }

    /// Create an inserter looking for a specific marker.
    pub fn with_placeholder(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    /// Placeholder marker this inserter looks for.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Insert `content` at the placeholder paragraph for `section`.
    ///
    /// The placeholder is the first paragraph in the whole document that
    /// contains the marker. With `preserve_placeholder` every produced
    /// paragraph goes after it and the placeholder is left alone; otherwise
    /// the placeholder's text becomes the first produced paragraph. New
    /// paragraphs copy the placeholder's style and formatting and sit
    /// contiguously in produced order.
    ///
    /// Returns `false` without touching the document if the section has no
    /// placeholder, the marker is empty, no paragraph contains the marker, or
    /// `content` holds no text.
    pub fn insert_content(
        &self,
        doc: &mut Document,
        section: &Section,
        content: &str,
        preserve_placeholder: bool,
    ) -> bool {
        if !section.has_placeholder {
            log::warn!("Section '{}' has no placeholder", section.title);
            return false;
        }

        if self.placeholder.is_empty() {
            log::error!("Empty placeholder marker, refusing to insert");
            return false;
        }

        log::info!("Inserting content into section: {}", section.title);

        let Some(anchor) = doc.find_paragraph(|p| p.contains(&self.placeholder)) else {
            log::error!(
                "Placeholder not found in document for section: {}",
                section.title
            );
            return false;
        };

        let mut chunks = split_into_paragraphs(content);
        if chunks.is_empty() {
            log::error!("No content to insert for section: {}", section.title);
            return false;
        }

        let Some(template) = doc.paragraph(anchor).cloned() else {
            return false;
        };
        let produced = chunks.len();
        let first = if preserve_placeholder {
            None
        } else {
            Some(chunks.remove(0))
        };
        let paragraphs: Vec<Paragraph> = chunks
            .iter()
            .map(|text| template.sibling(text.as_str()))
            .collect();

        if let Err(e) = doc.insert_paragraphs_after(anchor, paragraphs) {
            log::error!("Failed to insert content: {}", e);
            return false;
        }
        if let (Some(first), Some(paragraph)) = (first, doc.paragraph_mut(anchor)) {
            paragraph.text = first;
        }

        log::info!("Successfully inserted {} paragraph(s)", produced);
        true
    }

    /// Replace every occurrence of each marker with its replacement text.
    ///
    /// Returns the number of (paragraph, marker) pairs that were replaced.
    pub fn replace_all_placeholders(
        &self,
        doc: &mut Document,
        replacements: &BTreeMap<String, String>,
    ) -> usize {
        let mut count = 0;
        for block in doc.blocks_mut() {
            let Some(paragraph) = block.as_paragraph_mut() else {
                continue;
            };
            for (marker, replacement) in replacements {
                if marker.is_empty() || !paragraph.contains(marker) {
                    continue;
                }
                paragraph.text = paragraph.text.replace(marker.as_str(), replacement);
                count += 1;
                log::debug!("Replaced placeholder: {}", marker);
            }
        }
        log::info!("Made {} placeholder replacement(s)", count);
        count
    }
}

impl Default for ContentInserter {
    fn default() -> Self {
        Self::new(&DocumentConfig::default())
    }
}

/// Split generated text into paragraph texts.
///
/// Blank lines separate paragraphs. Text without blank lines is split on
/// single newlines instead. Whitespace-only pieces are dropped.
///
/// ```
/// use docfill::inserter::split_into_paragraphs;
///
/// assert_eq!(split_into_paragraphs("A\n\nB\n\nC"), vec!["A", "B", "C"]);
/// assert_eq!(split_into_paragraphs("A\nB"), vec!["A", "B"]);
/// ```
pub fn split_into_paragraphs(content: &str) -> Vec<String> {
    let split = |separator: &str| -> Vec<String> {
        content
            .split(separator)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect()
    };

    let mut paragraphs = split("\n\n");
    if paragraphs.len() == 1 {
        paragraphs = split("\n");
    }
    log::debug!("Split content into {} paragraph(s)", paragraphs.len());
    paragraphs
}
