//! Paragraph type.

use super::SourceXml;
use serde::{Deserialize, Serialize};

/// Style name carried by paragraphs without an explicit style.
pub const DEFAULT_PARAGRAPH_STYLE: &str = "Normal";

/// A paragraph of text with its style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph text (runs concatenated)
    pub text: String,

    /// Style name (e.g. "Heading 1", "Normal")
    style: String,

    /// Style identifier inside the package (e.g. "Heading1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style_id: Option<String>,

    #[serde(skip)]
    pub(crate) format: ParagraphFormat,
}

/// Formatting markup a paragraph was read with.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParagraphFormat {
    /// Whole `w:p` element as read
    pub source: Option<SourceXml>,
    /// Raw `w:pPr` element
    pub properties: Option<String>,
    /// Raw `w:rPr` of the first run
    pub run_properties: Option<String>,
}

impl Paragraph {
    /// Create a paragraph with the given text and style name.
    pub fn new(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: style.into(),
            style_id: None,
            format: ParagraphFormat::default(),
        }
    }

    /// Create a paragraph in the default style.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(text, DEFAULT_PARAGRAPH_STYLE)
    }

    /// Create a heading paragraph ("Heading N" style).
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::new(text, format!("Heading {}", level.clamp(1, 9)))
    }

    pub(crate) fn from_parts(
        text: String,
        style: String,
        style_id: Option<String>,
        format: ParagraphFormat,
    ) -> Self {
        Self {
            text,
            style,
            style_id,
            format,
        }
    }

    /// Create a new paragraph with `text` that carries this paragraph's style
    /// and formatting.
    pub fn sibling(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: self.style.clone(),
            style_id: self.style_id.clone(),
            format: ParagraphFormat {
                source: None,
                properties: self.format.properties.as_deref().map(without_section_break),
                run_properties: self.format.run_properties.clone(),
            },
        }
    }

    /// Style name of the paragraph.
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Style identifier used inside the package.
    ///
    /// Falls back to the style name without spaces, which is how built-in
    /// styles are identified ("Heading 1" -> "Heading1").
    pub fn style_id(&self) -> String {
        self.style_id
            .clone()
            .unwrap_or_else(|| self.style.chars().filter(|c| !c.is_whitespace()).collect())
    }

    /// Change the paragraph style. Paragraph properties read from the source
    /// are dropped since they name the old style, and the paragraph is
    /// regenerated on save.
    pub fn set_style(&mut self, style: impl Into<String>) {
        self.style = style.into();
        self.style_id = None;
        self.format.properties = None;
        self.format.source = None;
    }

    /// Check if the text contains `pattern`.
    pub fn contains(&self, pattern: &str) -> bool {
        self.text.contains(pattern)
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether the paragraph changed since it was read from a package.
    pub fn is_modified(&self) -> bool {
        match &self.format.source {
            Some(source) => !source.matches(&self.text),
            None => true,
        }
    }
}

/// Paragraph properties minus an embedded section break, which must stay on
/// the paragraph that owns it.
fn without_section_break(properties: &str) -> String {
    const END: &str = "</w:sectPr>";
    match (properties.find("<w:sectPr"), properties.find(END)) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}", &properties[..start], &properties[end + END.len()..])
        }
        _ => properties.to_string(),
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::with_text("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_style() {
        let h = Paragraph::heading("Title", 2);
        assert_eq!(h.style(), "Heading 2");
        assert_eq!(h.style_id(), "Heading2");
    }

    #[test]
    fn test_sibling_keeps_formatting() {
        let mut p = Paragraph::new("{{SECTION_CONTENT}}", "Body Text");
        p.format.properties = Some("<w:pPr><w:pStyle w:val=\"BodyText\"/></w:pPr>".into());
        p.format.source = Some(SourceXml::new("<w:p/>", "{{SECTION_CONTENT}}"));

        let s = p.sibling("Generated");
        assert_eq!(s.text, "Generated");
        assert_eq!(s.style(), "Body Text");
        assert_eq!(s.format.properties, p.format.properties);
        assert!(s.format.source.is_none());
        assert!(s.is_modified());
    }

    #[test]
    fn test_sibling_drops_section_break() {
        let mut p = Paragraph::with_text("last in section");
        p.format.properties = Some(
            "<w:pPr><w:jc w:val=\"both\"/><w:sectPr><w:pgSz w:w=\"1\"/></w:sectPr></w:pPr>".into(),
        );
        let s = p.sibling("next");
        assert_eq!(
            s.format.properties.as_deref(),
            Some("<w:pPr><w:jc w:val=\"both\"/></w:pPr>")
        );
    }

    #[test]
    fn test_set_style_drops_properties() {
        let mut p = Paragraph::with_text("x");
        p.format.properties = Some("<w:pPr/>".into());
        p.format.source = Some(SourceXml::new("<w:p/>", "x"));
        assert!(!p.is_modified());

        p.set_style("Quote");
        assert_eq!(p.style(), "Quote");
        assert!(p.format.properties.is_none());
        assert!(p.is_modified());
    }

    #[test]
    fn test_is_modified() {
        let mut p = Paragraph::with_text("same");
        p.format.source = Some(SourceXml::new("<w:p/>", "same"));
        assert!(!p.is_modified());
        p.text.push('!');
        assert!(p.is_modified());
    }
}
