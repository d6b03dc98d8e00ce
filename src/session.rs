//! A loaded document together with its section index and components.

use std::collections::BTreeMap;
use std::path::Path;

use crate::calculator::TableCalculator;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::generate::{generate_with_retry, GenerationRequest, PromptBuilder, RetryPolicy, TextGenerator};
use crate::inserter::ContentInserter;
use crate::model::Document;
use crate::package;
use crate::render::{self, JsonFormat};
use crate::sections::{self, Section, SectionExtractor};

/// Generated text per section, keyed by section ordinal.
///
/// Ordinals are positions in the session's section list, so sections with
/// identical titles stay distinct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedContent {
    entries: BTreeMap<usize, String>,
}

impl GeneratedContent {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate text with a section ordinal, returning any text it replaces.
    pub fn insert(&mut self, ordinal: usize, text: impl Into<String>) -> Option<String> {
        self.entries.insert(ordinal, text.into())
    }

    /// Text for a section ordinal.
    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.entries.get(&ordinal).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Build from title-keyed text.
    ///
    /// Every section whose title matches receives the text. When a title is
    /// given more than once the last text wins.
    pub fn by_title<T, S>(sections: &[Section], texts: impl IntoIterator<Item = (T, S)>) -> Self
    where
        T: Into<String>,
        S: Into<String>,
    {
        let by_title: BTreeMap<String, String> = texts
            .into_iter()
            .map(|(title, text)| (title.into(), text.into()))
            .collect();

        let mut content = Self::new();
        for (ordinal, section) in sections.iter().enumerate() {
            if let Some(text) = by_title.get(&section.title) {
                content.insert(ordinal, text.clone());
            }
        }
        content
    }
}

impl FromIterator<(usize, String)> for GeneratedContent {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A document opened for filling.
///
/// Created by [`crate::Docfill`]. Sections are extracted once when the
/// session is created; call [`DocfillSession::refresh_sections`] to re-index
/// after edits.
#[derive(Debug, Clone)]
pub struct DocfillSession {
    config: Config,
    document: Document,
    sections: Vec<Section>,
    extractor: SectionExtractor,
    inserter: ContentInserter,
    calculator: TableCalculator,
}

impl DocfillSession {
    /// Wrap a document, building every component from `config`.
    pub fn new(document: Document, config: Config) -> Self {
        let extractor = SectionExtractor::new(&config.document);
        let inserter = ContentInserter::new(&config.document);
        let calculator = TableCalculator::new(&config.tables);
        let sections = extractor.extract(&document);
        Self {
            config,
            document,
            sections,
            extractor,
            inserter,
            calculator,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the document.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Consume the session and return the document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Sections in document order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section by ordinal.
    pub fn section(&self, ordinal: usize) -> Result<&Section> {
        self.sections
            .get(ordinal)
            .ok_or(Error::SectionNotFound(ordinal, self.sections.len()))
    }

    /// Sections that carry a placeholder, with their ordinals.
    pub fn sections_needing_content(&self) -> Vec<(usize, &Section)> {
        let pending: Vec<(usize, &Section)> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.has_placeholder)
            .collect();
        log::info!("Found {} sections needing content", pending.len());
        pending
    }

    /// Re-extract sections from the current document.
    pub fn refresh_sections(&mut self) {
        self.sections = self.extractor.extract(&self.document);
    }

    /// Describe the `window` sections before the section at `ordinal`.
    pub fn section_context(&self, ordinal: usize, window: usize) -> Result<String> {
        let target = self.section(ordinal)?;
        Ok(sections::section_context(&self.sections, target, window))
    }

    /// Insert generated text at the placeholder for the section at `ordinal`.
    pub fn insert_content(&mut self, ordinal: usize, content: &str, preserve_placeholder: bool) -> bool {
        let Some(section) = self.sections.get(ordinal) else {
            log::error!(
                "Section {} is out of range (document has {} sections)",
                ordinal,
                self.sections.len()
            );
            return false;
        };
        self.inserter
            .insert_content(&mut self.document, section, content, preserve_placeholder)
    }

    /// Insert every entry of `content`. Returns the number of successful
    /// insertions.
    pub fn apply_generated(&mut self, content: &GeneratedContent, preserve_placeholder: bool) -> usize {
        let inserted = content
            .iter()
            .filter(|(ordinal, text)| self.insert_content(*ordinal, text, preserve_placeholder))
            .count();
        log::info!("Inserted content into {}/{} section(s)", inserted, content.len());
        inserted
    }

    /// Replace markers with text throughout the document.
    pub fn replace_all_placeholders(&mut self, replacements: &BTreeMap<String, String>) -> usize {
        self.inserter
            .replace_all_placeholders(&mut self.document, replacements)
    }

    /// Build the prompts for the section at `ordinal`.
    pub fn build_prompt<B: PromptBuilder + ?Sized>(
        &self,
        ordinal: usize,
        builder: &B,
        request: &GenerationRequest,
    ) -> Result<(String, String)> {
        let section = self.section(ordinal)?;
        let context = sections::section_context(&self.sections, section, request.context_window);
        Ok(builder.build_prompt(
            section,
            &request.user_notes,
            &context,
            &request.tone,
            &request.length_guideline,
        ))
    }

    /// Generate text for the section at `ordinal`.
    ///
    /// Builds the prompts from the preceding sections' context and calls
    /// `generator` with the configured sampling settings and retry policy.
    /// The document is not changed.
    pub fn generate_for<G, B>(
        &self,
        ordinal: usize,
        generator: &G,
        builder: &B,
        request: &GenerationRequest,
    ) -> Result<String>
    where
        G: TextGenerator + ?Sized,
        B: PromptBuilder + ?Sized,
    {
        let (system, prompt) = self.build_prompt(ordinal, builder, request)?;
        let settings = &self.config.generation;
        generate_with_retry(
            generator,
            &RetryPolicy::from(settings),
            &prompt,
            Some(&system),
            settings.temperature,
            settings.max_tokens,
        )
    }

    /// Compute every table calculation. Returns the number of cells written.
    pub fn process_all_tables(&mut self) -> usize {
        self.calculator.process_all_tables(&mut self.document)
    }

    /// Write the document as a DOCX package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        package::to_bytes(&self.document)
    }

    /// Save the document. Failures are logged and reported as `false`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> bool {
        package::save_document(&self.document, path)
    }

    /// Render the document as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Render the document as plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLACEHOLDER;
    use crate::generate::SectionPromptBuilder;
    use crate::model::{Paragraph, Table};

    fn session() -> DocfillSession {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::heading("Overview", 1));
        doc.add_paragraph(Paragraph::with_text("What this is about."));
        doc.add_paragraph(Paragraph::with_text(DEFAULT_PLACEHOLDER));
        doc.add_paragraph(Paragraph::heading("Notes", 1));
        doc.add_paragraph(Paragraph::with_text("No marker here."));
        doc.add_paragraph(Paragraph::heading("Overview", 1));
        doc.add_paragraph(Paragraph::with_text(DEFAULT_PLACEHOLDER));
        doc.add_table(Table::from_rows([["Total", "2", "3", ""], ["", "", "", ""]]));
        DocfillSession::new(doc, Config::default())
    }

    #[test]
    fn test_sections_indexed_on_creation() {
        let session = session();
        assert_eq!(session.sections().len(), 3);
        let pending: Vec<usize> = session.sections_needing_content().iter().map(|(i, _)| *i).collect();
        assert_eq!(pending, vec![0, 2]);
        assert!(matches!(session.section(7), Err(Error::SectionNotFound(7, 3))));
    }

    #[test]
    fn test_apply_generated_by_ordinal() {
        let mut session = session();
        let content: GeneratedContent =
            [(0, "First body".to_string()), (2, "Second body".to_string())].into_iter().collect();

        assert_eq!(session.apply_generated(&content, false), 2);
        let texts: Vec<&str> = session.document().paragraphs().map(|(_, p)| p.text.as_str()).collect();
        assert_eq!(texts[2], "First body");
        assert_eq!(texts[6], "Second body");
    }

    #[test]
    fn test_apply_generated_skips_missing_sections() {
        let mut session = session();
        let mut content = GeneratedContent::new();
        content.insert(1, "Notes body");
        content.insert(9, "Nowhere");
        assert_eq!(session.apply_generated(&content, false), 0);
    }

    #[test]
    fn test_by_title_duplicates() {
        let session = session();
        let content = GeneratedContent::by_title(
            session.sections(),
            [("Overview", "old"), ("Overview", "new"), ("Missing", "x")],
        );
        assert_eq!(content.len(), 2);
        assert_eq!(content.get(0), Some("new"));
        assert_eq!(content.get(2), Some("new"));
    }

    #[test]
    fn test_generate_for_uses_context() {
        let session = session();
        let seen = std::cell::RefCell::new(String::new());
        let generator = |prompt: &str, system: Option<&str>, _: f32, max_tokens: u32| -> Result<String> {
            assert!(system.is_some());
            assert_eq!(max_tokens, 2000);
            *seen.borrow_mut() = prompt.to_string();
            Ok("Generated".to_string())
        };

        let request = GenerationRequest::new("Keep it short").with_context_window(1);
        let text = session
            .generate_for(2, &generator, &SectionPromptBuilder::new(), &request)
            .unwrap();
        assert_eq!(text, "Generated");
        let prompt = seen.borrow();
        assert!(prompt.contains("Previous section 'Notes': No marker here...."));
        assert!(!prompt.contains("Previous section 'Overview'"));

        let missing = session.generate_for(5, &generator, &SectionPromptBuilder::new(), &request);
        assert!(matches!(missing, Err(Error::SectionNotFound(5, 3))));
    }

    #[test]
    fn test_process_all_tables() {
        let mut session = session();
        assert_eq!(session.process_all_tables(), 1);
        let table = session.document().tables().next().unwrap();
        assert_eq!(table.cell_text(0, 3), Some("5"));
    }

    #[test]
    fn test_refresh_sections() {
        let mut session = session();
        assert!(session.insert_content(0, "Body", false));
        assert!(session.sections()[0].has_placeholder);
        session.refresh_sections();
        assert!(!session.sections()[0].has_placeholder);
    }
}
