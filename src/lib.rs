//! # docfill
//!
//! Fill structured Word documents: find the sections an author marked for
//! content, splice generated text in place of the markers, and compute the
//! totals, differences and averages that tables ask for.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docfill::Docfill;
//!
//! fn main() -> docfill::Result<()> {
//!     let mut session = Docfill::new().open("proposal.docx")?;
//!
//!     let pending: Vec<usize> = session
//!         .sections_needing_content()
//!         .iter()
//!         .map(|(ordinal, _)| *ordinal)
//!         .collect();
//!     for ordinal in pending {
//!         session.insert_content(ordinal, "First paragraph.\n\nSecond paragraph.", false);
//!     }
//!
//!     session.process_all_tables();
//!     session.save("proposal_generated.docx");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Section index**: headings split the document into sections; a marker
//!   paragraph (`{{SECTION_CONTENT}}` by default) flags where content goes
//! - **Style-preserving insertion**: new paragraphs inherit the marker
//!   paragraph's style and formatting and are spliced in document order
//! - **Table calculations**: "Total", "Difference" and "Average" labels are
//!   computed and formatted like their neighbouring cells
//! - **Round-trip fidelity**: untouched package parts and body elements are
//!   written back unchanged
//! - **Parallel processing**: tables are processed with Rayon

pub mod calculator;
pub mod config;
pub mod detect;
pub mod error;
pub mod generate;
pub mod inserter;
pub mod model;
pub mod package;
pub mod render;
pub mod sections;
mod session;

// Re-export commonly used types
pub use calculator::{CalculationKind, LabelRules, TableCalculator};
pub use config::{Config, DocumentConfig, GenerationConfig, TableOptions};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use error::{Error, Result};
pub use generate::{
    GenerationRequest, PromptBuilder, RetryPolicy, SectionPromptBuilder, TextGenerator,
};
pub use inserter::ContentInserter;
pub use model::{
    Block, Document, DocumentInfo, Metadata, Paragraph, Table, TableCell, TableRow,
};
pub use package::DocxReader;
pub use render::JsonFormat;
pub use sections::{Section, SectionExtractor};
pub use session::{DocfillSession, GeneratedContent};

use std::io::Read;
use std::path::Path;

/// Load a DOCX file.
///
/// # Example
///
/// ```no_run
/// let doc = docfill::load_file("report.docx").unwrap();
/// println!("Paragraphs: {}", doc.paragraph_count());
/// ```
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    DocxReader::open(path)?.parse()
}

/// Load a DOCX package from bytes.
pub fn load_bytes(data: &[u8]) -> Result<Document> {
    DocxReader::from_bytes(data)?.parse()
}

/// Load a DOCX package from a reader.
pub fn load_reader<R: Read>(reader: R) -> Result<Document> {
    DocxReader::from_reader(reader)?.parse()
}

/// Save a document, reporting failure as `false` after logging it.
pub fn save<P: AsRef<Path>>(doc: &Document, path: P) -> bool {
    package::save_document(doc, path)
}

/// Extract sections using the default heading styles and marker.
pub fn extract_sections(doc: &Document) -> Vec<Section> {
    SectionExtractor::default().extract(doc)
}

/// Insert content at the default marker. See [`ContentInserter::insert_content`].
pub fn insert_content(doc: &mut Document, section: &Section, content: &str, preserve_placeholder: bool) -> bool {
    ContentInserter::default().insert_content(doc, section, content, preserve_placeholder)
}

/// Compute every table calculation in the document.
pub fn process_all_tables(doc: &mut Document) -> usize {
    TableCalculator::default().process_all_tables(doc)
}

/// Builder for opening documents with a configuration.
///
/// # Example
///
/// ```no_run
/// use docfill::Docfill;
///
/// let session = Docfill::new()
///     .with_placeholder("[[WRITE HERE]]")
///     .with_heading_styles(["Heading 1", "Heading 2"])
///     .sequential()
///     .open("template.docx")?;
/// println!("{} sections", session.sections().len());
/// # Ok::<(), docfill::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Docfill {
    config: Config,
}

impl Docfill {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the placeholder marker.
    pub fn with_placeholder(mut self, marker: impl Into<String>) -> Self {
        self.config = self.config.with_placeholder(marker);
        self
    }

    /// Set the heading styles that start sections.
    pub fn with_heading_styles<S: Into<String>>(mut self, styles: impl IntoIterator<Item = S>) -> Self {
        self.config = self.config.with_heading_styles(styles);
        self
    }

    /// Disable parallel table processing.
    pub fn sequential(mut self) -> Self {
        self.config = self.config.sequential();
        self
    }

    /// Configuration that sessions will use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<DocfillSession> {
        self.config.validate()?;
        let document = load_file(path)?;
        self.session(document)
    }

    /// Open a DOCX package from bytes.
    pub fn open_bytes(self, data: &[u8]) -> Result<DocfillSession> {
        self.config.validate()?;
        let document = load_bytes(data)?;
        self.session(document)
    }

    /// Start a session for a document already in memory.
    pub fn session(self, document: Document) -> Result<DocfillSession> {
        self.config.validate()?;
        Ok(DocfillSession::new(document, self.config))
    }
}
