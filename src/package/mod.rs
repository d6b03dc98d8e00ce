//! DOCX package reading and writing.
//!
//! A package is a ZIP container. Only `word/document.xml` is interpreted and
//! regenerated; every other part is carried through a load/save cycle
//! byte-for-byte.

mod body;
mod core_props;
mod reader;
mod styles;
mod writer;

pub use reader::DocxReader;
pub use writer::{save, save_document, to_bytes};

pub(crate) use styles::StyleMap;

/// Main document part.
pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
/// Style definitions part.
pub(crate) const STYLES_PART: &str = "word/styles.xml";
/// Core properties part (title, author, dates).
pub(crate) const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

/// Raw package contents kept alongside a parsed document.
#[derive(Debug, Clone, Default)]
pub(crate) struct Package {
    /// Every part of the container in archive order
    pub parts: Vec<PackagePart>,
    /// `word/document.xml` up to and including the `w:body` start tag
    pub document_head: String,
    /// `word/document.xml` from the `w:body` end tag on
    pub document_tail: String,
    /// Body-level `w:sectPr`
    pub section_properties: Option<String>,
}

impl Package {
    /// Get a part's data by name.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }
}

/// A single entry of the container.
#[derive(Debug, Clone)]
pub(crate) struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
    pub is_dir: bool,
}

/// Derive an output file name from an input file name.
///
/// ```
/// assert_eq!(docfill::package::output_file_name("report.docx", "_generated"), "report_generated.docx");
/// ```
pub fn output_file_name(original: impl AsRef<std::path::Path>, suffix: &str) -> String {
    let path = original.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    log::debug!("Generated output file name: {}", name);
    name
}
