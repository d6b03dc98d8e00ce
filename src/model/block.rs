//! Block-level types.

use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// A content block in the document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),

    /// A table
    Table(Table),

    /// Body content that is not modelled (content controls, bookmarks, ...).
    /// Kept so that it survives a save.
    Opaque(OpaqueBlock),
}

impl Block {
    /// Get the paragraph if this block is one.
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Get the paragraph mutably if this block is one.
    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Get the table if this block is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Get the table mutably if this block is one.
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Get plain text content of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.text.clone(),
            Block::Table(t) => t.plain_text(),
            Block::Opaque(_) => String::new(),
        }
    }
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Block::Paragraph(paragraph)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Block::Table(table)
    }
}

/// Unmodelled body element, carried verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpaqueBlock {
    /// Local element name (e.g. `sdt`, `bookmarkStart`)
    pub element: String,

    /// Raw XML of the element
    #[serde(skip)]
    pub(crate) xml: String,
}

impl OpaqueBlock {
    pub(crate) fn new(element: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            xml: xml.into(),
        }
    }
}

/// Source markup of a parsed element together with the text it held when it
/// was read. The markup is reused on save only while the text is unchanged.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceXml {
    pub xml: String,
    pub text: String,
}

impl SourceXml {
    pub fn new(xml: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            xml: xml.into(),
            text: text.into(),
        }
    }

    /// Whether the markup still describes `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.text == text
    }
}
