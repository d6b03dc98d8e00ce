//! Document model types for word-processing content.
//!
//! The model is an ordered sequence of blocks owned by a [`Document`]. Block
//! order is the single source of truth for document order: a paragraph's
//! position is its index in the sequence, so inserting blocks renumbers every
//! later block automatically.

mod block;
mod document;
mod paragraph;
mod table;

pub use block::{Block, OpaqueBlock};
pub use document::{Document, DocumentInfo, Metadata};
pub use paragraph::{Paragraph, DEFAULT_PARAGRAPH_STYLE};
pub use table::{Table, TableCell, TableRow};

pub(crate) use block::SourceXml;
pub(crate) use paragraph::ParagraphFormat;
pub(crate) use table::CellFormat;
