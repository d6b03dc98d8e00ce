//! Document-level types.

use std::ops::Range;

use super::{Block, Paragraph, Table};
use crate::error::{Error, Result};
use crate::package::Package;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A word-processing document: metadata plus an ordered block sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Body blocks in document order
    blocks: Vec<Block>,

    /// Package the document was read from, reused on save
    #[serde(skip)]
    pub(crate) package: Option<Package>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(metadata: Metadata, blocks: Vec<Block>, package: Package) -> Self {
        Self {
            metadata,
            blocks,
            package: Some(package),
        }
    }

    /// All blocks in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks as a mutable slice. Order can be read but not changed.
    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Get a block by position.
    pub fn block(&self, position: usize) -> Option<&Block> {
        self.blocks.get(position)
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Paragraphs with their block positions, in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = (usize, &Paragraph)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_paragraph().map(|p| (i, p)))
    }

    /// Get the paragraph at a block position.
    pub fn paragraph(&self, position: usize) -> Option<&Paragraph> {
        self.blocks.get(position).and_then(Block::as_paragraph)
    }

    /// Get the paragraph at a block position mutably.
    pub fn paragraph_mut(&mut self, position: usize) -> Option<&mut Paragraph> {
        self.blocks.get_mut(position).and_then(Block::as_paragraph_mut)
    }

    /// Tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// Tables in document order, mutably.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> + '_ {
        self.blocks.iter_mut().filter_map(Block::as_table_mut)
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_paragraph()).count()
    }

    /// Number of tables.
    pub fn table_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_table()).count()
    }

    /// Position of the first paragraph matching `predicate`.
    pub fn find_paragraph<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&Paragraph) -> bool,
    {
        self.paragraphs()
            .find(|(_, p)| predicate(p))
            .map(|(position, _)| position)
    }

    /// Append a block at the end of the sequence.
    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Append a paragraph.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Append a table.
    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Insert `blocks` immediately after the block at `anchor`, in order.
    ///
    /// Returns the positions the new blocks occupy. Every block that followed
    /// the anchor keeps its relative order and moves back by `blocks.len()`.
    pub fn insert_blocks_after(
        &mut self,
        anchor: usize,
        blocks: Vec<Block>,
    ) -> Result<Range<usize>> {
        if anchor >= self.blocks.len() {
            return Err(Error::Other(format!(
                "Block position {} is out of range (document has {} blocks)",
                anchor,
                self.blocks.len()
            )));
        }

        let start = anchor + 1;
        let end = start + blocks.len();
        self.blocks.splice(start..start, blocks);
        Ok(start..end)
    }

    /// Insert paragraphs immediately after the block at `anchor`, in order.
    pub fn insert_paragraphs_after(
        &mut self,
        anchor: usize,
        paragraphs: Vec<Paragraph>,
    ) -> Result<Range<usize>> {
        self.insert_blocks_after(anchor, paragraphs.into_iter().map(Block::from).collect())
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| !matches!(b, Block::Opaque(_)))
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Summary counts and descriptive metadata.
    pub fn info(&self) -> DocumentInfo {
        let paragraph_breaks = self
            .paragraphs()
            .filter(|(_, p)| {
                p.format
                    .properties
                    .as_deref()
                    .is_some_and(|props| props.contains("sectPr"))
            })
            .count();
        let body_section = self
            .package
            .as_ref()
            .map_or(1, |pkg| usize::from(pkg.section_properties.is_some()));

        DocumentInfo {
            paragraph_count: self.paragraph_count(),
            table_count: self.table_count(),
            section_count: paragraph_breaks + body_section,
            title: self.metadata.title.clone(),
            author: self.metadata.author.clone(),
        }
    }
}

/// Document metadata from the package core properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Last author to modify the document
    pub last_modified_by: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

/// Summary of a loaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Number of body paragraphs
    pub paragraph_count: usize,

    /// Number of body tables
    pub table_count: usize,

    /// Number of page-layout sections
    pub section_count: usize,

    /// Document title, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Document author, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::heading("Intro", 1));
        doc.add_paragraph(Paragraph::with_text("first"));
        doc.add_table(Table::from_rows(vec![vec!["a", "b"]]));
        doc.add_paragraph(Paragraph::with_text("last"));
        doc
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.paragraph_count(), 0);
        assert_eq!(doc.table_count(), 0);
    }

    #[test]
    fn test_paragraph_positions_skip_tables() {
        let doc = sample();
        let positions: Vec<usize> = doc.paragraphs().map(|(i, _)| i).collect();
        assert_eq!(positions, vec![0, 1, 3]);
        assert_eq!(doc.table_count(), 1);
    }

    #[test]
    fn test_insert_blocks_after_preserves_order() {
        let mut doc = sample();
        let range = doc
            .insert_paragraphs_after(
                1,
                vec![Paragraph::with_text("x"), Paragraph::with_text("y")],
            )
            .unwrap();

        assert_eq!(range, 2..4);
        let texts: Vec<String> = doc.blocks().iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["Intro", "first", "x", "y", "a\tb", "last"]);
    }

    #[test]
    fn test_insert_after_last_block() {
        let mut doc = sample();
        let range = doc
            .insert_paragraphs_after(3, vec![Paragraph::with_text("tail")])
            .unwrap();
        assert_eq!(range, 4..5);
        assert_eq!(doc.paragraph(4).map(|p| p.text.as_str()), Some("tail"));
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut doc = sample();
        let result = doc.insert_paragraphs_after(10, vec![Paragraph::with_text("x")]);
        assert!(result.is_err());
        assert_eq!(doc.block_count(), 4);
    }

    #[test]
    fn test_find_paragraph() {
        let doc = sample();
        assert_eq!(doc.find_paragraph(|p| p.text == "last"), Some(3));
        assert_eq!(doc.find_paragraph(|p| p.text == "missing"), None);
    }

    #[test]
    fn test_info() {
        let mut doc = sample();
        doc.metadata.title = Some("Report".to_string());
        let info = doc.info();
        assert_eq!(info.paragraph_count, 3);
        assert_eq!(info.table_count, 1);
        assert_eq!(info.section_count, 1);
        assert_eq!(info.title.as_deref(), Some("Report"));
    }
}
