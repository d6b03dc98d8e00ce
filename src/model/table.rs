//! Table types.

use super::SourceXml;
use serde::{Deserialize, Serialize};

/// A table: rows of text cells. Rows may hold different numbers of cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<TableRow>,

    /// Whole `w:tbl` element as read, keyed by the cell fingerprint
    #[serde(skip)]
    pub(crate) source: Option<SourceXml>,

    /// Raw `w:tblPr` and `w:tblGrid` elements
    #[serde(skip)]
    pub(crate) properties: Option<String>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from rows of text values.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(TableRow::from_strings).collect(),
            ..Self::default()
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every row has the same number of cells.
    pub fn is_rectangular(&self) -> bool {
        let mut counts = self.rows.iter().map(|r| r.cells.len());
        match counts.next() {
            Some(first) => counts.all(|c| c == first),
            None => true,
        }
    }

    /// Get a cell by row and column.
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Get a cell mutably by row and column.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col))
    }

    /// Get a cell's text by row and column.
    pub fn cell_text(&self, row: usize, col: usize) -> Option<&str> {
        self.cell(row, col).map(|c| c.text.as_str())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of every cell with its coordinates; changes whenever any cell
    /// text or the table shape changes.
    pub(crate) fn fingerprint(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|c| c.text.replace('\u{1f}', " "))
                    .collect::<Vec<_>>()
                    .join("\u{1f}")
            })
            .collect::<Vec<_>>()
            .join("\u{1e}")
    }

    /// Whether any cell changed since the table was read from a package.
    pub fn is_modified(&self) -> bool {
        match &self.source {
            Some(source) => !source.matches(&self.fingerprint()),
            None => true,
        }
    }
}

/// A table row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,

    /// Raw `w:trPr` element
    #[serde(skip)]
    pub(crate) properties: Option<String>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            properties: None,
        }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text; paragraphs inside the cell are separated by `\n`
    pub text: String,

    #[serde(skip)]
    pub(crate) format: CellFormat,
}

/// Formatting markup a cell was read with.
#[derive(Debug, Clone, Default)]
pub(crate) struct CellFormat {
    /// Whole `w:tc` element as read
    pub source: Option<SourceXml>,
    /// Raw `w:tcPr` element
    pub properties: Option<String>,
    /// Raw `w:pPr` of the first paragraph in the cell
    pub paragraph_properties: Option<String>,
    /// Raw `w:rPr` of the first run in the cell
    pub run_properties: Option<String>,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: CellFormat::default(),
        }
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        Self::text("")
    }

    /// Replace the cell text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_table_with_data() {
        let table = Table::from_rows(vec![
            vec!["Item", "Q1", "Q2"],
            vec!["Apples", "10", "20"],
            vec!["Pears", "5", "7"],
        ]);

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell_text(1, 2), Some("20"));
        assert_eq!(table.cell_text(3, 0), None);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_ragged_table() {
        let table = Table::from_rows(vec![vec!["a", "b", "c"], vec!["d"]]);
        assert!(!table.is_rectangular());
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let mut table = Table::from_rows(vec![vec!["a", "b"]]);
        table.source = Some(SourceXml::new("<w:tbl/>", table.fingerprint()));
        assert!(!table.is_modified());

        if let Some(cell) = table.cell_mut(0, 1) {
            cell.set_text("c");
        }
        assert!(table.is_modified());
    }

    #[test]
    fn test_cell_text() {
        let cell = TableCell::text("Hello");
        assert_eq!(cell.text, "Hello");
        assert!(!cell.is_empty());
        assert!(TableCell::empty().is_empty());
    }
}
