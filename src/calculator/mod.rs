//! Table calculations.
//!
//! Cells whose text reads like "Total", "Difference" or "Average" are
//! calculation labels. A label in the first column aggregates the rest of its
//! row into the row's last cell; a label in the last row aggregates the cells
//! above it and is replaced by the result. Results copy the number format of
//! a neighbouring cell (percent, currency, decimal or integer).
//!
//! ```
//! use docfill::calculator::TableCalculator;
//! use docfill::Table;
//!
//! let mut table = Table::from_rows([["Total", "10", "20", "30", ""]]);
//! let calculator = TableCalculator::default();
//! assert_eq!(calculator.process_table(&mut table), 1);
//! assert_eq!(table.cell_text(0, 4), Some("60"));
//! ```

mod label;
mod number;

pub use label::{CalculationKind, LabelRules};
pub use number::{extract_number, format_value, NumberFormat};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::TableOptions;
use crate::model::{Document, Table};

/// Direction a label aggregates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Cells to the right of a first-column label
    Row,
    /// Cells above a last-row label
    Column,
}

/// One computed result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calculation {
    /// Kind of aggregate
    pub kind: CalculationKind,
    /// Aggregation direction
    pub orientation: Orientation,
    /// Row of the label cell
    pub row: usize,
    /// Column of the label cell
    pub col: usize,
    /// Raw computed value
    pub value: f64,
    /// Text written into the result cell
    pub formatted: String,
}

/// Finds calculation labels in tables and writes the results.
#[derive(Debug, Clone)]
pub struct TableCalculator {
    rules: LabelRules,
    parallel: bool,
}

impl TableCalculator {
    /// Create a calculator with the built-in label rules.
    pub fn new(options: &TableOptions) -> Self {
        Self::with_rules(LabelRules::default(), options)
    }

    /// Create a calculator with custom label rules.
    pub fn with_rules(rules: LabelRules, options: &TableOptions) -> Self {
        Self {
            rules,
            parallel: options.parallel,
        }
    }

    /// Run every table of the document. Returns the number of cells computed.
    pub fn process_all_tables(&self, doc: &mut Document) -> usize {
        let tables: Vec<&mut Table> = doc.tables_mut().collect();
        if tables.is_empty() {
            log::info!("No tables found in document");
            return 0;
        }

        log::info!("Processing {} table(s)", tables.len());
        let run = |(index, table): (usize, &mut Table)| {
            log::debug!("Processing table {}", index + 1);
            self.process_table(table)
        };
        let total: usize = if self.parallel {
            tables.into_par_iter().enumerate().map(run).sum()
        } else {
            tables.into_iter().enumerate().map(run).sum()
        };

        log::info!("Completed {} calculation(s) across all tables", total);
        total
    }

    /// Run one table. Returns the number of cells computed.
    pub fn process_table(&self, table: &mut Table) -> usize {
        self.calculate_table(table).len()
    }

    /// Run one table and report each computed cell.
    pub fn calculate_table(&self, table: &mut Table) -> Vec<Calculation> {
        validate_table_structure(table);

        let mut done = Vec::new();
        for row in 0..table.rows.len() {
            for col in 0..table.rows[row].cells.len() {
                let Some(kind) = self.rules.classify(&table.rows[row].cells[col].text) else {
                    continue;
                };
                if let Some(calculation) = calculate(table, row, col, kind) {
                    done.push(calculation);
                }
            }
        }
        done
    }
}

impl Default for TableCalculator {
    fn default() -> Self {
        Self::new(&TableOptions::default())
    }
}

/// Check that every row has the same number of cells.
///
/// A ragged table is logged but still processed.
pub fn validate_table_structure(table: &Table) -> bool {
    if table.rows.is_empty() {
        return false;
    }
    let rectangular = table.is_rectangular();
    if !rectangular {
        log::warn!("Table has inconsistent column counts");
    }
    rectangular
}

/// Direction a label at (`row`, `col`) aggregates in, if any.
fn orientation(table: &Table, row: usize, col: usize) -> Option<Orientation> {
    let last_row = table.rows.len().saturating_sub(1);
    if col == 0 && (row != last_row || row == 0) {
        Some(Orientation::Row)
    } else if row == last_row && row > 0 && col != 0 {
        Some(Orientation::Column)
    } else {
        None
    }
}

fn calculate(table: &mut Table, row: usize, col: usize, kind: CalculationKind) -> Option<Calculation> {
    let Some(orientation) = orientation(table, row, col) else {
        log::debug!("Ambiguous calculation position at ({}, {})", row, col);
        return None;
    };

    let (values, reference, target) = match orientation {
        Orientation::Row => {
            let cells = &table.rows[row].cells;
            let values: Vec<f64> = cells[col + 1..]
                .iter()
                .filter_map(|cell| extract_number(&cell.text))
                .collect();
            let reference = cells.get(col + 1).map(|c| c.text.clone()).unwrap_or_default();
            (values, reference, (row, cells.len() - 1))
        }
        Orientation::Column => {
            let values: Vec<f64> = (0..row)
                .filter_map(|r| table.cell_text(r, col))
                .filter_map(extract_number)
                .collect();
            let reference = table.cell_text(row - 1, col).unwrap_or_default().to_string();
            (values, reference, (row, col))
        }
    };

    let Some(value) = kind.apply(&values) else {
        match orientation {
            Orientation::Row => log::debug!("No numeric values found in row {}", row),
            Orientation::Column => log::debug!("No numeric values found in column {}", col),
        }
        return None;
    };

    let formatted = format_value(value, &reference);
    let cell = table.cell_mut(target.0, target.1)?;
    cell.set_text(formatted.clone());
    match orientation {
        Orientation::Row => log::info!("Row {} {}: {}", row, kind, formatted),
        Orientation::Column => log::info!("Column {} {}: {}", col, kind, formatted),
    }

    Some(Calculation {
        kind,
        orientation,
        row,
        col,
        value,
        formatted,
    })
}
