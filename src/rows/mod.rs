//! Tabular rows flowing through the pipeline
//!
//! [`RowSet`] is the validated input: every row has exactly one cell per
//! column and the identifier column is known. [`EnrichedSet`] is the output:
//! the untouched input cells plus the flat enrichment fields, produced as
//! fresh values. [`RowStore`] is the seam to whatever holds the tables on
//! disk; the CSV implementation lives in [`store`].

pub mod store;

pub use store::CsvRowStore;

use crate::cnpj::Cnpj;
use crate::error::{Error, Result};
use crate::extract::{self, FieldSet};
use async_trait::async_trait;
use std::path::Path;

/// Name of the required identifier column, matched case-insensitively
pub const CNPJ_COLUMN: &str = "cnpj";

/// Validated input table
#[derive(Debug, Clone)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    cnpj_index: usize,
}

impl RowSet {
    /// Build a row set, validating that an identifier column exists.
    ///
    /// Rows are normalized to exactly one cell per column: short rows are
    /// padded with empty cells, long rows truncated.
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<String>>) -> Result<Self> {
        let cnpj_index = columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(CNPJ_COLUMN))
            .ok_or_else(|| {
                Error::validation(format!("input has no '{CNPJ_COLUMN}' column"))
            })?;
        for row in &mut rows {
            row.resize(columns.len(), String::new());
        }
        Ok(Self {
            columns,
            rows,
            cnpj_index,
        })
    }

    /// Input column headers, in original order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Input rows, one `Vec` of cells per record
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw identifier cell of one row
    pub fn raw_identifier(&self, index: usize) -> &str {
        &self.rows[index][self.cnpj_index]
    }
}

/// One enriched output row: the input cells plus the derived fields
#[derive(Debug, Clone)]
pub struct EnrichedRow {
    /// Original input cells, untouched
    pub input: Vec<String>,
    /// Normalized identifier, written even when validation rejected it
    pub identifier: String,
    /// Parsed identifier; `None` for degenerate input that skipped lookup
    pub cnpj: Option<Cnpj>,
    /// Flat enrichment fields
    pub fields: FieldSet,
}

impl EnrichedRow {
    /// All output cells for this row, input first
    pub fn output_cells(&self) -> Vec<String> {
        let mut cells = self.input.clone();
        cells.extend(extract::enrichment_cells(&self.identifier, &self.fields));
        cells
    }
}

/// The enriched output table
#[derive(Debug, Clone)]
pub struct EnrichedSet {
    /// Input column headers carried over from the row set
    pub columns: Vec<String>,
    /// Enriched rows, in input order
    pub rows: Vec<EnrichedRow>,
}

impl EnrichedSet {
    /// All output column headers: input columns then enrichment columns
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns = self.columns.clone();
        columns.extend(extract::enrichment_columns());
        columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Storage seam for input and output tables
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Load and validate an input table
    async fn load(&self, path: &Path) -> Result<RowSet>;

    /// Write an enriched table, returning the artifact name
    async fn persist(&self, set: &EnrichedSet) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_identifier_column_is_a_validation_error() {
        let err = RowSet::new(columns(&["name", "city"]), vec![]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn identifier_column_matches_case_insensitively() {
        let set = RowSet::new(
            columns(&["Name", " CNPJ ", "City"]),
            vec![vec![
                "ACME".to_string(),
                "11222333000181".to_string(),
                "SP".to_string(),
            ]],
        )
        .unwrap();
        assert_eq!(set.raw_identifier(0), "11222333000181");
    }

    #[test]
    fn short_rows_are_padded_to_the_column_count() {
        let set = RowSet::new(
            columns(&["cnpj", "name", "city"]),
            vec![vec!["11222333000181".to_string()]],
        )
        .unwrap();
        assert_eq!(set.rows()[0].len(), 3);
        assert_eq!(set.rows()[0][1], "");
    }

    #[test]
    fn output_columns_append_the_enrichment_block() {
        let set = RowSet::new(columns(&["cnpj", "name"]), vec![]).unwrap();
        let enriched = EnrichedSet {
            columns: set.columns().to_vec(),
            rows: vec![],
        };
        let output = enriched.output_columns();
        assert_eq!(output[0], "cnpj");
        assert_eq!(output[1], "name");
        assert_eq!(output[2], "cnpj_normalized");
        assert!(output.iter().any(|c| c == "company_name"));
        assert!(output.iter().any(|c| c == "probable_headquarters"));
        assert_eq!(
            output.len(),
            2 + extract::enrichment_columns().len()
        );
    }

    #[test]
    fn output_cells_line_up_with_output_columns() {
        let row = EnrichedRow {
            input: vec!["11.222.333/0001-81".to_string(), "ACME".to_string()],
            identifier: "11222333000181".to_string(),
            cnpj: Cnpj::parse("11222333000181"),
            fields: FieldSet::default(),
        };
        let enriched = EnrichedSet {
            columns: columns(&["cnpj", "name"]),
            rows: vec![row],
        };
        assert_eq!(
            enriched.rows[0].output_cells().len(),
            enriched.output_columns().len()
        );
    }
}
