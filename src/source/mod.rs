//! Record loading from tabular input
//!
//! The source reads a CSV file synchronously, before orchestration begins,
//! and yields one [`Record`] per well-formed row. Column names are
//! configurable so any CSV carrying an identifier column and a free-text
//! column can feed the pipeline.
//!
//! Malformed rows are rejected individually, never aborting the whole load:
//! each rejection is reported as a warning carrying the offending line
//! number. A missing file or a missing configured column header is fatal.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

/// One input row: the identifier used for notification correlation and the
/// text subject to analysis. Immutable after load; owned by exactly one
/// pipeline task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub text: String,
}

/// A row the loader rejected, with the CSV line it came from.
#[derive(Debug, Clone)]
pub struct RowWarning {
    pub line: u64,
    pub message: String,
}

/// Outcome of loading one file: accepted records plus per-row rejections.
#[derive(Debug)]
pub struct LoadOutcome {
    pub records: Vec<Record>,
    pub rejected: Vec<RowWarning>,
}

/// CSV decoder configured with the columns to extract.
pub struct CsvSource {
    text_column: String,
    id_column: String,
}

impl CsvSource {
    pub fn new(text_column: &str, id_column: &str) -> Self {
        Self {
            text_column: text_column.to_string(),
            id_column: id_column.to_string(),
        }
    }

    /// Read every row of `path` into records. Rows missing the identifier or
    /// failing to parse are collected as warnings instead of aborting.
    pub fn load(&self, path: &Path) -> Result<LoadOutcome> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("cannot read input file {}", path.display()))?;

        let headers = reader.headers().context("cannot read CSV headers")?.clone();
        let id_idx = self.column_index(&headers, &self.id_column)?;
        let text_idx = self.column_index(&headers, &self.text_column)?;

        let mut records = Vec::new();
        let mut rejected = Vec::new();

        for row in reader.records() {
            match row {
                Ok(row) => {
                    let line = row.position().map_or(0, |p| p.line());
                    let id = row.get(id_idx).unwrap_or("").trim();
                    let text = row.get(text_idx).unwrap_or("").trim();

                    if id.is_empty() {
                        rejected.push(RowWarning {
                            line,
                            message: format!("missing value for column '{}'", self.id_column),
                        });
                        continue;
                    }

                    records.push(Record {
                        id: id.to_string(),
                        text: text.to_string(),
                    });
                }
                Err(e) => {
                    let line = e.position().map_or(0, |p| p.line());
                    rejected.push(RowWarning {
                        line,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(LoadOutcome { records, rejected })
    }

    fn column_index(&self, headers: &csv::StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("input file has no column named '{name}'"))
    }
}
