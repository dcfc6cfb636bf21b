// src/error.rs

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Conditions that abort a normalization run. No partial result is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no header row found: scanned {rows_scanned} rows for a first cell matching the word `date`")]
    HeaderNotFound { rows_scanned: usize },

    #[error("header row {header_row} is the last row; expected a vintage label row below it")]
    VintageRowMissing { header_row: usize },

    #[error("rolling window must be at least 1 quarter, got {window}")]
    InvalidWindow { window: usize },
}

/// Per-row conditions that are reported but never fail the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssue {
    /// The date cell matched none of the date parsers; the row is left out of the series.
    UnparseableDate { source_row: usize, token: String },
    /// Every vintage column is empty for this date; derived values stay missing.
    AllVintagesMissing { date: NaiveDate },
    /// A later row repeated an already-seen date and was left out.
    DuplicateDate { source_row: usize, date: NaiveDate },
}
