use chrono::NaiveDate;
use std::fmt;

use crate::process::utils::{clean_str, parse_number};

/// A single spreadsheet cell, as handed over by whatever reader decoded the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Build a cell from raw delimited text: trimmed and unquoted.
    ///
    /// The cell is numeric only when the number prints back as the same text.
    /// Anything else (`45234.10`, `1e3`, `100.0`) stays text so labels keep
    /// their digits; [`Cell::as_f64`] still reads it as a number.
    pub fn from_raw(raw: &str) -> Self {
        let c = clean_str(raw);
        if c.is_empty() {
            return Cell::Empty;
        }
        match c.parse::<f64>() {
            Ok(n) if n.is_finite() && n.to_string() == c => Cell::Number(n),
            _ => Cell::Text(c),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            Cell::Date(_) => false,
        }
    }

    /// Numeric view of the cell; anything that is not a finite number is missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_number(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::from_raw(s)
    }
}

/// Un-parsed 2-D grid of cells. Rows are not required to share a length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Convenience for string literals: every cell goes through [`Cell::from_raw`].
    pub fn from_strings<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|s| Cell::from_raw(s.as_ref())).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<&[Cell]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Widest row from `start` on.
    pub fn width_from(&self, start: usize) -> usize {
        self.rows
            .iter()
            .skip(start)
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }
}
