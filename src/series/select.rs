use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

use crate::process::date_parser::parse_date;
use crate::process::raw_table::Cell;
use crate::process::table::NormalizedTable;

/// Trailing duplicate marker appended by label de-duplication.
static DUP_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d+$").expect("suffix pattern should compile"));

/// Which estimate to keep for each observation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Earliest published estimate (as originally reported).
    First,
    /// Most recently revised estimate.
    #[default]
    Latest,
}

impl SelectionMode {
    pub fn as_str(&self) -> &str {
        match self {
            SelectionMode::First => "first",
            SelectionMode::Latest => "latest",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(SelectionMode::First),
            "latest" => Ok(SelectionMode::Latest),
            other => Err(anyhow::anyhow!(
                "unknown selection mode `{}` (expected `first` or `latest`)",
                other
            )),
        }
    }
}

/// Date encoded at the front of a vintage column name, ignoring any `_<n>` suffix.
pub fn vintage_date(name: &str) -> Option<NaiveDate> {
    let stem = DUP_SUFFIX_RE.replace(name.trim(), "");
    parse_date(&Cell::Text(stem.into_owned()))
}

/// Indexes of the vintage columns that hold at least one value, in
/// chronological order.
///
/// Columns whose names parse as dates are sorted among the slots they
/// occupy; columns with unparseable names stay where they were.
pub fn ordered_columns(table: &NormalizedTable) -> Vec<usize> {
    let active: Vec<(usize, Option<NaiveDate>)> = table
        .vintage_columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| table.rows().iter().any(|r| r.values[*idx].is_some()))
        .map(|(idx, name)| (idx, vintage_date(name)))
        .collect();

    let mut dated: Vec<(NaiveDate, usize)> = active
        .iter()
        .filter_map(|&(idx, date)| date.map(|d| (d, idx)))
        .collect();
    dated.sort();

    let mut dated = dated.into_iter().map(|(_, idx)| idx);
    let order: Vec<usize> = active
        .iter()
        .map(|&(idx, date)| match date {
            Some(_) => dated.next().unwrap_or(idx),
            None => idx,
        })
        .collect();

    debug!(
        active = order.len(),
        total = table.vintage_columns().len(),
        "ordered vintage columns"
    );
    order
}

/// One selected value per table row.
///
/// `Latest` forward-fills each row across the ordered vintages and takes the
/// last cell; `First` back-fills and takes the first. Rows with no value in
/// any vintage come back as `None`.
pub fn select_values(table: &NormalizedTable, mode: SelectionMode) -> Vec<Option<f64>> {
    if table.vintage_columns().is_empty() {
        return vec![None; table.len()];
    }
    let order = ordered_columns(table);

    table
        .rows()
        .iter()
        .map(|row| {
            let mut present = order.iter().filter_map(|&c| row.values[c]);
            match mode {
                SelectionMode::First => present.next(),
                SelectionMode::Latest => present.last(),
            }
        })
        .collect()
}
