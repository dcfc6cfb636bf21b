//! Header discovery and vintage-label canonicalization for the real-time
//! dataset layout: a `Date` header row, a row of vintage labels below it,
//! observations from the row after that.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::error::NormalizeError;
use crate::process::date_parser::{from_serial, parse_date_text};
use crate::process::raw_table::{Cell, RawGrid};
use crate::process::utils::clean_str;

pub const DATE_COLUMN: &str = "Date";

static DATE_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdate\b").expect("date word pattern should compile"));

/// Serial number with an optional `.<n>` duplicate marker, e.g. `45234` or `45234.1`.
static SERIAL_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?$").expect("serial label pattern should compile")
});

/// Where the header, the vintage labels and the data live inside a [`RawGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub header_row: usize,
    pub vintage_row: usize,
    pub data_start: usize,
    /// Raw labels, one per column, column 0 being the date column.
    pub labels: Vec<Cell>,
}

fn is_date_header(cell: &Cell) -> bool {
    match cell {
        Cell::Text(s) => DATE_WORD_RE.is_match(s.trim()),
        _ => false,
    }
}

/// Find the header row and the vintage-label row below it.
#[tracing::instrument(level = "debug", skip(grid), fields(rows = grid.len()))]
pub fn locate_header(grid: &RawGrid) -> Result<HeaderLayout, NormalizeError> {
    let header_row = grid
        .rows
        .iter()
        .position(|row| row.first().is_some_and(is_date_header))
        .ok_or(NormalizeError::HeaderNotFound {
            rows_scanned: grid.len(),
        })?;

    let vintage_row = header_row + 1;
    let vintage = grid
        .row(vintage_row)
        .ok_or(NormalizeError::VintageRowMissing { header_row })?;

    let labels = if vintage.iter().skip(1).all(Cell::is_empty) {
        debug!(header_row, "vintage row is blank, reusing header labels");
        grid.rows[header_row].clone()
    } else {
        vintage.to_vec()
    };

    debug!(header_row, vintage_row, labels = labels.len(), "located header");
    Ok(HeaderLayout {
        header_row,
        vintage_row,
        data_start: header_row + 2,
        labels,
    })
}

/// Canonical name for a vintage label found in column `column`.
///
/// Tried in order: explicit date or timestamp, spreadsheet serial number
/// (with an optional `.<n>` duplicate marker kept as `_<n>`), the raw text.
/// Blank labels become `Vintage_<column>`.
pub fn canonicalize_label(label: &Cell, column: usize) -> String {
    let canonical = match label {
        Cell::Empty => None,
        Cell::Date(d) => Some(iso(*d)),
        Cell::Number(n) if n.fract() == 0.0 => from_serial(*n).map(iso),
        Cell::Number(n) => canonicalize_text(&n.to_string()),
        Cell::Text(s) => canonicalize_text(s),
    };
    canonical.unwrap_or_else(|| format!("Vintage_{}", column))
}

fn canonicalize_text(raw: &str) -> Option<String> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }
    if let Some(d) = parse_date_text(&s) {
        return Some(iso(d));
    }
    if let Some(caps) = SERIAL_LABEL_RE.captures(&s) {
        let date = caps[1].parse::<f64>().ok().and_then(from_serial);
        if let Some(date) = date {
            let dup = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|n| *n > 0);
            return Some(match dup {
                Some(n) => format!("{}_{}", iso(date), n),
                None => iso(date),
            });
        }
    }
    Some(s)
}

fn iso(d: chrono::NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Make every label unique: a repeat of `A` becomes `A_1`, then `A_2`, ...
pub fn unique_labels(labels: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(labels.len());
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(labels.len());

    for label in labels {
        let mut name = label.clone();
        if taken.contains(&name) {
            let n = counters.entry(label.clone()).or_insert(0);
            loop {
                *n += 1;
                let candidate = format!("{}_{}", label, n);
                if !taken.contains(&candidate) {
                    name = candidate;
                    break;
                }
            }
            trace!(label = %label, renamed = %name, "deduplicated column label");
        }
        taken.insert(name.clone());
        out.push(name);
    }
    out
}

/// Final column names for a table `width` columns wide: `Date` first, then the
/// canonical, de-duplicated vintage labels.
pub fn column_names(labels: &[Cell], width: usize) -> Vec<String> {
    let width = width.max(labels.len()).max(1);
    let names = std::iter::once(DATE_COLUMN.to_string())
        .chain((1..width).map(|i| canonicalize_label(labels.get(i).unwrap_or(&Cell::Empty), i)))
        .collect();
    unique_labels(names)
}
