use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::process::table::{NormalizedTable, Record};

/// One published estimate as returned by a statistical-release API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Quarter the value describes.
    pub observation: NaiveDate,
    pub value: Option<f64>,
    /// Date the estimate was first published.
    pub published: NaiveDate,
}

/// Pivot release triples into the same shape a spreadsheet normalizes to:
/// one column per publication date, one row per observation date.
/// A repeated (observation, published) pair keeps the later entry.
pub fn table_from_releases(releases: &[Release]) -> NormalizedTable {
    let vintages: Vec<NaiveDate> = releases
        .iter()
        .map(|r| r.published)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let column_of: BTreeMap<NaiveDate, usize> =
        vintages.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    // observation -> (first input position, values)
    let mut rows: BTreeMap<NaiveDate, (usize, Vec<Option<f64>>)> = BTreeMap::new();
    for (pos, r) in releases.iter().enumerate() {
        let (_, values) = rows
            .entry(r.observation)
            .or_insert_with(|| (pos, vec![None; vintages.len()]));
        values[column_of[&r.published]] = r.value.filter(|v| v.is_finite());
    }

    debug!(
        releases = releases.len(),
        vintages = vintages.len(),
        observations = rows.len(),
        "pivoted releases"
    );

    let records = rows
        .into_iter()
        .map(|(date, (source_row, values))| Record {
            source_row,
            raw_date: date.format("%Y-%m-%d").to_string(),
            date: Some(date),
            values,
        })
        .collect();
    let columns = vintages
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    NormalizedTable::new(columns, records)
}
