use chrono::NaiveDate;
use serde::Serialize;

use crate::process::header::DATE_COLUMN;

/// One observation row: the parsed date plus one value per vintage column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Row index in the source grid (or input position for release pivots).
    pub source_row: usize,
    /// Raw date token as it appeared in the source.
    pub raw_date: String,
    /// `None` when no date parser recognised `raw_date`.
    pub date: Option<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

/// Date column plus one numeric column per vintage, rows ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl NormalizedTable {
    /// `vintage_columns` excludes `Date`. Rows are re-sorted ascending by date;
    /// rows without a date keep their relative order at the end.
    pub fn new(vintage_columns: Vec<String>, mut rows: Vec<Record>) -> Self {
        let width = vintage_columns.len();
        for r in rows.iter_mut() {
            r.values.resize(width, None);
        }
        rows.sort_by_key(|r| (r.date.is_none(), r.date));

        let mut columns = Vec::with_capacity(width + 1);
        columns.push(DATE_COLUMN.to_string());
        columns.extend(vintage_columns);
        Self { columns, rows }
    }

    /// All column names, `Date` first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Vintage column names, in source order.
    pub fn vintage_columns(&self) -> &[String] {
        &self.columns[1..]
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a vintage column inside [`Record::values`].
    pub fn vintage_index(&self, name: &str) -> Option<usize> {
        self.vintage_columns().iter().position(|c| c == name)
    }

    /// Value of vintage column `name` in row `row`.
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let idx = self.vintage_index(name)?;
        self.rows.get(row)?.values.get(idx).copied().flatten()
    }

    /// Values of one vintage column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.vintage_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source_row: usize, date: Option<NaiveDate>, values: Vec<Option<f64>>) -> Record {
        Record {
            source_row,
            raw_date: date.map(|d| d.to_string()).unwrap_or_default(),
            date,
            values,
        }
    }

    #[test]
    fn test_sorted_with_missing_dates_last() {
        let d = |m| NaiveDate::from_ymd_opt(2020, m, 1);
        let table = NormalizedTable::new(
            vec!["v1".into()],
            vec![
                record(0, None, vec![Some(0.0)]),
                record(1, d(6), vec![Some(6.0)]),
                record(2, d(3), vec![Some(3.0)]),
            ],
        );
        let order: Vec<usize> = table.rows().iter().map(|r| r.source_row).collect();
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(table.columns(), &["Date".to_string(), "v1".to_string()]);
    }

    #[test]
    fn test_value_lookup_and_padding() {
        let table = NormalizedTable::new(
            vec!["a".into(), "b".into()],
            vec![record(0, NaiveDate::from_ymd_opt(2020, 3, 31), vec![Some(1.0)])],
        );
        assert_eq!(table.value(0, "a"), Some(1.0));
        assert_eq!(table.value(0, "b"), None);
        assert_eq!(table.value(0, "missing"), None);
        assert_eq!(table.column_values("a"), Some(vec![Some(1.0)]));
    }
}
