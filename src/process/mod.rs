// src/process/mod.rs
pub mod date_parser;
pub mod header;
pub mod raw_table;
pub mod table;
pub mod utils;
pub mod workbook;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::io::{Cursor, Read};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::NormalizeError;
pub use header::{locate_header, HeaderLayout};
pub use raw_table::{Cell, RawGrid};
pub use table::{NormalizedTable, Record};
pub use workbook::grid_from_workbook;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Decode a downloaded file into a grid. Workbooks (xlsx packages and legacy
/// xls) go to the sheet reader, other ZIP archives are unpacked for their CSV,
/// anything else is read as delimited text.
pub fn load_grid(bytes: &[u8]) -> Result<RawGrid> {
    if bytes.starts_with(workbook::OLE_MAGIC) {
        return grid_from_workbook(bytes);
    }
    if bytes.starts_with(ZIP_MAGIC) {
        if is_xlsx(bytes) {
            return grid_from_workbook(bytes);
        }
        return grid_from_zip(bytes);
    }
    grid_from_csv(bytes)
}

fn is_xlsx(bytes: &[u8]) -> bool {
    ZipArchive::new(Cursor::new(bytes))
        .map(|archive| {
            archive
                .file_names()
                .any(|name| name == workbook::XLSX_WORKBOOK_ENTRY)
        })
        .unwrap_or(false)
}

/// Read CSV bytes into a [`RawGrid`]. No header handling happens here; records
/// may have different field counts.
pub fn grid_from_csv(bytes: &[u8]) -> Result<RawGrid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(bytes));

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(record.iter().map(Cell::from_raw).collect());
    }
    debug!(rows = rows.len(), "read csv grid");
    Ok(RawGrid::new(rows))
}

/// Read the first `.csv` entry of a ZIP archive into a [`RawGrid`].
pub fn grid_from_zip(bytes: &[u8]) -> Result<RawGrid> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Failed to read ZIP archive")?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to access ZIP entry #{}", i))?;
        let name = entry.name().to_string();
        if !entry.is_file() || !name.to_lowercase().ends_with(".csv") {
            continue;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {} into memory", name))?;
        info!(entry = %name, bytes = buf.len(), "reading csv from zip");
        return grid_from_csv(&buf).with_context(|| format!("parsing {}", name));
    }

    Err(anyhow!("ZIP archive has no .csv entry"))
}

/// Header Locator + Date Parser: turn a raw grid into a [`NormalizedTable`].
///
/// Fully blank rows are skipped. Rows whose date cannot be parsed are kept with
/// `date == None` so they can still be displayed; they sort last.
#[tracing::instrument(level = "info", skip(grid), fields(rows = grid.len()))]
pub fn normalize_grid(grid: &RawGrid) -> Result<NormalizedTable, NormalizeError> {
    let layout = locate_header(grid)?;
    let width = grid.width_from(layout.data_start);
    let mut columns = header::column_names(&layout.labels, width);
    let vintage_columns = columns.split_off(1);
    let vintage_count = vintage_columns.len();

    let mut records = Vec::new();
    let mut unparsed = 0usize;
    for (source_row, row) in grid.rows.iter().enumerate().skip(layout.data_start) {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let date_cell = row.first().unwrap_or(&Cell::Empty);
        let date = date_parser::parse_date(date_cell);
        if date.is_none() {
            unparsed += 1;
            debug!(source_row, token = %date_cell, "unparseable date");
        }
        let values = (1..=vintage_count)
            .map(|i| row.get(i).and_then(Cell::as_f64))
            .collect();
        records.push(Record {
            source_row,
            raw_date: date_cell.to_string(),
            date,
            values,
        });
    }

    if unparsed > 0 {
        warn!(unparsed, "rows with unparseable dates");
    }
    info!(
        header_row = layout.header_row,
        vintages = vintage_count,
        rows = records.len(),
        "normalized grid"
    );

    Ok(NormalizedTable::new(vintage_columns, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const PHIL_CSV: &str = "Real GDP, billions of chained dollars\n\
,,\n\
DATE,ROUTPUT65Q4,ROUTPUT66Q1\n\
,,\n\
1947:Q1,306.4,306.4\n\
1947:Q2,309,309.1\n\
,,\n\
1947:Q3,#N/A,310.5\n";

    #[test]
    fn test_grid_from_csv_ragged() -> Result<()> {
        let grid = grid_from_csv(b"a,b,c\n1\n\"x\",2.5\n")?;
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.rows[1], vec![Cell::Number(1.0)]);
        assert_eq!(grid.rows[2], vec![Cell::Text("x".into()), Cell::Number(2.5)]);
        Ok(())
    }

    #[test]
    fn test_normalize_single_vintage_layout() -> Result<()> {
        let grid = grid_from_csv(PHIL_CSV.as_bytes())?;
        let table = normalize_grid(&grid)?;

        assert_eq!(table.columns(), &["Date", "ROUTPUT65Q4", "ROUTPUT66Q1"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].date, Some(ymd(1947, 3, 31)));
        assert_eq!(table.rows()[2].date, Some(ymd(1947, 9, 30)));
        assert_eq!(table.value(1, "ROUTPUT66Q1"), Some(309.1));
        assert_eq!(table.value(2, "ROUTPUT65Q4"), None);
        Ok(())
    }

    #[test]
    fn test_normalize_keeps_unparseable_rows_last() {
        let grid = RawGrid::from_strings(vec![
            vec!["Date", "A"],
            vec!["Date", "2023-11-01"],
            vec!["footnote", "1"],
            vec!["2000:Q2", "2"],
            vec!["2000:Q1", "3"],
        ]);
        let table = normalize_grid(&grid).unwrap();
        let dates: Vec<_> = table.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![Some(ymd(2000, 3, 31)), Some(ymd(2000, 6, 30)), None]);
        assert_eq!(table.rows()[2].raw_date, "footnote");
        assert_eq!(table.rows()[2].source_row, 2);
    }

    #[test]
    fn test_normalize_fatal_errors() {
        let grid = RawGrid::from_strings(vec![vec!["no header here"]]);
        assert!(matches!(
            normalize_grid(&grid),
            Err(NormalizeError::HeaderNotFound { .. })
        ));
    }

    #[test]
    fn test_load_grid_from_zip() -> Result<()> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("readme.txt", options.clone())?;
            zip.write_all(b"not data")?;
            zip.start_file("routput.csv", options)?;
            zip.write_all(PHIL_CSV.as_bytes())?;
            zip.finish()?;
        }

        let grid = load_grid(&buf)?;
        assert_eq!(grid, grid_from_csv(PHIL_CSV.as_bytes())?);
        Ok(())
    }

    #[test]
    fn test_zip_without_csv_is_error() -> Result<()> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("notes/readme.txt", options)?;
            zip.write_all(b"no data here")?;
            zip.finish()?;
        }
        assert!(load_grid(&buf).is_err());
        Ok(())
    }

    #[test]
    fn test_load_grid_dispatches_xlsx() -> Result<()> {
        let bytes = workbook::tests::vintage_xlsx();
        assert!(is_xlsx(&bytes));

        let table = normalize_grid(&load_grid(&bytes)?)?;
        assert_eq!(table.columns(), &["Date", "2023-11-04", "2023-12-04"]);
        assert_eq!(table.rows()[0].date, Some(ymd(2023, 6, 30)));
        assert_eq!(table.value(0, "2023-12-04"), Some(100.5));
        assert_eq!(table.value(1, "2023-11-04"), None);
        Ok(())
    }
}
