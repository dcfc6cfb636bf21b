// src/process/workbook.rs
//! Spreadsheet workbooks (xlsx, xls, ods) read into a [`RawGrid`]: first sheet
//! only, typed cells mapped onto [`Cell`].

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::{debug, info};

use crate::process::date_parser::{from_serial, parse_date_text};
use crate::process::raw_table::{Cell, RawGrid};

/// Entry every xlsx package carries.
pub const XLSX_WORKBOOK_ENTRY: &str = "xl/workbook.xml";

/// Compound-document magic of legacy `.xls` files.
pub const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            from_serial(serial).map_or(Cell::Number(serial), Cell::Date)
        }
        Data::DateTimeIso(s) => parse_date_text(s).map_or_else(|| Cell::Text(s.clone()), Cell::Date),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Lay a sheet range out from cell `A1`. Readers drop leading blank rows and
/// columns, the header locator needs them back.
fn range_to_grid(range: &Range<Data>) -> RawGrid {
    let (row0, col0) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row0 as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col0 as usize];
        cells.extend(row.iter().map(to_cell));
        rows.push(cells);
    }
    RawGrid::new(rows)
}

/// Read the first sheet of a workbook.
pub fn grid_from_workbook(bytes: &[u8]) -> Result<RawGrid> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open workbook")?;
    let sheets = workbook.sheet_names();
    debug!(?sheets, "opened workbook");

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no sheets"))?
        .with_context(|| format!("Failed to read sheet {:?}", sheets.first()))?;

    let grid = range_to_grid(&range);
    info!(sheet = ?sheets.first(), rows = grid.len(), "read workbook sheet");
    Ok(grid)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="ROUTPUT" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

    /// Vintage sheet shaped like the real-time dataset: a title in A1, the
    /// `Date` header in row 3, date-formatted serial labels in row 4.
    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Real GNP/GDP</t></is></c></row>
<row r="3"><c r="A3" t="inlineStr"><is><t>Date</t></is></c></row>
<row r="4"><c r="A4" t="inlineStr"><is><t>Date</t></is></c><c r="B4" s="1"><v>45234</v></c><c r="C4" s="1"><v>45264</v></c></row>
<row r="5"><c r="A5" t="inlineStr"><is><t>2023:Q2</t></is></c><c r="B5"><v>100</v></c><c r="C5"><v>100.5</v></c></row>
<row r="6"><c r="A6" t="inlineStr"><is><t>2023:Q3</t></is></c><c r="C6"><v>102</v></c></row>
</sheetData></worksheet>"#;

    /// Minimal single-sheet xlsx package.
    pub(crate) fn vintage_xlsx() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, body) in [
                ("[Content_Types].xml", CONTENT_TYPES),
                ("_rels/.rels", RELS),
                ("xl/workbook.xml", WORKBOOK),
                ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
                ("xl/styles.xml", STYLES),
                ("xl/worksheets/sheet1.xml", SHEET),
            ] {
                zip.start_file(name, options.clone()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_to_cell() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(to_cell(&Data::Float(306.4)), Cell::Number(306.4));
        assert_eq!(to_cell(&Data::String("1947:Q1".into())), Cell::Text("1947:Q1".into()));
        assert_eq!(
            to_cell(&Data::DateTimeIso("2023-11-04T00:00:00".into())),
            Cell::Date(NaiveDate::from_ymd_opt(2023, 11, 4).unwrap())
        );
    }

    #[test]
    fn test_grid_from_workbook() -> Result<()> {
        let grid = grid_from_workbook(&vintage_xlsx())?;
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.rows[0][0], Cell::Text("Real GNP/GDP".into()));
        assert!(grid.rows[1].iter().all(Cell::is_empty));
        assert_eq!(grid.rows[2][0], Cell::Text("Date".into()));
        assert_eq!(grid.rows[4][1].as_f64(), Some(100.0));
        assert_eq!(grid.rows[5][1], Cell::Empty);
        Ok(())
    }

    #[test]
    fn test_garbage_is_not_a_workbook() {
        assert!(grid_from_workbook(b"Date,A\n1947:Q1,1\n").is_err());
    }
}
