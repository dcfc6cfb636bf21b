//! Observation-date parsing.
//!
//! A token is offered to each parser in [`PARSERS`] in turn; the first one that
//! recognises it wins. Tokens nobody recognises come back as `None`, and the
//! caller decides what to do with those rows.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::raw_table::Cell;
use crate::process::utils::clean_str;

/// `1965:Q1`, `1965Q1`, `1965-Q1`, `1965/Q1`, `1965 Q1`.
static QUARTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[:\-/ ]?Q([1-4])$").expect("quarter pattern should compile"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Largest serial a spreadsheet accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

type DateAttempt = fn(&Cell) -> Option<NaiveDate>;

const PARSERS: &[DateAttempt] = &[parse_native, parse_quarter, parse_serial];

/// Parse one date-like cell. Total: unrecognised tokens yield `None`.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    PARSERS.iter().find_map(|attempt| attempt(cell))
}

/// Parse a whole column; output has the same length as the input.
pub fn parse_dates(cells: &[Cell]) -> Vec<Option<NaiveDate>> {
    cells.iter().map(parse_date).collect()
}

/// Last calendar day of `quarter` (1–4) in `year`.
pub fn quarter_end(year: i32, quarter: u32) -> Option<NaiveDate> {
    let (month, day) = match quarter {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        4 => (12, 31),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Spreadsheet serial day number (1899-12-30 origin) to a date. Any time-of-day
/// fraction is dropped.
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let origin = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    origin.checked_add_days(Days::new(serial.floor() as u64))
}

/// Explicit calendar dates and timestamps written as text, or native date cells.
pub(crate) fn parse_native(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date_text(&clean_str(s)),
        _ => None,
    }
}

pub(crate) fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    {
        return Some(d);
    }
    if let Some(ts) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(ts.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn parse_quarter(cell: &Cell) -> Option<NaiveDate> {
    let Cell::Text(s) = cell else {
        return None;
    };
    let s = clean_str(s);
    let caps = QUARTER_RE.captures(&s)?;
    let year: i32 = caps[1].parse().ok()?;
    let quarter: u32 = caps[2].parse().ok()?;
    quarter_end(year, quarter)
}

fn parse_serial(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => from_serial(*n),
        Cell::Text(s) => clean_str(s).parse::<f64>().ok().and_then(from_serial),
        _ => None,
    }
}
