/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Coerce a cleaned string to a finite f64. Spreadsheet error markers
/// (`#N/A`, `#VALUE!`, ...) and anything else non-numeric yield `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    let c = clean_str(s);
    if c.is_empty() || c.starts_with('#') {
        return None;
    }
    c.parse::<f64>().ok().filter(|v| v.is_finite())
}
