// Lenient scalar parsing for hand-entered roster values.
//
// Roster fields arrive as JSON numbers, numeric strings, spreadsheet
// leftovers, or nothing at all. Every parser here maps anything unusable to
// `None` instead of failing.

use serde_json::Value;

/// Parse a numeric field. Accepts finite JSON numbers and trimmed numeric
/// strings; rejects empty strings, formula-like strings (`=...`, `@...`),
/// and non-finite values.
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s.starts_with('=') || s.starts_with('@') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a text field: trimmed, empty normalized to `None`. Numbers are
/// rendered as text so numeric ids survive.
pub fn parse_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a school grade. Only whole grades 6 through 12 are kept; `"9th"`
/// style suffixes are tolerated.
pub fn parse_grade(value: Option<&Value>) -> Option<u8> {
    let number = match value? {
        Value::String(s) => {
            let trimmed = s.trim().to_ascii_lowercase();
            let digits = trimmed
                .strip_suffix("th")
                .or_else(|| trimmed.strip_suffix("st"))
                .or_else(|| trimmed.strip_suffix("nd"))
                .or_else(|| trimmed.strip_suffix("rd"))
                .unwrap_or(trimmed.as_str());
            parse_numeric_str(digits)?
        }
        other => parse_number(Some(other))?,
    };
    if number.fract() != 0.0 || !(6.0..=12.0).contains(&number) {
        return None;
    }
    Some(number as u8)
}
