//! Conversion between decimal hours and the textual forms found in timesheet
//! exports (`H:MM`, `-H:MM`, `12,5`, `12.5`).
//!
//! [`parse`] is total: anything it cannot read becomes `0.0`, because the
//! exports routinely carry stray formatting. [`parse_strict`] reads the same
//! grammar but reports what it rejects.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Words that mark spreadsheet subtotal rows, compared case-insensitively.
pub const TOTAL_ROW_MARKERS: &[&str] = &["somme", "total"];

/// Spellings of an empty cell left behind by spreadsheet tools.
const NULL_TOKENS: &[&str] = &["nan", "none", "null", "n/a", "-"];

/// Half a minute, in hours. Anything closer to zero formats unsigned.
const SIGN_EPSILON: f64 = 1.0 / 120.0;

pub fn parse(text: &str) -> f64 {
    parse_with_markers(text, TOTAL_ROW_MARKERS)
}

pub fn parse_with_markers<S: AsRef<str>>(text: &str, markers: &[S]) -> f64 {
    match read(text, markers) {
        Ok(v) => v,
        Err(_) => 0.0,
    }
}

pub fn parse_strict(text: &str) -> Result<f64, ParseError> {
    read(text, TOTAL_ROW_MARKERS)
}

pub fn parse_strict_with_markers<S: AsRef<str>>(
    text: &str,
    markers: &[S],
) -> Result<f64, ParseError> {
    read(text, markers)
}

/// True when `text` contains one of `markers`, ignoring case.
pub fn is_total_row<S: AsRef<str>>(text: &str, markers: &[S]) -> bool {
    let lower = text.to_lowercase();
    markers
        .iter()
        .map(|m| m.as_ref().trim().to_lowercase())
        .any(|m| !m.is_empty() && lower.contains(&m))
}

/// True for blank cells and the placeholder spellings of an empty cell.
pub fn is_blank(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || NULL_TOKENS.iter().any(|n| t.eq_ignore_ascii_case(n))
}

fn read<S: AsRef<str>>(text: &str, markers: &[S]) -> Result<f64, ParseError> {
    let t = text.trim();
    if is_blank(t) || is_total_row(t, markers) {
        return Ok(0.0);
    }

    let compact: String = t.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some((h, rest)) = compact.split_once(':') {
        // H:MM:SS exports carry seconds we do not track.
        let m = rest.split(':').next().unwrap_or("");
        let negative = h.starts_with('-');
        let hours: i64 = h
            .parse()
            .map_err(|_| reject(text, "hours part is not an integer"))?;
        let minutes: i64 = m
            .parse()
            .map_err(|_| reject(text, "minutes part is not an integer"))?;
        let magnitude = hours.unsigned_abs() as f64 + minutes as f64 / 60.0;
        return Ok(if negative { -magnitude } else { magnitude });
    }

    let value: f64 = compact
        .replace(',', ".")
        .parse()
        .map_err(|_| reject(text, "not a decimal number"))?;
    if !value.is_finite() {
        return Err(reject(text, "not a finite number"));
    }
    Ok(value)
}

fn reject(text: &str, reason: &str) -> ParseError {
    ParseError {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

/// Formats decimal hours as `[-]HH:MM`.
pub fn format(hours: f64) -> String {
    if !hours.is_finite() {
        return "00:00".to_string();
    }
    let negative = hours < -SIGN_EPSILON;
    let total_minutes = (hours.abs() * 60.0).round() as u64;
    let (h, m) = (total_minutes / 60, total_minutes % 60);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{h:02}:{m:02}")
}

/// How exported hour columns are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationStyle {
    /// `12.50` (or `12,50` with a decimal comma).
    #[default]
    Decimal,
    /// `12:30`.
    Hhmm,
}

impl DurationStyle {
    pub fn render(self, hours: f64, decimal_comma: bool) -> String {
        match self {
            DurationStyle::Decimal => format_decimal(hours, decimal_comma),
            DurationStyle::Hhmm => format(hours),
        }
    }
}

/// Decimal rendering used by exports, with `,` or `.` as separator.
pub fn format_decimal(hours: f64, decimal_comma: bool) -> String {
    let hours = if hours.is_finite() { hours } else { 0.0 };
    // Round to the minute so exports never show float noise.
    let rounded = (hours * 60.0).round() / 60.0;
    let mut s = format!("{:.2}", rounded);
    if s == "-0.00" {
        s = "0.00".to_string();
    }
    if decimal_comma {
        s = s.replace('.', ",");
    }
    s
}
