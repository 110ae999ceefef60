//! Value normalizer: money and date parsing for spreadsheet-sourced cells.
//!
//! Unparsable cells come back as `None` ("missing"), never as zero. Callers
//! treat a missing value as disqualifying for any tolerance comparison.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::table::Value;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Parse a monetary cell:
/// - Strip currency symbols, thousands separators, whitespace
/// - `(123.45)` → `-123.45`
/// - Returns None if non-numeric characters remain after stripping
pub fn parse_money(value: &Value) -> Option<Decimal> {
    match value {
        Value::Empty => None,
        Value::Number(n) if n.is_finite() => Decimal::from_f64(*n),
        Value::Number(_) => None,
        Value::Text(s) => parse_money_str(s),
    }
}

pub fn parse_money_str(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            _ => return None,
        }
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if is_negative { -value } else { value })
}

/// Absolute amount; for columns whose polarity is implied by the column itself.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    parse_money(value).map(|d| d.abs())
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Labels that show up in the date column of bank exports but are not dates.
const NON_DATE_TOKENS: [&str; 6] = ["OPERACIÓN", "OPERACION", "OPERATION", "SALDO", "BALANCE", "NAN"];

/// Day-first formats, tried in order.
const DATE_FORMATS: [&str; 9] = [
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%y", "%d-%m-%y",
    "%d-%b-%Y", "%d %b %Y",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL: i64 = 2_958_465;

fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Robust date parsing. Strategies, first non-missing result wins:
/// 1. known non-date tokens → missing
/// 2. eight digits → `DDMMYYYY`
/// 3. calendar text, day before month
/// 4. purely numeric → spreadsheet serial (epoch 1899-12-30)
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = match value {
        Value::Empty => return None,
        other => other.to_string(),
    };
    let s = text.trim();

    if s.is_empty() || NON_DATE_TOKENS.contains(&s.to_uppercase().as_str()) {
        return None;
    }

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(d) = NaiveDate::parse_from_str(s, "%d%m%Y") {
            return Some(d);
        }
    } else if let Some(d) = parse_calendar(s) {
        return Some(d);
    }

    parse_serial(s)
}

/// Parse a whole column; row order of the output matches the input.
pub fn parse_date_column<'a, I>(values: I) -> Vec<Option<NaiveDate>>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().map(parse_date).collect()
}

fn parse_calendar(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

fn parse_serial(s: &str) -> Option<NaiveDate> {
    let numeric = s
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && c == '-'));
    if !numeric {
        return None;
    }
    let serial: f64 = s.parse().ok()?;
    let days = serial.floor() as i64;
    if !(1..=MAX_SERIAL).contains(&days) {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(days))
}

/// Output format for every date written back to a table.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
