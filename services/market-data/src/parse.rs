//! Field parsers for raw log columns
//!
//! Every parser here is total: bad text becomes `None` or an empty list,
//! never an error. Callers decide whether a missing field makes the record
//! unusable.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Naive datetime layouts accepted for the `timestamp` column, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a finite decimal. Empty text, `NaN` and infinities are `None`.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parse an optional column as a finite decimal.
pub fn parse_field(raw: Option<&str>) -> Option<Decimal> {
    raw.and_then(parse_number)
}

/// Parse a numeric list written as `[1, 2, 3]` or delimited by `,` `;` `|`
/// or whitespace. Any unparseable element empties the whole list.
pub fn parse_list(raw: &str) -> Vec<Decimal> {
    let trimmed = raw.trim().trim_matches('"').trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let mut values = Vec::new();
    for token in inner
        .split(|c: char| c == ',' || c == ';' || c == '|' || c.is_whitespace())
        .filter(|token| !token.is_empty())
    {
        match parse_number(token) {
            Some(value) => values.push(value),
            None => return Vec::new(),
        }
    }
    values
}

/// Parse a direct timestamp column into Unix milliseconds.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (UTC), or an integer epoch.
/// Integer epochs are scaled by magnitude: seconds, milliseconds,
/// microseconds and nanoseconds are all recognised.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(epoch) = trimmed.parse::<i64>() {
        return Some(scale_epoch(epoch));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(trimmed, format)
            .ok()
            .map(|naive| naive.and_utc().timestamp_millis())
    })
}

/// Combine an exchange-clock pair: `ssboe * 1000 + floor(usecs / 1000)`.
pub fn exchange_clock_millis(ssboe: &str, usecs: &str) -> Option<i64> {
    let seconds = parse_number(ssboe)?.trunc().to_i64()?;
    let micros = parse_number(usecs)?.trunc().to_i64()?;
    seconds
        .checked_mul(1000)?
        .checked_add(micros.div_euclid(1000))
}

fn scale_epoch(epoch: i64) -> i64 {
    let magnitude = epoch.unsigned_abs();
    if magnitude >= 100_000_000_000_000_000 {
        epoch / 1_000_000
    } else if magnitude >= 100_000_000_000_000 {
        epoch / 1_000
    } else if magnitude >= 100_000_000_000 {
        epoch
    } else {
        epoch * 1_000
    }
}
