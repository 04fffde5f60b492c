use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::str::FromStr;

const TIMESTAMP_FORMATS: [&str; 8] = [
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Splits an export timestamp into ISO `(date, time)` strings.
pub fn split_timestamp(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| {
            (
                ts.format("%Y-%m-%d").to_string(),
                ts.format("%H:%M:%S").to_string(),
            )
        })
}

/// Parses a currency cell such as `$1,234.50` or `($12.50)`. Blank cells are zero.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => Decimal::from_str(inner).ok().map(|d| -d),
        None => Decimal::from_str(&cleaned).ok(),
    }
}

/// Parses a whole-number cell; `"3"` and `"3.0"` are both accepted.
pub fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = Decimal::from_str(raw).ok()?;
    if value.fract().is_zero() {
        i64::try_from(value).ok()
    } else {
        None
    }
}
