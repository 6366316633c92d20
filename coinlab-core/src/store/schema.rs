//! Feature-table file contract.
//!
//! Column names are exact; order is fixed on write and free on read.
//! Nulls are empty cells in CSV and parquet nulls in Parquet.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const COLUMNS: [&str; 10] = [
    "date",
    "asset_id",
    "price",
    "volume",
    "market_cap",
    "daily_return",
    "ma_7",
    "ma_30",
    "volatility_30d",
    "cumulative_return",
];

/// Columns that carry plain floats (never null).
pub const RAW_NUMERIC: [&str; 3] = ["price", "volume", "market_cap"];

/// Columns that carry derived, possibly-null values.
pub const DERIVED: [&str; 5] = [
    "daily_return",
    "ma_7",
    "ma_30",
    "volatility_30d",
    "cumulative_return",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, RFC 3339, or a bare `YYYY-MM-DD`.
pub fn parse_date(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}
