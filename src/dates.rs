//! Free-text date range parsing for tile captions such as `12-14 Janvier 2024`.
//!
//! Three surface forms are recognised, tried in order:
//!
//! | form                       | example                              |
//! |----------------------------|--------------------------------------|
//! | same month                 | `12-14 Janvier 2024`                 |
//! | same year, different month | `12 Janvier - 14 Février 2024`       |
//! | different years            | `31 Décembre 2023 - 03 Janvier 2024` |
//!
//! Each side is then read as `<day> <full French month name> <year>`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

static SAME_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2}) (\w+) (\d{4})$").expect("valid regex"));
static SAME_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}) (\w+) - (\d{1,2}) (\w+) (\d{4})$").expect("valid regex")
});
static DIFFERENT_YEARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}) (\w+) (\d{4}) - (\d{1,2}) (\w+) (\d{4})$").expect("valid regex")
});

const MONTHS: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("unknown date pattern: '{0}'")]
    UnknownPattern(String),
}

/// Which surface form matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePattern {
    SameMonth,
    SameYear,
    DifferentYears,
}

/// Parsed range. A side that matched structurally but is not a real calendar
/// date is left unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub pattern: RangePattern,
    pub raw_start: String,
    pub raw_end: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Parse a single `<day> <Month> <year>` side.
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split_whitespace();
    let day: u32 = parts.next()?.parse().ok()?;
    let month_name = parts.next()?.to_lowercase();
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn parse_date_range(text: &str) -> Result<DateRange, DateRangeError> {
    let text = text.trim();

    let (pattern, raw_start, raw_end) = if let Some(c) = SAME_MONTH.captures(text) {
        let end = format!("{} {} {}", &c[2], &c[3], &c[4]);
        let start = format!("{} {} {}", &c[1], &c[3], &c[4]);
        (RangePattern::SameMonth, start, end)
    } else if let Some(c) = SAME_YEAR.captures(text) {
        let end = format!("{} {} {}", &c[3], &c[4], &c[5]);
        let start = format!("{} {} {}", &c[1], &c[2], &c[5]);
        (RangePattern::SameYear, start, end)
    } else if let Some(c) = DIFFERENT_YEARS.captures(text) {
        let start = format!("{} {} {}", &c[1], &c[2], &c[3]);
        let end = format!("{} {} {}", &c[4], &c[5], &c[6]);
        (RangePattern::DifferentYears, start, end)
    } else {
        return Err(DateRangeError::UnknownPattern(text.to_string()));
    };
    debug!("{:?}: '{}' >> '{}' '{}'", pattern, text, raw_start, raw_end);

    let start = parse_day(&raw_start);
    if start.is_none() {
        warn!("Unable to parse the start date: {}", raw_start);
    }
    let end = parse_day(&raw_end);
    if end.is_none() {
        warn!("Unable to parse the end date: {}", raw_end);
    }

    Ok(DateRange {
        pattern,
        raw_start,
        raw_end,
        start,
        end,
    })
}
