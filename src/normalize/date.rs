//! Timestamp canonicalization and rendering.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use super::error::NormalizeError;

/// Pattern accepted by [`format_date`] for year and month.
pub const YEAR_MONTH: &str = "yyyy-mm";

/// Pattern accepted by [`format_date`] for the full date.
pub const YEAR_MONTH_DAY: &str = "yyyy-mm-dd";

/// Formats with an explicit UTC offset tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Formats without offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A timestamp reduced to what the report shows.
///
/// Midnight collapses to a bare date; anything else keeps hour and minute.
/// Displays as `dd.mm.yyyy` or `dd.mm.yyyy HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalDate {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CanonicalDate {
    /// The calendar date part.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(datetime) => datetime.date(),
        }
    }

    /// Whether a time of day is retained.
    #[must_use]
    pub fn has_time(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%d.%m.%Y")),
            Self::DateTime(datetime) => write!(f, "{}", datetime.format("%d.%m.%Y %H:%M")),
        }
    }
}

/// Parses an ISO-8601-ish timestamp into its canonical form.
///
/// Accepts RFC 3339, timestamps with `T` or space separator with or without
/// offset and fractional seconds, and bare `YYYY-MM-DD` dates. The wall-clock
/// time is kept as written; offsets are not converted. Returns `None` for
/// empty or unparseable input.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<CanonicalDate> {
    let naive = parse_wall_clock(raw.trim())?;
    if naive.hour() == 0 && naive.minute() == 0 {
        Some(CanonicalDate::Date(naive.date()))
    } else {
        let truncated = naive.with_second(0)?.with_nanosecond(0)?;
        Some(CanonicalDate::DateTime(truncated))
    }
}

fn parse_wall_clock(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(raw, format) {
            return Some(datetime.naive_local());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Renders a canonical date as [`YEAR_MONTH`] or [`YEAR_MONTH_DAY`].
///
/// # Errors
///
/// Returns [`NormalizeError::UnsupportedFormat`] for any other pattern.
pub fn format_date(date: &CanonicalDate, pattern: &str) -> Result<String, NormalizeError> {
    let day = date.date();
    match pattern {
        YEAR_MONTH => Ok(day.format("%Y-%m").to_string()),
        YEAR_MONTH_DAY => Ok(day.format("%Y-%m-%d").to_string()),
        other => Err(NormalizeError::UnsupportedFormat {
            pattern: other.to_string(),
        }),
    }
}
