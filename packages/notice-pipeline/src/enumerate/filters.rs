//! Inclusion filters applied while enumerating.

use chrono::NaiveDate;

use crate::error::{SourceError, SourceResult};
use crate::types::config::Filters;

/// Recency markers are day-first: `dd/mm/yyyy`.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Case-insensitive substring match against the filter's keyword set.
///
/// An empty keyword set matches everything.
pub fn matches_keywords(title: &str, filters: &Filters) -> bool {
    if filters.keywords.is_empty() {
        return true;
    }
    let lower = title.to_lowercase();
    filters.keywords.iter().any(|kw| lower.contains(kw.as_str()))
}

/// Parse a recency marker, tolerating surrounding whitespace and brackets.
pub fn parse_marker(raw: &str) -> SourceResult<NaiveDate> {
    let cleaned = raw.trim().trim_matches(|c| c == '(' || c == ')').trim();
    NaiveDate::parse_from_str(cleaned, DATE_FORMAT).map_err(|e| SourceError::DateParse {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Absolute number of days between `date` and `today`.
pub fn days_between(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days().abs()
}

/// Check a raw marker against the recency window.
///
/// Returns `Ok(true)` when there is no window. A malformed marker is an error,
/// not a skip: it aborts enumeration for the whole source.
pub fn within_window(raw: &str, filters: &Filters) -> SourceResult<bool> {
    let Some(window) = filters.recency_window_days else {
        return Ok(true);
    };
    let date = parse_marker(raw)?;
    Ok(days_between(date, filters.today) <= window)
}
