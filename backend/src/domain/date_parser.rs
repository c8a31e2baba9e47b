//! Birthday value normalization.
//!
//! Profile systems accumulate birthday values in wildly inconsistent shapes
//! and formats: plain `YYYY-MM-DD` strings, datetime strings with a stray
//! midnight component, regional orderings like `DD/MM/YYYY`, and values
//! wrapped in lists or records by older field types. This module resolves
//! whatever is stored into one canonical `NaiveDate`, or rejects it with a
//! typed reason the caller is expected to swallow (skip the member, log at
//! debug).

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use shared::RawBirthdayValue;
use thiserror::Error;

/// Format assumed for a field when none is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest birth year accepted as real member data.
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Date-only formats that commonly appear with a trailing time component.
const COMMON_DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Fixed fallback list covering the regional orderings seen in the wild.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m.%d.%Y",
    "%Y.%m.%d",
];

/// Last-resort formats tried without the round-trip requirement.
const FREEFORM_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Why a stored value could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("stored value is empty")]
    EmptyValue,
    #[error("stored value shape carries no date string")]
    UnsupportedShape,
    #[error("no known date format matches the stored value")]
    UnparseableDate,
    #[error("year {0} is outside the accepted range 1900..={1}")]
    YearOutOfRange(i32, i32),
}

/// Normalize a raw stored value into a canonical birth date.
///
/// `configured_format` is the chrono strftime pattern configured on the
/// source field; it is tried before the fixed fallback list. `current_year`
/// bounds the accepted year range (a birth date cannot lie in the future).
pub fn normalize(
    raw: &RawBirthdayValue,
    configured_format: &str,
    current_year: i32,
) -> Result<NaiveDate, NormalizeError> {
    let candidate = raw
        .date_string()
        .ok_or(NormalizeError::UnsupportedShape)?
        .trim();

    if candidate.is_empty() {
        return Err(NormalizeError::EmptyValue);
    }

    let mut out_of_range_year: Option<i32> = None;

    // Fast path: canonical YYYY-MM-DD, optionally with a time-of-day tail.
    if let Some(date_part) = iso_date_prefix(candidate) {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            if year_in_range(date.year(), current_year) {
                return Ok(date);
            }
            out_of_range_year = Some(date.year());
        }
    }

    // Ordered candidate formats: the field's configured format first, a
    // datetime variant of it when it is one of the common date-only forms,
    // then the fixed fallback list, duplicates removed.
    let mut formats: Vec<String> = Vec::new();
    push_unique(&mut formats, configured_format.to_string());
    if COMMON_DATE_ONLY_FORMATS.contains(&configured_format) {
        push_unique(&mut formats, format!("{} %H:%M:%S", configured_format));
    }
    for fallback in FALLBACK_FORMATS {
        push_unique(&mut formats, fallback.to_string());
    }

    for format in &formats {
        if let Some(date) = parse_strict(candidate, format) {
            if year_in_range(date.year(), current_year) {
                return Ok(date);
            }
            out_of_range_year = Some(date.year());
        }
    }

    // Free-form last resort, no round-trip requirement.
    if let Some(date) = parse_freeform(candidate) {
        if year_in_range(date.year(), current_year) {
            return Ok(date);
        }
        out_of_range_year = Some(date.year());
    }

    match out_of_range_year {
        Some(year) => Err(NormalizeError::YearOutOfRange(year, current_year)),
        None => Err(NormalizeError::UnparseableDate),
    }
}

/// Split off the `YYYY-MM-DD` prefix of a canonical or datetime string.
///
/// Returns the date portion when the whole string is either a bare date or
/// a date followed by whitespace and an `HH:MM:SS` component.
fn iso_date_prefix(value: &str) -> Option<&str> {
    let (date_part, rest) = match value.find(char::is_whitespace) {
        Some(idx) => (&value[..idx], value[idx..].trim_start()),
        None => (value, ""),
    };

    if !looks_like_iso_date(date_part) {
        return None;
    }
    if !rest.is_empty() && !looks_like_time(rest) {
        return None;
    }

    Some(date_part)
}

fn looks_like_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit())
}

fn looks_like_time(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit())
}

/// Parse with a strict round-trip check: the parsed value reformatted with
/// the same pattern must reproduce the input exactly. This rejects values
/// that merely happen to be readable under a format (e.g. unpadded days
/// against a padded pattern), matching how the source field validated them.
fn parse_strict(value: &str, format: &str) -> Option<NaiveDate> {
    if format.contains("%H") {
        let datetime = NaiveDateTime::parse_from_str(value, format).ok()?;
        (datetime.format(format).to_string() == value).then(|| datetime.date())
    } else {
        let date = NaiveDate::parse_from_str(value, format).ok()?;
        (date.format(format).to_string() == value).then_some(date)
    }
}

fn parse_freeform(value: &str) -> Option<NaiveDate> {
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    for format in FREEFORM_FORMATS {
        if format.contains("%H") {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Some(datetime.date());
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    None
}

fn year_in_range(year: i32, current_year: i32) -> bool {
    (MIN_BIRTH_YEAR..=current_year).contains(&year)
}

fn push_unique(formats: &mut Vec<String>, format: String) {
    if !formats.contains(&format) {
        formats.push(format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawBirthdayValue {
        RawBirthdayValue::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_canonical_date_fast_path() {
        assert_eq!(
            normalize(&text("1990-03-15"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
    }

    #[test]
    fn test_datetime_tail_is_stripped() {
        // Stored datebox values often carry a midnight component.
        assert_eq!(
            normalize(&text("1990-03-15 00:00:00"), "%d/%m/%Y", 2025),
            Ok(date(1990, 3, 15))
        );
    }

    #[test]
    fn test_configured_format_takes_priority() {
        // 15/03/1990 is only valid as DD/MM/YYYY; under MM/DD/YYYY month 15
        // does not exist.
        assert_eq!(
            normalize(&text("15/03/1990"), "%d/%m/%Y", 2025),
            Ok(date(1990, 3, 15))
        );
    }

    #[test]
    fn test_ambiguous_value_follows_configured_format() {
        // 03/04/1990 parses under both regional orders; the field's own
        // format decides.
        assert_eq!(
            normalize(&text("03/04/1990"), "%d/%m/%Y", 2025),
            Ok(date(1990, 4, 3))
        );
        assert_eq!(
            normalize(&text("03/04/1990"), "%m/%d/%Y", 2025),
            Ok(date(1990, 3, 4))
        );
    }

    #[test]
    fn test_fallback_formats_cover_regional_orders() {
        assert_eq!(
            normalize(&text("15.03.1990"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
        assert_eq!(
            normalize(&text("1990/03/15"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
        assert_eq!(
            normalize(&text("15-03-1990"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
    }

    #[test]
    fn test_invalid_calendar_date_is_rejected() {
        assert_eq!(
            normalize(&text("1990-02-30"), DEFAULT_DATE_FORMAT, 2025),
            Err(NormalizeError::UnparseableDate)
        );
    }

    #[test]
    fn test_round_trip_rejects_unpadded_values() {
        // 3/15/1990 reads under %m/%d/%Y but reformats to 03/15/1990, so the
        // strict round-trip refuses it; the free-form pass does not apply to
        // slash-separated numerics either.
        assert_eq!(
            normalize(&text("3/15/1990"), "%m/%d/%Y", 2025),
            Err(NormalizeError::UnparseableDate)
        );
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(
            normalize(&text("1899-12-31"), DEFAULT_DATE_FORMAT, 2025),
            Err(NormalizeError::YearOutOfRange(1899, 2025))
        );
        assert_eq!(
            normalize(&text("2026-01-01"), DEFAULT_DATE_FORMAT, 2025),
            Err(NormalizeError::YearOutOfRange(2026, 2025))
        );
        assert_eq!(
            normalize(&text("1900-01-01"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1900, 1, 1))
        );
        assert_eq!(
            normalize(&text("2025-01-01"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(2025, 1, 1))
        );
    }

    #[test]
    fn test_leap_day_birth_date_is_accepted() {
        assert_eq!(
            normalize(&text("2000-02-29"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(2000, 2, 29))
        );
    }

    #[test]
    fn test_list_and_record_shapes() {
        let list = RawBirthdayValue::List(vec!["1990-03-15".to_string()]);
        assert_eq!(
            normalize(&list, DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );

        let mut entries = std::collections::BTreeMap::new();
        entries.insert("date".to_string(), "1990-03-15".to_string());
        let record = RawBirthdayValue::Record(entries);
        assert_eq!(
            normalize(&record, DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );

        let empty_list = RawBirthdayValue::List(vec![]);
        assert_eq!(
            normalize(&empty_list, DEFAULT_DATE_FORMAT, 2025),
            Err(NormalizeError::UnsupportedShape)
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            normalize(&text("  1990-03-15  "), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
        assert_eq!(
            normalize(&text("   "), DEFAULT_DATE_FORMAT, 2025),
            Err(NormalizeError::EmptyValue)
        );
    }

    #[test]
    fn test_freeform_last_resort() {
        assert_eq!(
            normalize(&text("March 15, 1990"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
        assert_eq!(
            normalize(&text("15 March 1990"), DEFAULT_DATE_FORMAT, 2025),
            Ok(date(1990, 3, 15))
        );
        assert_eq!(
            normalize(&text("not a date"), DEFAULT_DATE_FORMAT, 2025),
            Err(NormalizeError::UnparseableDate)
        );
    }
}
