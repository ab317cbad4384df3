//! Date and datetime normalisation.
//!
//! Three input paths, tried in order:
//!
//! 1. Spreadsheet serial day numbers in `[1, 110000]` (number or numeric
//!    string), counted from 1900-01-01 UTC. Serial 60 is the spreadsheet's
//!    fictitious 1900-02-29, so serials above 60 are shifted back one day.
//! 2. Strings already in the target layout (`YYYY-MM-DD` for dates, an
//!    ISO `YYYY-MM-DDTHH:MM:SS` prefix for datetimes), kept verbatim.
//! 3. Any other common date/datetime string, parsed and re-rendered.
//!
//! Every result must fall in years `[1900, 2200]`. Anything else is `None`:
//! a bad date is missing data, not an error.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::validation::{is_iso_date, is_iso_datetime_prefix};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2200;

/// Serial day numbers accepted as spreadsheet dates.
pub const SERIAL_MIN: f64 = 1.0;
pub const SERIAL_MAX: f64 = 110_000.0;

/// Serials above this are shifted back one day (phantom 1900-02-29).
const LEAP_BUG_SERIAL: f64 = 60.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

static SERIAL_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]*)?$").expect("valid regex"));

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// Format a value as `YYYY-MM-DD`, or `None` when it is not a usable date.
pub fn format_date_value(value: &Value) -> Option<String> {
    if let Some(serial) = serial_number(value) {
        let instant = serial_to_datetime(serial)?;
        debug!(serial, date = %instant, "converted serial day number");
        return in_year_range(instant).then(|| instant.format("%Y-%m-%d").to_string());
    }

    let text = value_text(value)?;
    if is_iso_date(&text) {
        let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok()?;
        return year_ok(date.year(), &text).then_some(text);
    }

    let instant = parse_date_string(&text)?;
    in_year_range(instant).then(|| instant.format("%Y-%m-%d").to_string())
}

/// Format a value as an ISO-8601 instant, or `None` when it is not usable.
pub fn format_datetime_value(value: &Value) -> Option<String> {
    if let Some(serial) = serial_number(value) {
        let instant = serial_to_datetime(serial)?;
        debug!(serial, datetime = %instant, "converted serial day number");
        return in_year_range(instant).then(|| iso_instant(instant));
    }

    let text = value_text(value)?;
    if is_iso_datetime_prefix(&text) {
        let year = text.get(..4)?.parse::<i32>().ok()?;
        return year_ok(year, &text).then_some(text);
    }

    let instant = parse_date_string(&text)?;
    in_year_range(instant).then(|| iso_instant(instant))
}

/// Serial day number carried by `value`, if it looks like one and is in range.
pub fn serial_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if SERIAL_STRING.is_match(s.trim()) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (SERIAL_MIN..=SERIAL_MAX).contains(&n).then_some(n)
}

/// Convert a serial day number to a UTC instant.
pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    let adjusted = if serial > LEAP_BUG_SERIAL {
        serial - 1.0
    } else {
        serial
    };
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?.and_hms_opt(0, 0, 0)?.and_utc();
    let millis = ((adjusted - 1.0) * MILLIS_PER_DAY).trunc() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn parse_date_string(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    // Zone-less inputs are read as UTC.
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    debug!(input = text, "unrecognised date format");
    None
}

fn in_year_range(instant: DateTime<Utc>) -> bool {
    year_ok(instant.year(), &instant.to_rfc3339())
}

fn year_ok(year: i32, input: &str) -> bool {
    let ok = (MIN_YEAR..=MAX_YEAR).contains(&year);
    if !ok {
        debug!(year, input, "date outside supported year range");
    }
    ok
}

fn iso_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn iso_date_kept() {
        assert_eq!(format_date_value(&json!("2023-12-25")).as_deref(), Some("2023-12-25"));
        assert_eq!(format_date_value(&json!("  2023-12-25 ")).as_deref(), Some("2023-12-25"));
    }

    #[test]
    fn impossible_calendar_date_rejected() {
        assert_eq!(format_date_value(&json!("2023-02-30")), None);
    }

    #[test]
    fn year_range_enforced() {
        assert_eq!(format_date_value(&json!("1800-01-01")), None);
        assert_eq!(format_date_value(&json!("2300-01-01")), None);
        assert_eq!(format_date_value(&json!("1900-01-01")).as_deref(), Some("1900-01-01"));
        assert_eq!(format_date_value(&json!("2200-12-31")).as_deref(), Some("2200-12-31"));
    }

    #[test]
    fn serial_numbers_as_number_and_string() {
        assert_eq!(format_date_value(&json!(45290)).as_deref(), Some("2023-12-30"));
        assert_eq!(format_date_value(&json!("45290")).as_deref(), Some("2023-12-30"));
        assert_eq!(format_date_value(&json!(45292)).as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn serial_fraction_ignored_for_dates() {
        assert_eq!(format_date_value(&json!(45290.5)).as_deref(), Some("2023-12-30"));
    }

    #[test]
    fn leap_bug_boundary() {
        // Serials 59 and 61 are 1900-02-28 and 1900-03-01; 60 is the phantom leap day.
        assert_eq!(format_date_value(&json!(1)).as_deref(), Some("1900-01-01"));
        assert_eq!(format_date_value(&json!(59)).as_deref(), Some("1900-02-28"));
        assert_eq!(format_date_value(&json!(60)).as_deref(), Some("1900-03-01"));
        assert_eq!(format_date_value(&json!(61)).as_deref(), Some("1900-03-01"));
        assert_eq!(format_date_value(&json!(62)).as_deref(), Some("1900-03-02"));
    }

    #[test]
    fn serial_range_bounds() {
        assert_eq!(serial_number(&json!(0)), None);
        assert_eq!(serial_number(&json!(1)), Some(1.0));
        assert_eq!(serial_number(&json!(110000)), Some(110_000.0));
        assert_eq!(serial_number(&json!(110001)), None);
        assert_eq!(serial_number(&json!("-5")), None);
        assert_eq!(serial_number(&json!("12.")), Some(12.0));
    }

    #[test]
    fn serial_beyond_year_range_is_none() {
        // Serial 110000 lands in 2201.
        assert_eq!(format_date_value(&json!(110000)), None);
    }

    #[test]
    fn other_date_strings() {
        assert_eq!(format_date_value(&json!("12/25/2023")).as_deref(), Some("2023-12-25"));
        assert_eq!(format_date_value(&json!("December 25, 2023")).as_deref(), Some("2023-12-25"));
        assert_eq!(
            format_date_value(&json!("2023-12-25T00:00:00.000Z")).as_deref(),
            Some("2023-12-25")
        );
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert_eq!(format_date_value(&json!("invalid-date")), None);
        assert_eq!(format_date_value(&json!("")), None);
        assert_eq!(format_date_value(&Value::Null), None);
        assert_eq!(format_date_value(&json!({ "date": "2023-12-25" })), None);
    }

    #[test]
    fn iso_datetime_kept_verbatim() {
        let input = "2023-12-25T10:30:00.000Z";
        assert_eq!(format_datetime_value(&json!(input)).as_deref(), Some(input));
        assert_eq!(
            format_datetime_value(&json!("2023-12-25T10:30:00")).as_deref(),
            Some("2023-12-25T10:30:00")
        );
    }

    #[test]
    fn datetime_year_range_enforced() {
        assert_eq!(format_datetime_value(&json!("1800-01-01T00:00:00Z")), None);
        assert_eq!(format_datetime_value(&json!("2300-01-01T00:00:00Z")), None);
    }

    #[test]
    fn serial_datetime_keeps_time_of_day() {
        assert_eq!(
            format_datetime_value(&json!(45290.5)).as_deref(),
            Some("2023-12-30T12:00:00.000Z")
        );
        assert_eq!(
            format_datetime_value(&json!("45290.25")).as_deref(),
            Some("2023-12-30T06:00:00.000Z")
        );
    }

    #[test]
    fn serial_date_and_datetime_agree_on_day() {
        let date = format_date_value(&json!(45290.5)).unwrap();
        let datetime = format_datetime_value(&json!(45290.5)).unwrap();
        assert!(datetime.starts_with(&date));
    }

    #[test]
    fn other_datetime_strings_normalised() {
        assert_eq!(
            format_datetime_value(&json!("2023-12-25 10:30:00")).as_deref(),
            Some("2023-12-25T10:30:00.000Z")
        );
        assert_eq!(
            format_datetime_value(&json!("December 25, 2023")).as_deref(),
            Some("2023-12-25T00:00:00.000Z")
        );
        assert_eq!(
            format_datetime_value(&json!("Mon, 25 Dec 2023 10:30:00 +0100")).as_deref(),
            Some("2023-12-25T09:30:00.000Z")
        );
    }

    #[test]
    fn non_ascii_digits_are_not_dates() {
        assert_eq!(format_datetime_value(&json!("२०२३-01-01T00:00:00")), None);
        assert_eq!(format_date_value(&json!("२०२३-01-01")), None);
        assert_eq!(serial_number(&json!("४५२९०")), None);
    }

    #[test]
    fn unparseable_datetimes_are_none() {
        assert_eq!(format_datetime_value(&json!("invalid-datetime")), None);
        assert_eq!(format_datetime_value(&json!("   ")), None);
    }
}
