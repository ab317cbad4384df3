//! Time-tracking values.
//!
//! The tracker parses duration syntax (`"2w 3d 4h 30m"`, `"90m"`, ...) itself,
//! so formatting only wraps the text. [`parse_time_components`] is for
//! display.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+[wdhm]\s*)+$").expect("valid regex"));
static WEEKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)w").expect("valid regex"));
static DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)d").expect("valid regex"));
static HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)h").expect("valid regex"));
static MINUTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)m").expect("valid regex"));

/// `{ "originalEstimate": "<trimmed input>" }`, or `{}` for blank input.
pub fn parse_time_tracking(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return json!({});
    }
    json!({ "originalEstimate": trimmed })
}

/// Whether `value` is made only of `<n>w`, `<n>d`, `<n>h`, `<n>m` groups.
pub fn is_valid_time_tracking_format(value: &str) -> bool {
    DURATION.is_match(value.trim())
}

/// Duration broken into units. Units absent from the input stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeComponents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

pub fn parse_time_components(value: &str) -> TimeComponents {
    let unit = |re: &Regex| {
        re.captures(value)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    };
    TimeComponents {
        weeks: unit(&WEEKS),
        days: unit(&DAYS),
        hours: unit(&HOURS),
        minutes: unit(&MINUTES),
    }
}
