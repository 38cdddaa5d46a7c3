//! Parsing of the free-text date ranges shown on profile sections.
//!
//! Captions come in a handful of shapes:
//! - `"May 2018 - Jun 2024 · 6 yrs 2 mos"` (experience, with annotation)
//! - `"2020 - Present"` (open-ended)
//! - `"2019"` (year only)

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Separator between a date range and its trailing annotation.
pub const MIDDLE_DOT: &str = " · ";

static DATE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z]+ \d{4}\b|\b\d{4}\b|\bPresent\b").expect("valid date token regex")
});

/// A parsed start/end pair. `end == None` means open-ended or unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse a range such as `"May 2018 - Jun 2024"`, `"2020 - Present"` or `"2019"`.
    pub fn parse(text: &str) -> Self {
        let tokens: Vec<&str> = DATE_TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();

        match tokens.as_slice() {
            [] => Self::default(),
            ["Present"] => Self::default(),
            [start] => Self {
                start: parse_date(start),
                end: None,
            },
            [start, end, ..] => Self {
                start: parse_date(start),
                end: if *end == "Present" {
                    None
                } else {
                    parse_date(end)
                },
            },
        }
    }
}

/// A duration caption split into its range and optional annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duration {
    pub range: DateRange,
    /// Text after the middle dot, e.g. `"6 yrs 2 mos"`.
    pub annotation: Option<String>,
}

/// Split an experience caption on the middle dot and parse the range part.
pub fn parse_duration(caption: &str) -> Duration {
    let (range_text, annotation) = match caption.split_once(MIDDLE_DOT) {
        Some((range, rest)) => (range, Some(rest.trim().to_string())),
        None => (caption, None),
    };

    Duration {
        range: DateRange::parse(range_text),
        annotation: annotation.filter(|a| !a.is_empty()),
    }
}

/// Parse `"Mon YYYY"`, `"Month YYYY"` or `"YYYY"` into the first day of that period.
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    if token.is_empty() || token == "Present" {
        return None;
    }

    if let Ok(year) = token.parse::<i32>() {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    let with_day = format!("1 {}", token);
    NaiveDate::parse_from_str(&with_day, "%d %b %Y")
        .or_else(|_| NaiveDate::parse_from_str(&with_day, "%d %B %Y"))
        .ok()
}
