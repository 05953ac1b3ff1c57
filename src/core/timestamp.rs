// csv2timeline - core/timestamp.rs
//
// General timestamp parser for the configured timestamp column.
//
// The whole (trimmed) cell must be a timestamp; nothing is extracted from
// surrounding text. Shapes are tried from most to least specific and the
// first successful parse wins. Offsets and zone designators are accepted but
// not applied: the result is the wall-clock time as written in the source.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Time-of-day layouts tried after a date, 24-hour clock.
const TIME_24H: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Time-of-day layouts tried after a date, 12-hour clock.
const TIME_12H: &[&str] = &["%I:%M:%S%.f %p", "%I:%M:%S %p", "%I:%M %p"];

/// A recognisable shape plus the function that converts it.
struct Shape {
    re: Regex,
    parse: fn(&str) -> Option<NaiveDateTime>,
}

/// Parse a timestamp cell. Returns `None` if no known shape fits or the
/// fields are out of range (e.g. February 30th).
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    shapes()
        .iter()
        .filter(|shape| shape.re.is_match(value))
        .find_map(|shape| (shape.parse)(value))
}

fn shapes() -> &'static [Shape] {
    static SHAPES: OnceLock<Vec<Shape>> = OnceLock::new();

    SHAPES.get_or_init(|| {
        // The patterns are literals covered by the tests below.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("timestamp: invalid regex")
        }

        vec![
            // ------------------------------------------------------------------
            // ISO 8601 / RFC 3339, `T` or space, optional fraction (dot or
            // comma) and optional zone designator.
            //   2024-01-15T14:30:22
            //   2024-01-15 14:30:22,123
            //   2024-01-15T14:30:22.123456+05:30
            //   2024-01-15T14:30Z
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{4}-\d{1,2}-\d{1,2}[Tt ]\d{1,2}:\d{2}(?::\d{2}(?:[.,]\d+)?)?(?:\s*(?:[Zz]|[+-]\d{2}(?::?\d{2})?))?$"),
                parse: |s| {
                    let s = strip_offset(s).replace(',', ".").replace(['T', 't'], " ");
                    with_times(&s, "%Y-%m-%d", TIME_24H)
                },
            },
            // ------------------------------------------------------------------
            // Slash year-first: 2024/01/15 14:30:22[.123]
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{4}/\d{1,2}/\d{1,2}[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?$"),
                parse: |s| with_times(&s.replace('T', " "), "%Y/%m/%d", TIME_24H),
            },
            // ------------------------------------------------------------------
            // Dot day-first: 26.02.2026 22:07:56[.535]
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{1,2}\.\d{1,2}\.\d{4} \d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?$"),
                parse: |s| with_times(s, "%d.%m.%Y", TIME_24H),
            },
            // ------------------------------------------------------------------
            // Apache combined log: 15/Jan/2024:14:30:22 +0000
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{1,2}/[A-Za-z]{3}/\d{4}:\d{2}:\d{2}:\d{2}(?: [+-]\d{4})?$"),
                parse: |s| {
                    let naive = s.split(' ').next().unwrap_or(s);
                    NaiveDateTime::parse_from_str(naive, "%d/%b/%Y:%H:%M:%S").ok()
                },
            },
            // ------------------------------------------------------------------
            // Slash month-first with time, 24h or AM/PM.
            //   01/15/2024 14:30:22
            //   1/15/2024 2:30:22 PM
            // Month-first (invariant culture). A first field above 12 can only
            // be a day, so such values are read day-first instead.
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{1,2}/\d{1,2}/\d{4}[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s*[AaPp][Mm])?$"),
                parse: |s| {
                    let (s, twelve_hour) = split_meridiem(&s.replacen('T', " ", 1));
                    let times = if twelve_hour { TIME_12H } else { TIME_24H };
                    with_times(&s, slash_date_format(&s)?, times)
                },
            },
            // ------------------------------------------------------------------
            // RFC 2822: Mon, 15 Jan 2024 14:30:22 +0000
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^(?:[A-Za-z]{3},\s*)?\d{1,2} [A-Za-z]{3} \d{4} \d{2}:\d{2}(?::\d{2})? (?:[+-]\d{4}|[A-Za-z]{1,5})$"),
                parse: |s| DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.naive_local()),
            },
            // ------------------------------------------------------------------
            // Month name first, optional time.
            //   Jan 15 2024 14:30:22
            //   January 15, 2024 2:30 PM
            //   Mar 3, 2024
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^[A-Za-z]{3,9}\.? \d{1,2},? \d{4}(?:,? \d{1,2}:\d{2}(?::\d{2})?(?:\s*[AaPp][Mm])?)?$"),
                parse: |s| month_name(s, "%B %d %Y"),
            },
            // ------------------------------------------------------------------
            // Day first, month name.
            //   15 Jan 2024 14:30:22
            //   3 March 2024
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{1,2} [A-Za-z]{3,9}\.?,? \d{4}(?:,? \d{1,2}:\d{2}(?::\d{2})?(?:\s*[AaPp][Mm])?)?$"),
                parse: |s| month_name(s, "%d %B %Y"),
            },
            // ------------------------------------------------------------------
            // Compact ISO: 20240115T143022, 20240115 143022
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^\d{8}[Tt ]\d{6}$"),
                parse: |s| {
                    let digit = |range: std::ops::Range<usize>| s.get(range)?.parse::<u32>().ok();
                    let year = s.get(0..4)?.parse::<i32>().ok()?;
                    NaiveDate::from_ymd_opt(year, digit(4..6)?, digit(6..8)?)?
                        .and_hms_opt(digit(9..11)?, digit(11..13)?, digit(13..15)?)
                },
            },
            // ------------------------------------------------------------------
            // Date only, read as midnight.
            //   2024-01-15, 2024/01/15, 15.01.2024, 01/15/2024
            // ------------------------------------------------------------------
            Shape {
                re: re(r"^(?:\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}\.\d{1,2}\.\d{4}|\d{1,2}/\d{1,2}/\d{4})$"),
                parse: |s| {
                    let format = if s.contains('.') {
                        "%d.%m.%Y"
                    } else if s.find(['-', '/']) == Some(4) {
                        if s.contains('-') {
                            "%Y-%m-%d"
                        } else {
                            "%Y/%m/%d"
                        }
                    } else {
                        slash_date_format(s)?
                    };
                    midnight(s, format)
                },
            },
        ]
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Try `date` followed by each of `times`, separated by one space.
fn with_times(s: &str, date: &str, times: &[&str]) -> Option<NaiveDateTime> {
    times
        .iter()
        .find_map(|time| NaiveDateTime::parse_from_str(s, &format!("{date} {time}")).ok())
}

fn midnight(s: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Drop a trailing `Z` or `+hh[:mm]` / `-hh[:mm]` after the date part.
fn strip_offset(s: &str) -> &str {
    let s = s.trim_end_matches(['Z', 'z']);
    match s.get(10..).and_then(|time| time.rfind(['+', '-'])) {
        Some(i) => s[..10 + i].trim_end(),
        None => s,
    }
}

/// Normalise a trailing AM/PM marker to ` AM`/` PM`. Returns whether one was
/// present.
fn split_meridiem(s: &str) -> (String, bool) {
    let trimmed = s.trim_end();
    let upper = trimmed.to_ascii_uppercase();
    if upper.ends_with("AM") || upper.ends_with("PM") {
        let (body, marker) = trimmed.split_at(trimmed.len() - 2);
        (
            format!("{} {}", body.trim_end(), marker.to_ascii_uppercase()),
            true,
        )
    } else {
        (trimmed.to_string(), false)
    }
}

/// `%m/%d/%Y` unless the first field cannot be a month.
fn slash_date_format(s: &str) -> Option<&'static str> {
    let first: u32 = s.split('/').next()?.parse().ok()?;
    Some(if first > 12 { "%d/%m/%Y" } else { "%m/%d/%Y" })
}

/// Month-name forms: commas and a period after the month are dropped and
/// whitespace collapsed, then `date` is tried with and without a time.
fn month_name(s: &str, date: &str) -> Option<NaiveDateTime> {
    let cleaned = s.replace([',', '.'], " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let (cleaned, twelve_hour) = split_meridiem(&cleaned);

    if !cleaned.contains(':') {
        return midnight(&cleaned, date);
    }
    let times = if twelve_hour { TIME_12H } else { TIME_24H };
    with_times(&cleaned, date, times)
}
