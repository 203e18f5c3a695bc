use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

static YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("valid year regex"));

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Calendar bucket a row is attributed to in the monthly statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// First run of four consecutive digits anywhere in the cell.
pub fn extract_year(raw: &str) -> Option<&str> {
    YEAR_REGEX.find(raw).map(|found| found.as_str())
}

/// Second `-` segment (`YYYY-MM-DD`), else second `.` segment (`DD.MM.YYYY`),
/// read as a leading integer so `"05"` becomes 5.
pub fn extract_month(raw: &str) -> Option<u32> {
    let dashed = raw.split('-').collect::<Vec<&str>>();
    if dashed.len() >= 2 {
        return parse_leading_integer(dashed[1]);
    }

    let dotted = raw.split('.').collect::<Vec<&str>>();
    if dotted.len() >= 2 {
        return parse_leading_integer(dotted[1]);
    }

    None
}

fn parse_leading_integer(segment: &str) -> Option<u32> {
    let digits = segment
        .trim_start()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    digits.parse::<u32>().ok()
}

/// Lossy measurement parse: whitespace and everything but digits, `,`, `.`
/// and `-` is dropped, the first comma becomes a decimal point and the longest
/// numeric prefix is read. Anything unreadable is zero.
pub fn parse_length(raw: &str) -> f64 {
    let cleaned = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, ',' | '.' | '-'))
        .collect::<String>();
    let normalized = cleaned.replacen(',', ".", 1);
    numeric_prefix(&normalized)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn numeric_prefix(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        } else if has_digits {
            end = frac_start;
        }
    }

    if has_digits { Some(&input[..end]) } else { None }
}

/// Locale-agnostic date parse used only by the statistics buckets.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    // Bare "YYYY-MM" and "YYYY" read as the first day of the period.
    if value.len() == 7 {
        if let Ok(parsed) = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
            return Some(parsed);
        }
    }
    if value.len() == 4 && value.chars().all(|ch| ch.is_ascii_digit()) {
        return value
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }

    None
}

/// Row cell first, then the document's own date; `None` when neither parses.
pub fn resolve_period(cell: Option<&str>, document_date: &str) -> Option<Period> {
    cell.filter(|value| !value.is_empty())
        .and_then(parse_calendar_date)
        .or_else(|| parse_calendar_date(document_date))
        .map(Period::from_date)
}
