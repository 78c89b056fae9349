//! SGML submission headers and the value parsers shared by the text extractors.
//!
//! A full-submission `.txt` starts with a header block of `KEY: value` lines
//! (`ACCESSION NUMBER`, `CONFORMED SUBMISSION TYPE`, `FILED AS OF DATE`, ...). The
//! helpers below read those lines and turn the loosely formatted numbers, amounts and
//! dates found in filing prose into typed values.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static ACCESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ACCESSION NUMBER:\s*([0-9-]+)").expect("valid header regex")
});
static CIK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CENTRAL INDEX KEY:\s*(\d+)").expect("valid header regex")
});
static COMPANY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"COMPANY CONFORMED NAME:\s*([^\n\r]+)").expect("valid header regex")
});
static FORM_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:CONFORMED SUBMISSION TYPE|FORM TYPE):\s*([^\n\r]+)").expect("valid header regex")
});
static FILED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"FILED AS OF DATE:\s*(\d{8})").expect("valid header regex")
});
static PERIOD_OF_REPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CONFORMED PERIOD OF REPORT:\s*(\d{8})").expect("valid header regex")
});

/// Dollar amount with an optional magnitude word: `$1,250.5 million`.
pub(crate) static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)(?:\s*(million|billion|thousand)\b)?")
        .expect("valid header regex")
});

static PROSE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),?\s+(\d{4})\b|\b(\d{1,2}/\d{1,2}/\d{4})\b|\b(\d{4}-\d{2}-\d{2})\b",
    )
    .expect("valid header regex")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Identification fields from the SGML header of a full-submission text file.
///
/// Every field is optional: documents fetched without their header (a bare primary
/// document, say) simply yield `None`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilingHeader {
    pub accession_number: Option<String>,
    pub cik: Option<String>,
    pub company_name: Option<String>,
    pub form_type: Option<String>,
    pub filed_date: Option<NaiveDate>,
    pub period_of_report: Option<NaiveDate>,
}

impl FilingHeader {
    pub fn parse(text: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            accession_number: capture(&ACCESSION),
            cik: capture(&CIK),
            company_name: capture(&COMPANY_NAME),
            form_type: capture(&FORM_TYPE),
            filed_date: capture(&FILED_DATE).and_then(|d| parse_compact_date(&d)),
            period_of_report: capture(&PERIOD_OF_REPORT).and_then(|d| parse_compact_date(&d)),
        }
    }
}

/// `YYYYMMDD`, as used throughout SGML headers.
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

/// `YYYY-MM-DD`, `MM/DD/YYYY` or `MM-DD-YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Every recognizable date in running text with its byte offset: `January 15, 2024`,
/// `01/15/2024` or `2024-01-15`.
pub fn dates_in(text: &str) -> Vec<(usize, NaiveDate)> {
    PROSE_DATE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let date = if let Some(month) = caps.get(1) {
                let month = MONTHS
                    .iter()
                    .position(|m| m.eq_ignore_ascii_case(month.as_str()))?;
                let day = caps.get(2)?.as_str().parse().ok()?;
                let year = caps.get(3)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month as u32 + 1, day)?
            } else {
                parse_date(caps.get(4).or_else(|| caps.get(5))?.as_str())?
            };
            Some((whole.start(), date))
        })
        .collect()
}

/// Parses a figure as printed in a filing: `$1,234.5`, `(12)` for negatives, `-3`.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    let number: f64 = cleaned.parse().ok().filter(|n: &f64| n.is_finite())?;
    Some(if negative { -number } else { number })
}

/// Applies a magnitude word to an amount: `("2.5", Some("billion"))` is 2.5e9.
pub fn parse_money(amount: &str, magnitude: Option<&str>) -> Option<f64> {
    let value = parse_number(amount)?;
    let multiplier = match magnitude.map(str::to_ascii_lowercase).as_deref() {
        Some("billion") => 1e9,
        Some("million") => 1e6,
        Some("thousand") => 1e3,
        _ => 1.0,
    };
    Some(value * multiplier)
}

/// First dollar amount in `text`, normalized to absolute units.
pub fn first_money(text: &str) -> Option<f64> {
    MONEY.captures_iter(text).find_map(|caps| {
        let amount = caps.get(1)?.as_str();
        parse_money(amount, caps.get(2).map(|m| m.as_str()))
    })
}

/// Largest char boundary at or below `index`, so slicing user text never panics.
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// At most `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Keyword-based severity used for risk factors and 8-K events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// `High` if any `high` keyword occurs, else `Medium` if any `medium` keyword
    /// occurs, else `Low`. Matching is case-insensitive substring search.
    pub fn classify(text: &str, high: &[&str], medium: &[&str]) -> Self {
        let text = text.to_lowercase();
        if high.iter().any(|k| text.contains(k)) {
            Severity::High
        } else if medium.iter().any(|k| text.contains(k)) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}
