//! Calendar-date extraction from free text and the trailing recency window.
//!
//! Supported shapes: `dd/mm/yyyy`, `dd-mm-yy` (day first), `yyyy-mm-dd`,
//! `12 Jan 2025`, `12 January, 2025` and `January 12, 2025`.

use std::sync::LazyLock;

use chrono::{Datelike, Months, NaiveDate};
use regex::{Captures, Regex};

static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})([/-])(\d{1,2})([/-])(\d{2,4})\b").expect("valid regex")
});

static YEAR_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})([/-])(\d{1,2})([/-])(\d{1,2})\b").expect("valid regex")
});

static DAY_MONTH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s+((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*)[.,]?\s+(\d{4})\b",
    )
    .expect("valid regex")
});

static MONTH_NAME_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*)\.?\s+(\d{1,2}),?\s+(\d{4})\b",
    )
    .expect("valid regex")
});

const MONTH_NAMES: [&str; 12] = [
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

/// Extract every date mentioned in `text`, newest first, without duplicates.
///
/// `today` anchors two-digit years: `yy` reads as `20yy` unless that lands
/// more than one year past `today`, in which case it reads as `19yy`.
pub fn extract_dates(text: &str, today: NaiveDate) -> Vec<NaiveDate> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();

    for caps in DAY_FIRST_RE.captures_iter(text) {
        if caps[2] != caps[4] {
            continue;
        }
        let Some(year) = parse_year(&caps[5], today) else {
            continue;
        };
        found.extend(ymd(year, &caps[3], &caps[1]));
    }

    for caps in YEAR_FIRST_RE.captures_iter(text) {
        if caps[2] != caps[4] {
            continue;
        }
        let Ok(year) = caps[1].parse() else { continue };
        found.extend(ymd(year, &caps[3], &caps[5]));
    }

    for caps in DAY_MONTH_NAME_RE.captures_iter(text) {
        found.extend(named(&caps, 2, 1, 3));
    }

    for caps in MONTH_NAME_DAY_RE.captures_iter(text) {
        found.extend(named(&caps, 1, 2, 3));
    }

    found.sort_unstable_by(|a, b| b.cmp(a));
    found.dedup();
    found
}

/// Four-digit years are taken as written; two-digit years get the century
/// correction. Any other width is not a year.
fn parse_year(raw: &str, today: NaiveDate) -> Option<i32> {
    let value: i32 = raw.parse().ok()?;
    match raw.len() {
        4 => Some(value),
        2 => {
            let naive = 2000 + value;
            if naive > today.year() + 1 {
                Some(naive - 100)
            } else {
                Some(naive)
            }
        }
        _ => None,
    }
}

fn ymd(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn named(caps: &Captures<'_>, month_idx: usize, day_idx: usize, year_idx: usize) -> Option<NaiveDate> {
    let month = month_from_name(&caps[month_idx])?;
    let day = caps[day_idx].parse().ok()?;
    let year = caps[year_idx].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Full month name or its three-letter abbreviation ("sept" too).
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|full| {
            *full == lower || full[..3] == lower || (lower == "sept" && *full == "september")
        })
        .map(|idx| idx as u32 + 1)
}

/// A trailing window of whole calendar months ending at `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    today: NaiveDate,
    months: u32,
}

impl RecencyWindow {
    pub fn new(today: NaiveDate, months: u32) -> Self {
        Self { today, months }
    }

    /// Earliest date still inside the window (inclusive).
    pub fn cutoff(&self) -> NaiveDate {
        self.today
            .checked_sub_months(Months::new(self.months))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Whether any date falls on or after the cutoff.
    ///
    /// An empty slice is never recent: a missing date is not evidence of recency.
    pub fn any_recent(&self, dates: &[NaiveDate]) -> bool {
        let cutoff = self.cutoff();
        dates.iter().any(|d| *d >= cutoff)
    }
}
