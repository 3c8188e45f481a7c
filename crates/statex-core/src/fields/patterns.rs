//! Regex patterns and primitive parsers for statement text.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Full day-month-year date: DD.MM.YYYY with `.`, `/` or `-`
    /// separators and a two- or four-digit year.
    pub static ref DATE_DMY: Regex =
        Regex::new(r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})$").unwrap();

    /// Day-month date with no year, as printed in statement date
    /// columns ("01.03", sometimes with a trailing dot).
    pub static ref DATE_DM: Regex =
        Regex::new(r"^(\d{1,2})[./\-](\d{1,2})\.?$").unwrap();
}

/// Whether the text reads as a date in any supported form.
pub fn looks_like_date(text: &str) -> bool {
    let t = text.trim();
    DATE_DMY.is_match(t) || DATE_DM.is_match(t)
}

/// Parse a full day-month-year date.
pub fn parse_full_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_DMY.captures(text.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = expand_year(caps[3].parse().ok()?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a day-month date with no year.
pub fn parse_day_month(text: &str) -> Option<(u32, u32)> {
    let caps = DATE_DM.captures(text.trim())?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn expand_year(year: i32) -> i32 {
    if year < 100 {
        // Two-digit year: 00-50 are 2000s, 51-99 are 1900s.
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}
