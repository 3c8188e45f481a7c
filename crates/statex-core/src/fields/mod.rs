//! Field classification and parsing for logical rows.
//!
//! Converts each row's raw text into typed values: locale dates (with
//! year inference against the statement period for day-month columns),
//! amounts with decimal commas, thousands separators and sign markers,
//! and whitespace-normalized descriptions. No row is ever coerced to a
//! default: an unparseable mandatory field drops exactly that row with
//! a warning issue.

pub mod patterns;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::error::ParseError;
use crate::models::config::{ColumnBands, ExtractionConfig};
use crate::models::record::ParseIssue;
use crate::rows::LogicalRow;
use crate::tokens::StatementPeriod;

/// A row with all mandatory fields parsed into typed values.
#[derive(Debug, Clone)]
pub struct ClassifiedRow {
    pub date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub description: String,
    pub amount: Decimal,
    pub balance: Decimal,
    pub source_lines: (usize, usize),
}

/// Parse one logical row into typed fields.
///
/// Returns `None` and records a warning issue when a mandatory field
/// (date, amount, balance) cannot be parsed; a bad value date only
/// degrades to a warning with the row kept.
pub fn classify(
    row: LogicalRow,
    period: Option<StatementPeriod>,
    config: &ExtractionConfig,
    document: &str,
    issues: &mut Vec<ParseIssue>,
) -> Option<ClassifiedRow> {
    let source_lines = row.lines();
    let context = format!("lines {}-{}", source_lines.0, source_lines.1);

    let Some(date_fragment) = row.date else {
        issues.push(ParseIssue::warning(
            document,
            &context,
            "row has no date fragment; dropped",
        ));
        return None;
    };
    let date = match parse_entry_date(&date_fragment.text, period) {
        Ok(date) => date,
        Err(e) => {
            issues.push(ParseIssue::warning(
                document,
                &context,
                format!("row dropped: {e}"),
            ));
            return None;
        }
    };

    let Some(amount_fragment) = row.amount else {
        issues.push(ParseIssue::warning(
            document,
            &context,
            "row has no amount fragment; dropped",
        ));
        return None;
    };
    let amount = match parse_amount(&amount_fragment.text, amount_fragment.left, &config.columns)
    {
        Ok(amount) => amount,
        Err(e) => {
            issues.push(ParseIssue::warning(
                document,
                &context,
                format!("row dropped: {e}"),
            ));
            return None;
        }
    };

    let Some(balance_fragment) = row.balance else {
        issues.push(ParseIssue::warning(
            document,
            &context,
            "row has no balance fragment; dropped",
        ));
        return None;
    };
    let balance = match parse_balance(&balance_fragment.text) {
        Ok(balance) => balance,
        Err(e) => {
            issues.push(ParseIssue::warning(
                document,
                &context,
                format!("row dropped: {e}"),
            ));
            return None;
        }
    };

    // The value date is informational; a bad one does not cost the row.
    let value_date = match row.value_date {
        Some(fragment) => {
            match parse_value_date(&fragment.text, date, config.value_date_max_lag_days) {
                Ok(value_date) => Some(value_date),
                Err(e) => {
                    debug!(document, text = %fragment.text, "value date ignored");
                    issues.push(ParseIssue::warning(
                        document,
                        &context,
                        format!("value date ignored: {e}"),
                    ));
                    None
                }
            }
        }
        None => None,
    };

    Some(ClassifiedRow {
        date,
        value_date,
        description: normalize_description(&row.description),
        amount,
        balance,
        source_lines,
    })
}

/// Parse an entry date: a full day-month-year date, or a day-month date
/// whose year is inferred from the statement period.
pub fn parse_entry_date(
    text: &str,
    period: Option<StatementPeriod>,
) -> Result<NaiveDate, ParseError> {
    if let Some(date) = patterns::parse_full_date(text) {
        return Ok(date);
    }
    let Some((day, month)) = patterns::parse_day_month(text) else {
        return Err(ParseError::Date(text.to_string()));
    };
    let Some(period) = period else {
        return Err(ParseError::Date(text.to_string()));
    };

    let mut any_valid = false;
    for year in [period.start.year(), period.end.year()] {
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
            any_valid = true;
            if period.contains(candidate) {
                return Ok(candidate);
            }
        }
    }
    if any_valid {
        Err(ParseError::DateOutsidePeriod {
            text: text.to_string(),
            start: period.start,
            end: period.end,
        })
    } else {
        Err(ParseError::Date(text.to_string()))
    }
}

/// Parse a value date against its entry date: the year is whichever one
/// places the date within the configured lag of the entry.
pub fn parse_value_date(
    text: &str,
    anchor: NaiveDate,
    max_lag_days: i64,
) -> Result<NaiveDate, ParseError> {
    if let Some(date) = patterns::parse_full_date(text) {
        return Ok(date);
    }
    let Some((day, month)) = patterns::parse_day_month(text) else {
        return Err(ParseError::Date(text.to_string()));
    };

    for year in [anchor.year(), anchor.year() + 1] {
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
            if (candidate - anchor).num_days().abs() <= max_lag_days {
                return Ok(candidate);
            }
        }
    }
    Err(ParseError::ValueDateLag {
        text: text.to_string(),
        anchor,
        max_lag_days,
    })
}

/// Parse a signed amount. The sign comes from an explicit leading or
/// trailing marker when present, otherwise from the column band the
/// fragment sits in (debit left of the credit boundary).
pub fn parse_amount(text: &str, left: f32, bands: &ColumnBands) -> Result<Decimal, ParseError> {
    let (sign, body) = split_sign(text);
    let magnitude =
        normalize_number(body).ok_or_else(|| ParseError::Amount(text.to_string()))?;

    let negative = match sign {
        Some(negative) => negative,
        None => match bands.credit_min_left {
            Some(credit_min) => left < credit_min,
            None => return Err(ParseError::AmountSign(text.to_string())),
        },
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a balance. Statement balances are magnitudes, not signed
/// deltas, so sign markers are stripped and ignored.
pub fn parse_balance(text: &str) -> Result<Decimal, ParseError> {
    let (_, body) = split_sign(text);
    normalize_number(body).ok_or_else(|| ParseError::Amount(text.to_string()))
}

/// Join the buffered description fragments, collapsing whitespace runs
/// to single spaces.
pub fn normalize_description(parts: &[String]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Detect a leading or trailing sign marker. Returns the sign (true for
/// negative) and the remaining numeric body.
fn split_sign(text: &str) -> (Option<bool>, &str) {
    let t = text.trim();
    if let Some(rest) = t.strip_prefix('-') {
        (Some(true), rest)
    } else if let Some(rest) = t.strip_prefix('+') {
        (Some(false), rest)
    } else if let Some(rest) = t.strip_suffix('-') {
        (Some(true), rest)
    } else if let Some(rest) = t.strip_suffix('+') {
        (Some(false), rest)
    } else {
        (None, t)
    }
}

/// Normalize a locale-formatted number ("1.204,50", "1 204,50",
/// "1204.50") to a decimal. The rightmost of comma/dot is taken as the
/// decimal separator when both appear.
fn normalize_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(start: NaiveDate, end: NaiveDate) -> StatementPeriod {
        StatementPeriod { start, end }
    }

    #[test]
    fn amount_with_leading_sign() {
        let bands = ColumnBands::default();
        assert_eq!(parse_amount("-32,50", 400.0, &bands).unwrap(), dec("-32.50"));
        assert_eq!(
            parse_amount("+1.204,50", 400.0, &bands).unwrap(),
            dec("1204.50")
        );
    }

    #[test]
    fn amount_with_trailing_sign() {
        let bands = ColumnBands::default();
        assert_eq!(parse_amount("32,50-", 400.0, &bands).unwrap(), dec("-32.50"));
        assert_eq!(parse_amount("500,00+", 400.0, &bands).unwrap(), dec("500.00"));
    }

    #[test]
    fn amount_sign_from_column_band() {
        let bands = ColumnBands {
            credit_min_left: Some(440.0),
            ..ColumnBands::default()
        };
        assert_eq!(parse_amount("32,50", 400.0, &bands).unwrap(), dec("-32.50"));
        assert_eq!(parse_amount("32,50", 450.0, &bands).unwrap(), dec("32.50"));
    }

    #[test]
    fn unsigned_amount_in_merged_column_is_an_error() {
        let bands = ColumnBands::default();
        assert!(matches!(
            parse_amount("32,50", 400.0, &bands),
            Err(ParseError::AmountSign(_))
        ));
    }

    #[test]
    fn garbage_amount_is_an_error() {
        let bands = ColumnBands::default();
        assert!(matches!(
            parse_amount("n/a", 400.0, &bands),
            Err(ParseError::Amount(_))
        ));
    }

    #[test]
    fn balances_are_magnitudes() {
        assert_eq!(parse_balance("1.204,50").unwrap(), dec("1204.50"));
        assert_eq!(parse_balance("1.204,50-").unwrap(), dec("1204.50"));
        assert_eq!(parse_balance("1 204,50").unwrap(), dec("1204.50"));
    }

    #[test]
    fn amount_round_trips_through_statement_format() {
        // parse(format(x)) == x for the statement's own rendering
        let bands = ColumnBands::default();
        let value = dec("-1204.50");
        let formatted = format!("{}", value.abs())
            .replace('.', ",")
            .replace("1204", "1.204");
        assert_eq!(formatted, "1.204,50");
        assert_eq!(
            parse_amount(&format!("-{formatted}"), 400.0, &bands).unwrap(),
            value
        );
    }

    #[test]
    fn entry_date_with_full_year() {
        assert_eq!(
            parse_entry_date("01.03.2024", None).unwrap(),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn entry_date_year_inferred_from_period() {
        let p = period(date(2016, 9, 1), date(2016, 11, 30));
        assert_eq!(parse_entry_date("05.10", Some(p)).unwrap(), date(2016, 10, 5));
    }

    #[test]
    fn entry_date_year_inferred_across_year_boundary() {
        let p = period(date(2024, 12, 15), date(2025, 1, 15));
        assert_eq!(parse_entry_date("03.01", Some(p)).unwrap(), date(2025, 1, 3));
        assert_eq!(
            parse_entry_date("20.12", Some(p)).unwrap(),
            date(2024, 12, 20)
        );
    }

    #[test]
    fn entry_date_outside_period_is_an_error() {
        let p = period(date(2016, 9, 1), date(2016, 11, 30));
        assert!(matches!(
            parse_entry_date("05.02", Some(p)),
            Err(ParseError::DateOutsidePeriod { .. })
        ));
    }

    #[test]
    fn entry_date_without_year_needs_a_period() {
        assert!(matches!(
            parse_entry_date("05.10", None),
            Err(ParseError::Date(_))
        ));
    }

    #[test]
    fn invalid_calendar_date_is_an_error() {
        let p = period(date(2016, 9, 1), date(2016, 11, 30));
        assert!(matches!(
            parse_entry_date("48.00", Some(p)),
            Err(ParseError::Date(_))
        ));
    }

    #[test]
    fn value_date_tracks_entry_date() {
        assert_eq!(
            parse_value_date("03.03", date(2024, 3, 1), 7).unwrap(),
            date(2024, 3, 3)
        );
        // entry in late December, value in early January
        assert_eq!(
            parse_value_date("02.01", date(2024, 12, 30), 7).unwrap(),
            date(2025, 1, 2)
        );
    }

    #[test]
    fn value_date_too_far_from_entry_is_an_error() {
        assert!(matches!(
            parse_value_date("15.06", date(2024, 3, 1), 7),
            Err(ParseError::ValueDateLag { .. })
        ));
    }

    #[test]
    fn description_whitespace_is_collapsed() {
        let parts = vec![
            "Transfer   to".to_string(),
            " savings account ".to_string(),
            "ref 2024-117".to_string(),
        ];
        assert_eq!(
            normalize_description(&parts),
            "Transfer to savings account ref 2024-117"
        );
    }
}
