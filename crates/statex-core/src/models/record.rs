//! Transaction records, parse issues, and batch results.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single extracted statement transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Entry date of the transaction.
    pub date: NaiveDate,

    /// Value date, when the statement carries a separate value column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_date: Option<NaiveDate>,

    /// Merged, whitespace-normalized description.
    pub description: String,

    /// Signed transaction amount (debits negative).
    pub amount: Decimal,

    /// Statement balance after this transaction was booked.
    pub balance_after: Decimal,

    /// Name of the document the record was extracted from.
    pub source_document: String,

    /// Fragment ordinal range (start, end) the record spans in the
    /// source document stream.
    pub source_lines: (usize, usize),
}

impl TransactionRecord {
    /// Key for exact-duplicate detection across overlapping exports.
    ///
    /// The balance is part of the key so that legitimately repeated
    /// transactions (same day, same amount, different running balance)
    /// survive deduplication.
    pub fn dedup_key(&self) -> (NaiveDate, &str, Decimal, Decimal) {
        (
            self.date,
            self.description.as_str(),
            self.amount,
            self.balance_after,
        )
    }
}

/// Severity of a collected parse issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A row or record was dropped or partially recovered.
    Warning,
    /// Data was extracted but an invariant was violated.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A non-fatal problem observed during extraction.
///
/// Issues are collected alongside records, never thrown away; the batch
/// orchestrator surfaces them after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub severity: Severity,
    /// Document the issue was observed in.
    pub document: String,
    /// Where in the document (e.g. a fragment line range).
    pub context: String,
    pub message: String,
}

impl ParseIssue {
    pub fn warning(
        document: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            document: document.into(),
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn error(
        document: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            document: document.into(),
            context: context.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} {}] {}",
            self.severity, self.document, self.context, self.message
        )
    }
}

/// Per-document extraction outcome: records in statement order plus the
/// issues collected during the pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentResult {
    pub records: Vec<TransactionRecord>,
    pub issues: Vec<ParseIssue>,
}

/// Merged outcome of a batch run.
///
/// Records are chronologically ordered with a stable tie-break on
/// (document name, line range start); assembled once, not mutated after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub records: Vec<TransactionRecord>,
    pub issues: Vec<ParseIssue>,
}

impl BatchResult {
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(balance: &str) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            value_date: None,
            description: "Coffee shop".to_string(),
            amount: Decimal::from_str("-32.50").unwrap(),
            balance_after: Decimal::from_str(balance).unwrap(),
            source_document: "march.html".to_string(),
            source_lines: (4, 7),
        }
    }

    #[test]
    fn dedup_key_ignores_source_document() {
        let a = record("1204.50");
        let mut b = record("1204.50");
        b.source_document = "overlap.html".to_string();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn dedup_key_distinguishes_repeated_purchases() {
        let a = record("1204.50");
        let b = record("1172.00");
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Error.to_string(), "ERROR");
    }

    #[test]
    fn issue_counts() {
        let result = BatchResult {
            records: Vec::new(),
            issues: vec![
                ParseIssue::warning("a.html", "lines 1-2", "dropped"),
                ParseIssue::error("a.html", "lines 3-8", "balance gap"),
                ParseIssue::warning("b.html", "lines 4-4", "dropped"),
            ],
        };
        assert_eq!(result.warning_count(), 2);
        assert_eq!(result.error_count(), 1);
    }
}
