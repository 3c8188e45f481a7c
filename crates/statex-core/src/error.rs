//! Error types for the statex-core library.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the statex library.
#[derive(Error, Debug)]
pub enum StatexError {
    /// Document-level processing error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that are fatal for one document only.
///
/// The batch orchestrator catches these, records a document-level issue,
/// and continues with the remaining documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The tree contains no recognizable page/text structure; the input
    /// is not the expected export format.
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Errors raised while parsing a single field of a single row.
///
/// These never escape a per-document pass: the offending row is dropped
/// and the error is recorded as a warning issue.
#[derive(Error, Debug)]
pub enum ParseError {
    /// No recognized date pattern matched.
    #[error("unrecognized date: {0}")]
    Date(String),

    /// A day-month date could not be placed within the statement period.
    #[error("date {text} cannot be placed within {start} - {end}")]
    DateOutsidePeriod {
        text: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// A value date could not be placed near its entry date.
    #[error("value date {text} is not within {max_lag_days} days of {anchor}")]
    ValueDateLag {
        text: String,
        anchor: NaiveDate,
        max_lag_days: i64,
    },

    /// The amount text is not a recognizable number.
    #[error("unrecognized amount: {0}")]
    Amount(String),

    /// The amount carries no sign marker and the layout defines no
    /// debit/credit column split to infer one from.
    #[error("amount {0} has no sign marker and no debit/credit split is configured")]
    AmountSign(String),
}

/// Result type for the statex library.
pub type Result<T> = std::result::Result<T, StatexError>;
