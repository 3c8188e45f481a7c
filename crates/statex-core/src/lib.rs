//! Core library for bank statement extraction.
//!
//! This crate provides:
//! - Token stream building from converted statement documents (HTML trees
//!   with positional style metadata, no semantic table markup)
//! - Logical row reconstruction from positioned text fragments
//! - Field classification and locale-aware date/amount parsing
//! - Record assembly with running-balance validation and batch merging

pub mod error;
pub mod models;
pub mod tokens;
pub mod rows;
pub mod fields;
pub mod assemble;
pub mod batch;

pub use error::{StatexError, DocumentError, ParseError, Result};
pub use models::config::{ExtractionConfig, ColumnBands};
pub use models::record::{
    TransactionRecord, ParseIssue, Severity, DocumentResult, BatchResult,
};
pub use tokens::{ColumnHint, PositionedFragment, FragmentStream, StatementPeriod};
pub use rows::LogicalRow;
pub use fields::ClassifiedRow;
pub use batch::{extract_document, merge};
