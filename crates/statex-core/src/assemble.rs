//! Record assembly and running-balance validation.
//!
//! Statements are chronological top-to-bottom, so document order is
//! preserved. The running-balance invariant (each balance equals the
//! previous balance plus the current amount) is checked across
//! consecutive records; a mismatch beyond tolerance is flagged with an
//! error issue referencing both records, but neither record is dropped.
//! The output is best effort, flagged, never silently wrong.

use tracing::warn;

use crate::fields::ClassifiedRow;
use crate::models::config::ExtractionConfig;
use crate::models::record::{ParseIssue, TransactionRecord};

/// Sequence classified rows into the final per-document record list and
/// validate running-balance continuity.
pub fn assemble(
    rows: Vec<ClassifiedRow>,
    document: &str,
    config: &ExtractionConfig,
    issues: &mut Vec<ParseIssue>,
) -> Vec<TransactionRecord> {
    let records: Vec<TransactionRecord> = rows
        .into_iter()
        .map(|row| TransactionRecord {
            date: row.date,
            value_date: row.value_date,
            description: row.description,
            amount: row.amount,
            balance_after: row.balance,
            source_document: document.to_string(),
            source_lines: row.source_lines,
        })
        .collect();

    for pair in records.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let expected = previous.balance_after + current.amount;
        let drift = (current.balance_after - expected).abs();
        if drift > config.balance_tolerance {
            warn!(
                document,
                date = %current.date,
                %drift,
                "running balance discontinuity"
            );
            issues.push(ParseIssue::error(
                document,
                format!(
                    "lines {}-{} and {}-{}",
                    previous.source_lines.0,
                    previous.source_lines.1,
                    current.source_lines.0,
                    current.source_lines.1
                ),
                format!(
                    "running balance mismatch: {} on {} plus {} gives {}, statement says {}",
                    previous.balance_after,
                    previous.date,
                    current.amount,
                    expected,
                    current.balance_after
                ),
            ));
        }
    }

    records
}
