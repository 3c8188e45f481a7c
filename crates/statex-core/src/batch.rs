//! Per-document extraction and cross-document merging.
//!
//! `extract_document` is the whole pipeline for one converted statement;
//! it owns the pass's fragment stream, row buffers and issue list, so
//! documents can be processed in parallel without shared state. `merge`
//! is the only cross-document step and runs after all passes complete.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::assemble;
use crate::error::Result;
use crate::fields;
use crate::models::config::ExtractionConfig;
use crate::models::record::{BatchResult, DocumentResult};
use crate::rows;
use crate::tokens::FragmentStream;

/// Run the full extraction pipeline over one converted statement.
///
/// Fails only when the document structure itself is unrecognizable
/// ([`crate::DocumentError::Malformed`]); every row-level problem is
/// recorded in the returned issue list instead.
pub fn extract_document(
    html: &str,
    document: &str,
    config: &ExtractionConfig,
) -> Result<DocumentResult> {
    let stream = FragmentStream::build(html, config)?;
    let period = stream.period();

    let mut issues = Vec::new();
    let logical_rows = rows::reconstruct(stream, config, document, &mut issues);
    debug!(document, rows = logical_rows.len(), "reconstructed logical rows");

    let classified: Vec<_> = logical_rows
        .into_iter()
        .filter_map(|row| fields::classify(row, period, config, document, &mut issues))
        .collect();

    let records = assemble::assemble(classified, document, config, &mut issues);
    info!(
        document,
        records = records.len(),
        issues = issues.len(),
        "document extracted"
    );

    Ok(DocumentResult { records, issues })
}

/// Merge per-document results into the final batch result: concatenate,
/// sort chronologically with a stable (document, line) tie-break, and
/// drop exact duplicates arising from overlapping bulk exports.
pub fn merge(results: Vec<DocumentResult>) -> BatchResult {
    let mut records = Vec::new();
    let mut issues = Vec::new();
    for result in results {
        records.extend(result.records);
        issues.extend(result.issues);
    }

    records.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.source_document.cmp(&b.source_document))
            .then_with(|| a.source_lines.0.cmp(&b.source_lines.0))
    });

    let before = records.len();
    let mut seen = HashSet::new();
    records.retain(|r| {
        seen.insert((
            r.date,
            r.description.clone(),
            r.amount,
            r.balance_after,
        ))
    });
    if records.len() < before {
        debug!(duplicates = before - records.len(), "dropped overlapping records");
    }

    BatchResult { records, issues }
}
