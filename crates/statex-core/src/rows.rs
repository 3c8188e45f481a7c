//! Logical row reconstruction from the fragment stream.
//!
//! A transaction may span several visual lines (wrapped descriptions,
//! page breaks) and some exports repeat amount fragments per visual
//! line, so rows are rebuilt with a current-row buffer: date-pattern
//! fragments and oversized vertical gaps start new rows, everything
//! else accumulates into the row under construction.

use tracing::{debug, warn};

use crate::fields::patterns::looks_like_date;
use crate::models::config::ExtractionConfig;
use crate::models::record::ParseIssue;
use crate::tokens::{ColumnHint, PositionedFragment};

/// Fragments believed to belong to one transaction, irrespective of how
/// many visual lines it spanned. Mutable during reconstruction; consumed
/// by value once classification starts.
#[derive(Debug, Clone)]
pub struct LogicalRow {
    pub date: Option<PositionedFragment>,
    pub value_date: Option<PositionedFragment>,
    /// Accumulated description buffer, one entry per fragment.
    pub description: Vec<String>,
    pub amount: Option<PositionedFragment>,
    pub balance: Option<PositionedFragment>,
    first_line: usize,
    last_line: usize,
}

impl LogicalRow {
    fn new(sequence: usize) -> Self {
        Self {
            date: None,
            value_date: None,
            description: Vec::new(),
            amount: None,
            balance: None,
            first_line: sequence,
            last_line: sequence,
        }
    }

    fn started_by(fragment: PositionedFragment) -> Self {
        let mut row = Self::new(fragment.sequence);
        row.date = Some(fragment);
        row
    }

    /// Fragment ordinal range this row spans in the source document.
    pub fn lines(&self) -> (usize, usize) {
        (self.first_line, self.last_line)
    }

    fn touch(&mut self, sequence: usize) {
        self.last_line = self.last_line.max(sequence);
    }

    /// Whether a date fragment should fill the value-date column: the
    /// entry date is the only thing seen so far and the fragment sits on
    /// the same visual line, left of the description column.
    fn wants_value_date(&self, fragment: &PositionedFragment) -> bool {
        let Some(date) = &self.date else {
            return false;
        };
        self.value_date.is_none()
            && self.description.is_empty()
            && self.amount.is_none()
            && self.balance.is_none()
            && fragment.page == date.page
            && (fragment.vertical - date.vertical).abs() < 1.0
    }

    fn set_value_date(&mut self, fragment: PositionedFragment) {
        self.touch(fragment.sequence);
        self.value_date = Some(fragment);
    }

    fn push_description(&mut self, fragment: PositionedFragment) {
        self.touch(fragment.sequence);
        self.description.push(fragment.text);
    }

    fn set_amount(&mut self, fragment: PositionedFragment) {
        if let Some(previous) = &self.amount {
            // Last writer wins; repeated amount fragments also signal
            // possible misclassification, so leave a trace.
            debug!(
                old = %previous.text,
                new = %fragment.text,
                "amount fragment overwritten"
            );
        }
        self.touch(fragment.sequence);
        self.amount = Some(fragment);
    }

    fn set_balance(&mut self, fragment: PositionedFragment) {
        if let Some(previous) = &self.balance {
            debug!(
                old = %previous.text,
                new = %fragment.text,
                "balance fragment overwritten"
            );
        }
        self.touch(fragment.sequence);
        self.balance = Some(fragment);
    }

    /// Fold a dateless follow-up row into this one: its text continues
    /// the wrapped description, and any amount/balance fragments it
    /// picked up follow the last-writer-wins rule.
    fn absorb(&mut self, other: LogicalRow) {
        self.description.extend(other.description);
        if let Some(amount) = other.amount {
            self.set_amount(amount);
        }
        if let Some(balance) = other.balance {
            self.set_balance(balance);
        }
        self.last_line = self.last_line.max(other.last_line);
    }
}

/// Group the fragment stream into logical rows.
///
/// A fragment starts a new row when its column hint is Date and its text
/// reads as a date, or when the vertical gap since the previous fragment
/// exceeds the configured row-break threshold. Gap detection is
/// suppressed across page boundaries so rows may span pages.
pub fn reconstruct(
    stream: impl Iterator<Item = PositionedFragment>,
    config: &ExtractionConfig,
    document: &str,
    issues: &mut Vec<ParseIssue>,
) -> Vec<LogicalRow> {
    let mut rows: Vec<LogicalRow> = Vec::new();
    let mut current: Option<LogicalRow> = None;
    let mut last_position: Option<(usize, f32)> = None;

    for fragment in stream {
        let gap_break = match last_position {
            Some((page, vertical)) => {
                fragment.page == page && fragment.vertical - vertical > config.row_break_gap
            }
            None => false,
        };
        last_position = Some((fragment.page, fragment.vertical));

        if fragment.hint == ColumnHint::Date && looks_like_date(&fragment.text) {
            if let Some(row) = current.as_mut() {
                if !gap_break && row.wants_value_date(&fragment) {
                    row.set_value_date(fragment);
                    continue;
                }
            }
            flush(&mut current, &mut rows);
            current = Some(LogicalRow::started_by(fragment));
            continue;
        }

        if gap_break {
            flush(&mut current, &mut rows);
        }

        let row = current.get_or_insert_with(|| LogicalRow::new(fragment.sequence));
        match fragment.hint {
            ColumnHint::Amount => row.set_amount(fragment),
            ColumnHint::Balance => row.set_balance(fragment),
            ColumnHint::Date => {
                // The date band also renders decoration on some layouts.
                debug!(text = %fragment.text, "dropping non-date fragment in date column");
                row.touch(fragment.sequence);
            }
            ColumnHint::Description | ColumnHint::Unknown => row.push_description(fragment),
        }
    }

    finish(current, &mut rows, document, issues);
    rows
}

fn flush(current: &mut Option<LogicalRow>, rows: &mut Vec<LogicalRow>) {
    let Some(row) = current.take() else {
        return;
    };
    if row.date.is_some() {
        rows.push(row);
        return;
    }
    // A row that never saw a date is the continuation of the previous
    // row's description (the date column was blank for a wrapped line).
    match rows.last_mut() {
        Some(previous) => previous.absorb(row),
        None => debug!("dropping dateless fragments before the first transaction"),
    }
}

fn finish(
    mut current: Option<LogicalRow>,
    rows: &mut Vec<LogicalRow>,
    document: &str,
    issues: &mut Vec<ParseIssue>,
) {
    let Some(row) = current.take() else {
        return;
    };
    if row.date.is_none() {
        let mut trailing = Some(row);
        flush(&mut trailing, rows);
        return;
    }
    if row.amount.is_none() || row.balance.is_none() {
        let (start, end) = row.lines();
        warn!(document, start, end, "discarding incomplete row at end of stream");
        issues.push(ParseIssue::warning(
            document,
            format!("lines {start}-{end}"),
            "row at end of stream is missing an amount or balance fragment; discarded",
        ));
        return;
    }
    rows.push(row);
}
