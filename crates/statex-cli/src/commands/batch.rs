//! Batch command - extract, merge, and export multiple statements.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::warn;

use statex_core::models::record::{DocumentResult, ParseIssue, TransactionRecord};
use statex_core::{extract_document, merge, DocumentError, ExtractionConfig, StatexError};

use super::{load_config, print_issues};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output CSV path
    #[arg(short, long, default_value = "transactions.csv")]
    output: PathBuf,

    /// Only process files whose name matches this regex
    #[arg(long)]
    name_filter: Option<String>,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let name_filter = args
        .name_filter
        .as_deref()
        .map(regex::Regex::new)
        .transpose()?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "html" | "htm" | "xhtml")
        })
        .filter(|p| {
            let name = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            name_filter.as_ref().is_none_or(|re| re.is_match(name))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} statements to process",
        style("ℹ").blue(),
        files.len()
    );

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Per-document passes share no mutable state, so they run in
    // parallel; only the merge below touches cross-document state.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .build()?;
    let results: Vec<DocumentResult> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = process_file(path, &config);
                progress.inc(1);
                result
            })
            .collect()
    });
    progress.finish_with_message("Complete");

    let failed = results
        .iter()
        .filter(|r| r.records.is_empty() && r.issues.iter().any(|i| i.context == "document"))
        .count();

    let batch = merge(results);

    write_csv(&args.output, &batch.records)?;

    print_issues(&batch.issues);

    println!();
    println!(
        "{} Extracted {} records from {} statements in {:?}",
        style("✓").green(),
        batch.records.len(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   {} warnings, {} errors, {} failed documents",
        style(batch.warning_count()).yellow(),
        style(batch.error_count()).red(),
        failed
    );
    println!(
        "{} Records written to {}",
        style("✓").green(),
        args.output.display()
    );

    if failed == files.len() {
        anyhow::bail!("all {} documents failed to parse", failed);
    }

    Ok(())
}

/// Run one per-document pass. Any failure becomes a document-level
/// issue so a single bad file never stops the batch.
fn process_file(path: &Path, config: &ExtractionConfig) -> DocumentResult {
    let document = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("statement")
        .to_string();

    let html = match fs::read_to_string(path) {
        Ok(html) => html,
        Err(e) => {
            warn!(%document, "failed to read statement: {e}");
            return DocumentResult {
                records: Vec::new(),
                issues: vec![ParseIssue::error(
                    document,
                    "document",
                    format!("failed to read file: {e}"),
                )],
            };
        }
    };

    match extract_document(&html, &document, config) {
        Ok(result) => result,
        Err(StatexError::Document(DocumentError::Malformed(reason))) => {
            warn!(%document, "skipping malformed statement: {reason}");
            DocumentResult {
                records: Vec::new(),
                issues: vec![ParseIssue::error(
                    document,
                    "document",
                    format!("malformed document skipped: {reason}"),
                )],
            }
        }
        Err(e) => DocumentResult {
            records: Vec::new(),
            issues: vec![ParseIssue::error(document, "document", e.to_string())],
        },
    }
}

fn write_csv(path: &Path, records: &[TransactionRecord]) -> anyhow::Result<()> {
    let content = records_to_csv(records)?;
    fs::write(path, content)?;
    Ok(())
}

/// Serialize records as CSV with the consolidated-table header.
pub fn records_to_csv(records: &[TransactionRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["Date", "Description", "Amount", "Balance", "SourceDocument"])?;

    for record in records {
        wtr.write_record([
            &record.date.format("%Y-%m-%d").to_string(),
            &record.description,
            &format!("{:.2}", record.amount),
            &format!("{:.2}", record.balance_after),
            &record.source_document,
        ])?;
    }

    wtr.flush()?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn csv_has_the_consolidated_header_and_one_line_per_record() {
        let records = vec![TransactionRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            value_date: None,
            description: "Coffee shop".to_string(),
            amount: Decimal::from_str("-32.5").unwrap(),
            balance_after: Decimal::from_str("1204.5").unwrap(),
            source_document: "march.html".to_string(),
            source_lines: (0, 3),
        }];

        let csv = records_to_csv(&records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Description,Amount,Balance,SourceDocument")
        );
        assert_eq!(
            lines.next(),
            Some("2024-03-01,Coffee shop,-32.50,1204.50,march.html")
        );
        assert_eq!(lines.next(), None);
    }
}
