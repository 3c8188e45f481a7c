//! Process command - extract a single converted statement.

use std::fs;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;

use statex_core::extract_document;
use statex_core::models::record::TransactionRecord;

use super::{load_config, print_issues};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input HTML file (one converted statement)
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Output format for extracted records.
#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let document = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("statement")
        .to_string();
    let html = fs::read_to_string(&args.input)?;

    let result = extract_document(&html, &document, &config)?;

    print_issues(&result.issues);

    let content = match args.format {
        OutputFormat::Text => format_records_text(&result.records),
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Csv => super::batch::records_to_csv(&result.records)?,
    };

    match args.output {
        Some(path) => {
            fs::write(&path, content)?;
            println!(
                "{} Wrote {} records to {}",
                style("✓").green(),
                result.records.len(),
                path.display()
            );
        }
        None => println!("{content}"),
    }

    Ok(())
}

fn format_records_text(records: &[TransactionRecord]) -> String {
    let mut output = String::new();
    for record in records {
        let amount = format!("{:.2}", record.amount);
        let balance = format!("{:.2}", record.balance_after);
        output.push_str(&format!(
            "{}  {amount:>12}  {balance:>12}  {}\n",
            record.date, record.description
        ));
    }
    output.push_str(&format!("{} records\n", records.len()));
    output
}
