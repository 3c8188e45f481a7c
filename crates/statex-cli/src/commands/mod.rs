//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use console::style;

use statex_core::models::record::{ParseIssue, Severity};
use statex_core::ExtractionConfig;

/// Load the extraction config from an explicit path, the default config
/// location, or fall back to the built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ExtractionConfig> {
    if let Some(path) = config_path {
        return Ok(ExtractionConfig::from_file(std::path::Path::new(path))?);
    }
    let default_path = config::default_config_path();
    if default_path.exists() {
        return Ok(ExtractionConfig::from_file(&default_path)?);
    }
    Ok(ExtractionConfig::default())
}

/// Report collected issues without aborting: warnings in passing,
/// errors prominently.
pub fn print_issues(issues: &[ParseIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Warning => {
                println!("{} {}", style("⚠").yellow(), issue);
            }
            Severity::Error => {
                println!("{} {}", style("✗").red().bold(), style(issue).red());
            }
        }
    }
}
