//! Config command - manage extraction configuration.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use statex_core::ExtractionConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file with the calibrated defaults
    Init {
        /// Output path for the configuration file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Get a configuration value (e.g. "columns.balance_min_left")
    Get { key: String },

    /// Set a configuration value
    Set { key: String, value: String },

    /// Show the configuration file path
    Path,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = load_or_default()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { output, force } => {
            let path = output.unwrap_or_else(default_config_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            ExtractionConfig::default().save(&path)?;
            println!(
                "{} Created configuration file at {}",
                style("✓").green(),
                path.display()
            );
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_or_default()?)?;
            let value = lookup(&json, &key)
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {key}"))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigCommand::Set { key, value } => {
            let path = default_config_path();
            let mut json = serde_json::to_value(load_or_default()?)?;

            let parsed: serde_json::Value = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            store(&mut json, &key, parsed.clone())
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {key}"))?;

            let config: ExtractionConfig = serde_json::from_value(json)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            config.save(&path)?;
            println!(
                "{} Set {} = {}",
                style("✓").green(),
                key,
                serde_json::to_string(&parsed)?
            );
        }
        ConfigCommand::Path => {
            let path = default_config_path();
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!();
                println!("Run 'statex config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("statex")
        .join("config.json")
}

fn load_or_default() -> anyhow::Result<ExtractionConfig> {
    let path = default_config_path();
    if path.exists() {
        Ok(ExtractionConfig::from_file(&path)?)
    } else {
        Ok(ExtractionConfig::default())
    }
}

fn lookup<'a>(json: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    key.split('.').try_fold(json, |value, part| value.get(part))
}

fn store(
    json: &mut serde_json::Value,
    key: &str,
    new_value: serde_json::Value,
) -> Option<()> {
    let (parents, leaf) = key.rsplit_once('.').unwrap_or(("", key));
    let mut target = json;
    for part in parents.split('.').filter(|p| !p.is_empty()) {
        target = target.get_mut(part)?;
    }
    target.as_object_mut()?.insert(leaf.to_string(), new_value);
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_nested_keys() {
        let json = serde_json::to_value(ExtractionConfig::default()).unwrap();
        assert_eq!(
            lookup(&json, "columns.balance_min_left"),
            Some(&serde_json::json!(490.0))
        );
        assert!(lookup(&json, "columns.no_such_key").is_none());
    }

    #[test]
    fn store_replaces_nested_values() {
        let mut json = serde_json::to_value(ExtractionConfig::default()).unwrap();
        store(&mut json, "columns.balance_min_left", serde_json::json!(520.0)).unwrap();
        let config: ExtractionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.columns.balance_min_left, 520.0);
    }

    #[test]
    fn store_rejects_unknown_paths() {
        let mut json = serde_json::to_value(ExtractionConfig::default()).unwrap();
        assert!(store(&mut json, "nope.missing", serde_json::json!(1)).is_none());
    }
}
