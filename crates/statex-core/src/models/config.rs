//! Configuration for the extraction pipeline.
//!
//! The export scales with page size and converter settings, so every
//! positional threshold is configuration rather than a constant. The
//! defaults are calibrated against the statement layout this engine was
//! built for.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the statex pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Column band boundaries, in the export's pt coordinates.
    pub columns: ColumnBands,

    /// Vertical gap (pt) above which a fragment starts a new logical row.
    /// Must exceed the line pitch of wrapped description lines.
    pub row_break_gap: f32,

    /// Font size (pt) of transaction table text. Fragments rendered at
    /// other sizes are decoration and are dropped. `None` disables the
    /// filter.
    pub table_font_size: Option<f32>,

    /// Tolerance for the running-balance continuity check.
    pub balance_tolerance: Decimal,

    /// Maximum days a value date may lie from its entry date.
    pub value_date_max_lag_days: i64,

    /// Regexes matching boilerplate fragments to drop (headers, footers,
    /// page numbers).
    pub boilerplate: Vec<String>,

    /// Regex recognizing the statement-period banner. Must capture the
    /// period start and end dates as groups 1 and 2. When the banner is
    /// present, fragments before it are dropped and day-month dates are
    /// resolved against the captured period.
    pub period_banner: String,

    /// Regex recognizing the closing-balance banner that ends the
    /// transaction table; it and everything after it are dropped.
    pub closing_banner: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            columns: ColumnBands::default(),
            row_break_gap: 18.0,
            table_font_size: Some(9.0),
            balance_tolerance: Decimal::new(1, 2),
            value_date_max_lag_days: 7,
            boilerplate: vec![
                r"(?i)^page\s+\d+(\s+of\s+\d+)?$".to_string(),
                r"(?i)^continued(\s+on\s+next\s+page)?$".to_string(),
            ],
            period_banner: r"(?i)period this statement relates to[:\s]+(\d{1,2}\.\d{1,2}\.\d{4})\s+to\s+(\d{1,2}\.\d{1,2}\.\d{4})"
                .to_string(),
            closing_banner: r"(?i)^balance as at\b".to_string(),
        }
    }
}

/// Horizontal boundaries separating statement columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnBands {
    /// Fragments at or left of this are date-column text (the entry and
    /// value date columns both fall in this band).
    pub date_max_left: f32,

    /// Fragments at or right of this are amount-column text.
    pub amount_min_left: f32,

    /// Fragments at or right of this are balance-column text.
    pub balance_min_left: f32,

    /// Left edge of the credit column when the layout splits debit and
    /// credit. `None` means one merged column with explicit sign markers.
    pub credit_min_left: Option<f32>,
}

impl Default for ColumnBands {
    fn default() -> Self {
        Self {
            date_max_left: 110.0,
            amount_min_left: 390.0,
            balance_min_left: 490.0,
            credit_min_left: None,
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
