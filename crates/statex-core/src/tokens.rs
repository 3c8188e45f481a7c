//! Token stream building from converted statement documents.
//!
//! A converted statement arrives as the HTML rendering of a PDF page
//! sequence: per-page `<div>` containers holding absolutely positioned
//! `<p>` elements, each with a `<span>` carrying the text. Nothing is
//! tagged semantically, so column roles are inferred by bucketing the
//! `left:` style position against configured band boundaries.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::error::{DocumentError, StatexError};
use crate::fields::patterns::parse_full_date;
use crate::models::config::{ColumnBands, ExtractionConfig};

lazy_static! {
    static ref STYLE_LEFT: Regex = Regex::new(r"left:\s*(-?\d+(?:\.\d+)?)pt").unwrap();
    static ref STYLE_TOP: Regex = Regex::new(r"top:\s*(-?\d+(?:\.\d+)?)pt").unwrap();
    static ref FONT_SIZE: Regex = Regex::new(r"font-size:\s*(\d+(?:\.\d+)?)pt").unwrap();
    static ref PAGE_SELECTOR: Selector = Selector::parse("div[id^='page']").unwrap();
    static ref PARA_SELECTOR: Selector = Selector::parse("p").unwrap();
    static ref SPAN_SELECTOR: Selector = Selector::parse("span").unwrap();
}

/// Inferred semantic role of a text fragment, derived from its position
/// rather than from markup meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHint {
    Date,
    Description,
    Amount,
    Balance,
    Unknown,
}

/// A positioned text fragment from the converted document.
#[derive(Debug, Clone)]
pub struct PositionedFragment {
    pub text: String,
    pub hint: ColumnHint,
    /// Horizontal position (pt) from the page left edge; -1.0 when the
    /// element carried no usable position.
    pub left: f32,
    /// Vertical position (pt) from the page top edge.
    pub vertical: f32,
    pub page: usize,
    /// Ordinal in the document stream, used for source line ranges.
    pub sequence: usize,
}

/// The date window a statement covers, taken from its period banner.
/// Used to resolve day-month dates that are printed without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementPeriod {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl StatementPeriod {
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Ordered stream of positioned fragments for one document.
///
/// Finite and non-restartable; consumed once by the row reconstructor.
#[derive(Debug)]
pub struct FragmentStream {
    fragments: std::vec::IntoIter<PositionedFragment>,
    period: Option<StatementPeriod>,
}

impl FragmentStream {
    /// Walk the converted document and build the fragment stream in
    /// reading order (page, then top to bottom, then left to right).
    ///
    /// Fails with [`DocumentError::Malformed`] only when the tree holds
    /// no positioned text at all; unusual individual fragments are kept
    /// with [`ColumnHint::Unknown`] instead.
    pub fn build(html: &str, config: &ExtractionConfig) -> Result<Self, StatexError> {
        let boilerplate = compile_patterns(&config.boilerplate)?;
        let period_banner = compile_pattern(&config.period_banner)?;
        let closing_banner = compile_pattern(&config.closing_banner)?;

        let doc = Html::parse_document(html);
        let mut raw: Vec<PositionedFragment> = Vec::new();

        let pages: Vec<ElementRef<'_>> = doc.select(&PAGE_SELECTOR).collect();
        if pages.is_empty() {
            // Some exports skip the per-page containers.
            collect_page(doc.root_element(), 0, config, &mut raw);
        } else {
            for (page, element) in pages.into_iter().enumerate() {
                collect_page(element, page, config, &mut raw);
            }
        }

        if raw.is_empty() {
            return Err(DocumentError::Malformed(
                "no positioned text fragments found".to_string(),
            )
            .into());
        }

        raw.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then(a.vertical.total_cmp(&b.vertical))
                .then(a.left.total_cmp(&b.left))
        });
        for (sequence, fragment) in raw.iter_mut().enumerate() {
            fragment.sequence = sequence;
        }

        let (mut fragments, period) =
            apply_statement_window(raw, &period_banner, &closing_banner);

        fragments.retain(|f| {
            let drop = boilerplate.iter().any(|re| re.is_match(&f.text));
            if drop {
                trace!(text = %f.text, "dropping boilerplate fragment");
            }
            !drop
        });

        debug!(
            fragments = fragments.len(),
            period = ?period,
            "built fragment stream"
        );

        Ok(Self {
            fragments: fragments.into_iter(),
            period,
        })
    }

    /// The statement period, when a period banner was found.
    pub fn period(&self) -> Option<StatementPeriod> {
        self.period
    }
}

impl Iterator for FragmentStream {
    type Item = PositionedFragment;

    fn next(&mut self) -> Option<Self::Item> {
        self.fragments.next()
    }
}

/// Bucket a horizontal position against the configured column bands.
pub fn bucket(left: f32, bands: &ColumnBands) -> ColumnHint {
    if left >= bands.balance_min_left {
        ColumnHint::Balance
    } else if left >= bands.amount_min_left {
        ColumnHint::Amount
    } else if left <= bands.date_max_left {
        ColumnHint::Date
    } else {
        ColumnHint::Description
    }
}

fn collect_page(
    root: ElementRef<'_>,
    page: usize,
    config: &ExtractionConfig,
    out: &mut Vec<PositionedFragment>,
) {
    let mut last_vertical = 0.0f32;

    for para in root.select(&PARA_SELECTOR) {
        let Some(span) = para.select(&SPAN_SELECTOR).next() else {
            continue;
        };

        if let Some(want) = config.table_font_size {
            let size = span
                .value()
                .attr("style")
                .and_then(|s| style_value(&FONT_SIZE, s));
            match size {
                Some(size) if (size - want).abs() < 0.25 => {}
                // Decoration renders at other sizes.
                _ => continue,
            }
        }

        let text: String = span.text().collect();
        if text.trim().is_empty() {
            continue;
        }

        let style = para.value().attr("style").unwrap_or("");
        let left = style_value(&STYLE_LEFT, style);
        let top = style_value(&STYLE_TOP, style);
        if let Some(top) = top {
            last_vertical = top;
        }

        let hint = match left {
            Some(left) => bucket(left, &config.columns),
            None => ColumnHint::Unknown,
        };

        out.push(PositionedFragment {
            text: text.trim().to_string(),
            hint,
            left: left.unwrap_or(-1.0),
            vertical: top.unwrap_or(last_vertical),
            page,
            sequence: 0, // assigned after sorting
        });
    }
}

/// Restrict the stream to the statement's transaction table when the
/// document carries a period banner: fragments before the banner and
/// from the closing-balance banner onward are layout furniture.
fn apply_statement_window(
    fragments: Vec<PositionedFragment>,
    period_banner: &Regex,
    closing_banner: &Regex,
) -> (Vec<PositionedFragment>, Option<StatementPeriod>) {
    let mut opened = None;
    for (index, fragment) in fragments.iter().enumerate() {
        if let Some(caps) = period_banner.captures(&fragment.text) {
            let period = match (parse_full_date(&caps[1]), parse_full_date(&caps[2])) {
                (Some(start), Some(end)) => Some(StatementPeriod { start, end }),
                _ => {
                    debug!(text = %fragment.text, "period banner matched but dates unreadable");
                    None
                }
            };
            opened = Some((index, period));
            break;
        }
    }

    let Some((open_at, period)) = opened else {
        return (fragments, None);
    };

    let mut kept: Vec<PositionedFragment> =
        fragments.into_iter().skip(open_at + 1).collect();
    if let Some(close_at) = kept.iter().position(|f| closing_banner.is_match(&f.text)) {
        kept.truncate(close_at);
    }
    (kept, period)
}

fn style_value(pattern: &Regex, style: &str) -> Option<f32> {
    pattern.captures(style).and_then(|caps| caps[1].parse().ok())
}

fn compile_pattern(pattern: &str) -> Result<Regex, StatexError> {
    Regex::new(pattern)
        .map_err(|e| StatexError::Config(format!("invalid pattern {pattern:?}: {e}")))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, StatexError> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}
