// Example data sources
//
// Both sources produce the same `ExamplePair` records. Headers are matched
// case-insensitively so spreadsheets with "Tamil"/"ARWI" headers still load.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::constants::{SOURCE_COLUMN, TARGET_COLUMN};
use crate::errors::TransliterationError;

pub mod sheets;
pub mod tabular;

pub use sheets::{GoogleSheetSource, SheetCredentials};
pub use tabular::TabularFileSource;

/// One few-shot example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub source_text: String,
    pub target_text: String,
}

impl ExamplePair {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

/// Data source selector as it appears in requests and config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Csv,
    #[default]
    GoogleSheet,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Csv => "csv",
            DataSourceKind::GoogleSheet => "google_sheet",
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceKind {
    type Err = TransliterationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "csv" => Ok(DataSourceKind::Csv),
            "google_sheet" => Ok(DataSourceKind::GoogleSheet),
            other => Err(TransliterationError::UnsupportedSource(other.to_string())),
        }
    }
}

/// A place few-shot examples can be loaded from
#[async_trait]
pub trait ExampleSource: Send + Sync {
    /// Load every example, in source order. Never returns a partial set.
    async fn load(&self) -> Result<Vec<ExamplePair>, TransliterationError>;

    /// Which selector this source answers to
    fn kind(&self) -> DataSourceKind;

    /// Human-readable location (path or spreadsheet id) for diagnostics
    fn describe(&self) -> String;
}

/// Positions of the source/target columns within a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub source: usize,
    pub target: usize,
}

/// Find the `tamil` and `arwi` columns, ignoring case and surrounding whitespace
pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> Result<ColumnIndex, TransliterationError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| clean_header(h.as_ref()).eq_ignore_ascii_case(name))
    };

    match (find(SOURCE_COLUMN), find(TARGET_COLUMN)) {
        (Some(source), Some(target)) => Ok(ColumnIndex { source, target }),
        (source, target) => {
            let mut missing = Vec::new();
            if source.is_none() {
                missing.push(SOURCE_COLUMN.to_string());
            }
            if target.is_none() {
                missing.push(TARGET_COLUMN.to_string());
            }
            Err(TransliterationError::MissingColumns {
                missing,
                found: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            })
        }
    }
}

/// Strip whitespace and a leading byte-order mark from a header cell
fn clean_header(header: &str) -> &str {
    header.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Build pairs from data rows. Cells past the end of a short row read as "".
pub(crate) fn rows_to_pairs<R, S>(columns: ColumnIndex, rows: R) -> Vec<ExamplePair>
where
    R: IntoIterator<Item = Vec<S>>,
    S: Into<String>,
{
    rows.into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.into_iter().map(Into::into).collect();
            let take = |cells: &mut Vec<String>, i: usize| {
                cells.get_mut(i).map(std::mem::take).unwrap_or_default()
            };
            let source_text = take(&mut cells, columns.source);
            let target_text = take(&mut cells, columns.target);
            ExamplePair {
                source_text,
                target_text,
            }
        })
        .collect()
}
