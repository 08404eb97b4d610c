// Local tabular file source: CSV/TSV via `csv`, spreadsheets via `calamine`

use anyhow::{Context, Result};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::{Path, PathBuf};

use super::{resolve_columns, rows_to_pairs, DataSourceKind, ExamplePair, ExampleSource};
use crate::errors::TransliterationError;

/// File formats the tabular source understands, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Delimited(u8),
    Workbook,
}

impl FileFormat {
    fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("tsv") | Some("tab") => FileFormat::Delimited(b'\t'),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                FileFormat::Workbook
            }
            _ => FileFormat::Delimited(b','),
        }
    }
}

/// Examples stored in a local file with `tamil` and `arwi` header columns
#[derive(Debug, Clone)]
pub struct TabularFileSource {
    path: PathBuf,
}

impl TabularFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking load; `load()` runs this on the blocking pool
    pub fn load_sync(&self) -> Result<Vec<ExamplePair>, TransliterationError> {
        let (headers, rows) = match FileFormat::for_path(&self.path) {
            FileFormat::Delimited(delimiter) => read_delimited(&self.path, delimiter),
            FileFormat::Workbook => read_workbook(&self.path),
        }
        .map_err(TransliterationError::unreachable)?;

        let columns = resolve_columns(headers.as_slice())?;
        if rows.is_empty() {
            return Err(TransliterationError::EmptyDataset(
                self.path.display().to_string(),
            ));
        }

        Ok(rows_to_pairs(columns, rows))
    }
}

#[async_trait]
impl ExampleSource for TabularFileSource {
    async fn load(&self) -> Result<Vec<ExamplePair>, TransliterationError> {
        tracing::info!("Loading examples from file: {}", self.path.display());

        let source = self.clone();
        let pairs = tokio::task::spawn_blocking(move || source.load_sync())
            .await
            .map_err(|e| TransliterationError::DataSourceUnreachable(e.to_string()))??;

        tracing::info!("File loaded. Total records: {}", pairs.len());
        Ok(pairs)
    }

    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Csv
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

type Table = (Vec<String>, Vec<Vec<String>>);

fn read_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // Row numbers are 1-based and count the header line.
        let record =
            record.with_context(|| format!("Failed to parse row {} of {}", i + 2, path.display()))?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok((headers, rows))
}

fn read_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("Workbook {} has no worksheets", path.display()))?
        .with_context(|| format!("Failed to read first worksheet of {}", path.display()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let headers = rows.next().unwrap_or_default();
    let rows = rows
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    Ok((headers, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
