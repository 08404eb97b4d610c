// Google Sheets source
//
// Reads the first worksheet through the Sheets v4 values API. A range without
// a sheet name resolves to the first visible sheet, so one request is enough.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use gcp_auth::TokenProvider;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::{resolve_columns, rows_to_pairs, DataSourceKind, ExamplePair, ExampleSource};
use crate::config::constants::{SHEETS_BASE_URL, SHEETS_READONLY_SCOPE};
use crate::errors::TransliterationError;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const FULL_SHEET_RANGE: &str = "A:ZZZ";

/// How to authenticate against the Sheets API
#[derive(Debug, Clone)]
pub enum SheetCredentials {
    /// Service-account key file (JSON), exchanged for a read-only token
    ServiceAccount(PathBuf),
    /// Pre-issued OAuth access token
    Bearer(String),
}

/// Examples stored in a Google spreadsheet with `tamil` and `arwi` headers
#[derive(Clone)]
pub struct GoogleSheetSource {
    client: Client,
    sheet_id: String,
    credentials: SheetCredentials,
    base_url: String,
}

impl GoogleSheetSource {
    pub fn new(sheet_id: impl Into<String>, credentials: SheetCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            sheet_id: sheet_id.into(),
            credentials,
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    /// Point at a different API host (used for proxies and tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    async fn access_token(&self) -> Result<String> {
        match &self.credentials {
            SheetCredentials::Bearer(token) => Ok(token.clone()),
            SheetCredentials::ServiceAccount(path) => {
                tracing::debug!("Using credentials: {}", path.display());
                let account = gcp_auth::CustomServiceAccount::from_file(path).with_context(|| {
                    format!("Failed to read service account file {}", path.display())
                })?;
                let token = account
                    .token(&[SHEETS_READONLY_SCOPE])
                    .await
                    .context("Failed to obtain Google access token")?;
                Ok(token.as_str().to_string())
            }
        }
    }

    /// Fetch the raw cell grid of the first worksheet
    async fn fetch_values(&self) -> Result<Vec<Vec<String>>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.sheet_id, FULL_SHEET_RANGE
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request to Google Sheets API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!(
                "Google Sheets request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let range: ValueRange = response
            .json()
            .await
            .context("Failed to parse Google Sheets response")?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait]
impl ExampleSource for GoogleSheetSource {
    async fn load(&self) -> Result<Vec<ExamplePair>, TransliterationError> {
        tracing::info!("Loading from Google Sheet: {}", self.sheet_id);

        let mut grid = self
            .fetch_values()
            .await
            .map_err(TransliterationError::unreachable)?
            .into_iter();

        let headers = grid.next().unwrap_or_default();
        let columns = resolve_columns(headers.as_slice())?;
        let rows: Vec<Vec<String>> = grid
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        if rows.is_empty() {
            return Err(TransliterationError::EmptyDataset(format!(
                "spreadsheet {}",
                self.sheet_id
            )));
        }

        let pairs = rows_to_pairs(columns, rows);
        tracing::info!("Sheet loaded. Total records: {}", pairs.len());
        Ok(pairs)
    }

    fn kind(&self) -> DataSourceKind {
        DataSourceKind::GoogleSheet
    }

    fn describe(&self) -> String {
        format!("spreadsheet {}", self.sheet_id)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
