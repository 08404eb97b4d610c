// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::constants::*;
use crate::data::DataSourceKind;

/// Top-level service configuration, passed explicitly to every component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Gemini generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. Overridden by GEMINI_API_KEY when that is set.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Example data sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Source used when a request does not name one
    #[serde(default)]
    pub default_source: DataSourceKind,
    /// Tabular file (csv, tsv, xlsx, xls, ods)
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// Spreadsheet id. An empty string (or `None`) disables the google_sheet
    /// source; read it through [`DataConfig::sheet_id`].
    #[serde(default = "default_sheet_id")]
    pub sheet_id: Option<String>,
    /// Service-account JSON file for the Sheets API
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Pre-issued OAuth bearer token, used instead of the service account
    #[serde(default, skip_serializing)]
    pub sheets_token: Option<String>,
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,
}

/// Activity log locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append-only JSONL log
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Overwritten with the most recent output
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    /// When set, non-empty contents of this file replace the request input.
    /// Off by default; intended for debugging only.
    #[serde(default)]
    pub input_override_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    DEFAULT_HTTP_ADDR.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_gemini_base_url() -> String {
    GEMINI_BASE_URL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f32 {
    DEFAULT_TOP_P
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_csv_path() -> PathBuf {
    PathBuf::from(DEFAULT_CSV_PATH)
}

fn default_sheet_id() -> Option<String> {
    Some(DEFAULT_SHEET_ID.to_string())
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_PATH)
}

fn default_sheets_base_url() -> String {
    SHEETS_BASE_URL.to_string()
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

fn default_output_file() -> PathBuf {
    std::env::temp_dir().join(OUTPUT_FILE_NAME)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_gemini_base_url(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_source: DataSourceKind::default(),
            csv_path: default_csv_path(),
            sheet_id: default_sheet_id(),
            credentials_path: default_credentials_path(),
            sheets_token: None,
            sheets_base_url: default_sheets_base_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            output_file: default_output_file(),
            input_override_file: None,
        }
    }
}

impl DataConfig {
    /// The configured spreadsheet id, or `None` when the sheet source is off
    pub fn sheet_id(&self) -> Option<&str> {
        self.sheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl Config {
    /// True when a non-empty API key is available
    pub fn api_key_loaded(&self) -> bool {
        self.gemini
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> Result<()> {
        let gemini = &self.gemini;

        if !(0.0..=2.0).contains(&gemini.temperature) {
            bail!(
                "gemini.temperature must be between 0.0 and 2.0 (got {})",
                gemini.temperature
            );
        }
        if !(0.0..=1.0).contains(&gemini.top_p) || gemini.top_p == 0.0 {
            bail!("gemini.top_p must be in (0.0, 1.0] (got {})", gemini.top_p);
        }
        if gemini.top_k == 0 {
            bail!("gemini.top_k must be at least 1");
        }
        if gemini.max_output_tokens == 0 {
            bail!("gemini.max_output_tokens must be at least 1");
        }
        if gemini.model.trim().is_empty() {
            bail!("gemini.model must not be empty");
        }
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            bail!(
                "server.bind_address is not a valid socket address: {}",
                self.server.bind_address
            );
        }

        Ok(())
    }
}
