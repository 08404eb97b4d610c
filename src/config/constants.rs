// Project-wide constants
//
// Centralised here so ports, file names and generation defaults have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default bind address for the HTTP service (localhost only, port 5000).
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:5000";

/// Environment variable carrying the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini REST base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Sheets REST base URL.
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// OAuth scope requested for spreadsheet reads.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_CSV_PATH: &str = "data/tamil_arwi.csv";
pub const DEFAULT_SHEET_ID: &str = "1CfwdVRxTf5HBErNRK9MIa6lPyzI_Zb_mBJ_nl4YsKxU";
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// File names placed under the system temp directory.
pub const LOG_FILE_NAME: &str = "output.log";
pub const OUTPUT_FILE_NAME: &str = "temp_output.txt";

/// Column headers (matched case-insensitively).
pub const SOURCE_COLUMN: &str = "tamil";
pub const TARGET_COLUMN: &str = "arwi";

/// Default number of entries returned by `GET /logs`.
pub const DEFAULT_LOG_LIMIT: usize = 100;
