// Domain errors for the transliteration pipeline
//
// Internal plumbing uses anyhow; everything that can reach an HTTP caller is
// classified here so the endpoint can pick a status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransliterationError {
    #[error("Tamil input is required.")]
    MissingInput,

    #[error("Unsupported data source: {0}")]
    UnsupportedSource(String),

    #[error("API key not found. Please set GEMINI_API_KEY environment variable.")]
    MissingCredential,

    #[error("Failed to load data: {0}")]
    DataSourceUnreachable(String),

    #[error("Failed to load data: missing required columns {missing:?} (found {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Failed to load data: {0} contains no examples")]
    EmptyDataset(String),

    #[error("Error during Gemini API call: {0}")]
    ExternalApiFailure(String),
}

impl TransliterationError {
    /// HTTP status for this failure class
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingInput | Self::UnsupportedSource(_) => StatusCode::BAD_REQUEST,
            Self::MissingCredential
            | Self::DataSourceUnreachable(_)
            | Self::MissingColumns { .. }
            | Self::EmptyDataset(_)
            | Self::ExternalApiFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap an anyhow chain as an unreachable-source error, keeping every cause
    pub fn unreachable(err: anyhow::Error) -> Self {
        Self::DataSourceUnreachable(format!("{:#}", err))
    }

    /// Wrap an anyhow chain as an external API failure, keeping every cause
    pub fn external(err: anyhow::Error) -> Self {
        Self::ExternalApiFailure(format!("{:#}", err))
    }
}

impl IntoResponse for TransliterationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
