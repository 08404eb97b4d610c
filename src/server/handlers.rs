// HTTP handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::config::constants::DEFAULT_LOG_LIMIT;
use crate::logging::LogEntry;
use crate::pipeline::Transliterator;

/// Shared handler state
pub type AppState = Arc<Transliterator>;

/// Body of `POST /transliterate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransliterateRequest {
    #[serde(default)]
    pub tamil_input: Option<String>,
    /// "csv" or "google_sheet"; the configured default when absent
    #[serde(default)]
    pub data_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransliterateResponse {
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_key_loaded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub entries: Vec<LogEntry>,
}

/// Build the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/transliterate", post(handle_transliterate))
        .route("/logs", get(handle_logs))
        .with_state(state)
}

/// `GET /` liveness check
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        api_key_loaded: state.api_key_loaded(),
    })
}

/// `POST /transliterate`
pub async fn handle_transliterate(
    State(state): State<AppState>,
    payload: Result<Json<TransliterateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    let input = request.tamil_input.unwrap_or_default();
    match state
        .transliterate(&input, request.data_source.as_deref())
        .await
    {
        Ok(output) => (StatusCode::OK, Json(TransliterateResponse { output })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /logs?limit=N` recent activity, oldest first
pub async fn handle_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!("Rejected query string: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Json(LogsResponse {
        entries: state.recent_logs(limit).await,
    })
    .into_response()
}
