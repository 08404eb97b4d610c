// Integration tests for the HTTP endpoints
//
// The router is driven with tower::ServiceExt::oneshot() against a pipeline
// built from a temp CSV and a ScriptedGenerator, so no network is needed.

use arwi::config::ServerConfig;
use arwi::data::TabularFileSource;
use arwi::data::DataSourceKind;
use arwi::logging::ActivityLogger;
use arwi::providers::{GenerationParams, ScriptedGenerator};
use arwi::server::TransliterationServer;
use arwi::Transliterator;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt; // provides .oneshot()

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    dir: tempfile::TempDir,
    generator: Arc<ScriptedGenerator>,
    router: Router,
}

impl Fixture {
    fn log_path(&self) -> PathBuf {
        self.dir.path().join("logs").join("output.log")
    }

    fn output_path(&self) -> PathBuf {
        self.dir.path().join("temp_output.txt")
    }

    fn log_lines(&self) -> Vec<Value> {
        read_log(&self.log_path())
    }
}

fn read_log(path: &Path) -> Vec<Value> {
    if !path.exists() {
        return Vec::new();
    }
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect()
}

/// Pipeline with a one-row CSV (the default source) and a scripted generator
fn fixture(generator: ScriptedGenerator) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("tamil_arwi.csv");
    std::fs::write(&csv_path, "tamil,arwi\nவணக்கம்,وَنَكَّمْ\n").unwrap();
    fixture_with_csv(dir, csv_path, generator)
}

fn fixture_with_csv(
    dir: tempfile::TempDir,
    csv_path: PathBuf,
    generator: ScriptedGenerator,
) -> Fixture {
    let generator = Arc::new(generator);
    let logger = ActivityLogger::new(
        dir.path().join("logs").join("output.log"),
        Some(dir.path().join("temp_output.txt")),
    );
    let transliterator = Transliterator::new(logger)
        .with_default_source(DataSourceKind::Csv)
        .with_source(Arc::new(TabularFileSource::new(csv_path)))
        .with_generator(generator.clone(), GenerationParams::default());

    let router = TransliterationServer::new(ServerConfig::default(), transliterator).router();
    Fixture {
        dir,
        generator,
        router,
    }
}

async fn post_json(router: &Router, body: Value) -> axum::response::Response {
    let req = Request::builder()
        .method("POST")
        .uri("/transliterate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request");
    router.clone().oneshot(req).await.expect("oneshot failed")
}

async fn get(router: &Router, path: &str) -> axum::response::Response {
    let req = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request");
    router.clone().oneshot(req).await.expect("oneshot failed")
}

/// Read an Axum response body as a parsed serde_json::Value.
async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("response body is not valid JSON")
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_key_loaded() {
    let fx = fixture(ScriptedGenerator::new(["x"]));
    let resp = get(&fx.router, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "status": "OK", "api_key_loaded": true })
    );
}

#[tokio::test]
async fn test_health_without_generator() {
    let dir = tempfile::tempdir().unwrap();
    let transliterator = Transliterator::new(ActivityLogger::new(dir.path().join("o.log"), None));
    let router = TransliterationServer::new(ServerConfig::default(), transliterator).router();

    let json = body_json(get(&router, "/").await).await;
    assert_eq!(json["api_key_loaded"], false);

    // First use surfaces the missing key as a server error.
    let resp = post_json(&router, json!({ "tamil_input": "வணக்கம்" })).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
}

// ---------------------------------------------------------------------------
// POST /transliterate
// ---------------------------------------------------------------------------

/// The worked example: one CSV row, stub returns the Arwi text.
#[tokio::test]
async fn test_end_to_end_example() {
    let fx = fixture(ScriptedGenerator::new(["وَنَكَّمْ"]));

    let resp = post_json(&fx.router, json!({ "tamil_input": "வணக்கம்" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "output": "وَنَكَّمْ" }));

    let lines = fx.log_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], true);
    assert_eq!(lines[0]["tamil_input"], "வணக்கம்");
    assert_eq!(lines[0]["data_source"], "csv");
    assert_eq!(lines[0]["arwi_output"], "وَنَكَّمْ");

    let latest = std::fs::read_to_string(fx.output_path()).unwrap();
    assert_eq!(latest, "وَنَكَّمْ");
}

#[tokio::test]
async fn test_each_success_appends_exactly_one_line() {
    let fx = fixture(ScriptedGenerator::new(["وَنَ\n", "كَّمْ\n"]));

    for expected_lines in 1..=3 {
        let resp = post_json(&fx.router, json!({ "tamil_input": "வணக்கம்" })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fx.log_lines().len(), expected_lines);
    }

    let latest = std::fs::read_to_string(fx.output_path()).unwrap();
    assert_eq!(latest, "وَنَكَّمْ");
    assert!(!latest.contains('\n'));
}

#[tokio::test]
async fn test_empty_input_is_client_error_without_side_effects() {
    let fx = fixture(ScriptedGenerator::new(["x"]));

    for body in [
        json!({}),
        json!({ "tamil_input": "" }),
        json!({ "tamil_input": "  " }),
        json!({ "tamil_input": null, "data_source": "csv" }),
    ] {
        let resp = post_json(&fx.router, body.clone()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Tamil input is required." })
        );
    }

    assert_eq!(fx.generator.calls(), 0);
    assert!(fx.log_lines().is_empty());
}

#[tokio::test]
async fn test_unknown_source_is_client_error() {
    let fx = fixture(ScriptedGenerator::new(["x"]));
    let resp = post_json(
        &fx.router,
        json!({ "tamil_input": "வணக்கம்", "data_source": "excel" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("excel"));
    assert_eq!(fx.generator.calls(), 0);
}

#[tokio::test]
async fn test_loader_failure_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.csv");
    let fx = fixture_with_csv(dir, missing, ScriptedGenerator::new(["x"]));

    let resp = post_json(&fx.router, json!({ "tamil_input": "வணக்கம்" })).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(resp).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("Failed to load data"), "got: {error}");
    assert!(error.contains("does_not_exist.csv"), "got: {error}");

    assert_eq!(fx.generator.calls(), 0);
    assert!(fx.log_lines().iter().all(|l| l["success"] == false));
    assert!(!fx.output_path().exists());
}

#[tokio::test]
async fn test_missing_columns_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("bad.csv");
    std::fs::write(&csv_path, "tamil,english\nவணக்கம்,hello\n").unwrap();
    let fx = fixture_with_csv(dir, csv_path, ScriptedGenerator::new(["x"]));

    let resp = post_json(&fx.router, json!({ "tamil_input": "வணக்கம்" })).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("arwi"));
    assert_eq!(fx.generator.calls(), 0);
}

#[tokio::test]
async fn test_api_failure_is_server_error() {
    let fx = fixture(ScriptedGenerator::failing("429 Too Many Requests"));

    let resp = post_json(&fx.router, json!({ "tamil_input": "வணக்கம்" })).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(resp).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Error during Gemini API call"), "got: {error}");
    assert!(error.contains("429"), "got: {error}");

    let lines = fx.log_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], false);
    assert!(!fx.output_path().exists());
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let fx = fixture(ScriptedGenerator::new(["x"]));
    let req = Request::builder()
        .method("POST")
        .uri("/transliterate")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = fx.router.clone().oneshot(req).await.unwrap();

    assert!(resp.status().is_client_error());
    assert!(body_json(resp).await.get("error").is_some());
    assert_eq!(fx.generator.calls(), 0);
}

// ---------------------------------------------------------------------------
// GET /logs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_logs_endpoint_returns_recent_entries() {
    let fx = fixture(ScriptedGenerator::new(["وَنَكَّمْ"]));
    for _ in 0..3 {
        post_json(&fx.router, json!({ "tamil_input": "வணக்கம்" })).await;
    }

    let json = body_json(get(&fx.router, "/logs?limit=2").await).await;
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["arwi_output"], "وَنَكَّمْ");

    let json = body_json(get(&fx.router, "/logs").await).await;
    assert_eq!(json["entries"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_logs_bad_limit_is_json_error() {
    let fx = fixture(ScriptedGenerator::new(["x"]));
    let resp = get(&fx.router, "/logs?limit=abc").await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("query string"), "got: {json}");
}
