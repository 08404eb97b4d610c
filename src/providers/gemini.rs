// Google Gemini API provider implementation
//
// Uses the SSE flavour of streamGenerateContent: each `data:` line carries a
// GenerateContentResponse holding the next slice of text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::types::GenerationParams;
use super::TextGenerator;
use crate::config::constants::{DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS, GEMINI_BASE_URL};
use crate::config::GeminiConfig;

/// Google Gemini API provider
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Create a provider whose requests give up after `timeout`
    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Build from the `[gemini]` config section. `None` when no key is set.
    pub fn from_config(config: &GeminiConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let provider = Self::with_timeout(api_key, Duration::from_secs(config.request_timeout_secs))?
            .with_model(config.model.clone())
            .with_base_url(config.base_url.clone());
        Ok(Some(provider))
    }

    /// Create with custom model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different API host (used for proxies and tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn to_gemini_request(prompt: &str, params: &GenerationParams) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: Some(params.temperature),
                top_p: Some(params.top_p),
                top_k: Some(params.top_k),
                max_output_tokens: Some(params.max_output_tokens),
                response_mime_type: Some(params.response_mime_type.clone()),
            },
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        let (tx, rx) = mpsc::channel(100);

        let gemini_request = Self::to_gemini_request(prompt, params);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );

        tracing::debug!("Sending streaming request to Gemini API (model {})", self.model);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .context("Failed to send streaming request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini API streaming request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        // Spawn task to parse streaming response
        tokio::spawn(async move {
            tracing::debug!("[STREAM] Gemini streaming task started");
            let mut stream = response.bytes_stream();
            let mut buffer = Vec::new();
            let mut done = false;

            while !done {
                let Some(chunk) = stream.next().await else {
                    break;
                };

                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!("Stream error: {}", e);
                        let _ = tx
                            .send(Err(anyhow::Error::new(e).context("Gemini stream interrupted")))
                            .await;
                        return;
                    }
                };
                buffer.extend_from_slice(&bytes);

                // Parse line by line; a line may span several network chunks.
                while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    let line = String::from_utf8_lossy(&line_bytes);

                    match parse_sse_line(&line) {
                        Ok(SseEvent::Text { text, finished }) => {
                            if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                                done = true;
                                break;
                            }
                            if finished {
                                tracing::debug!("[STREAM] Stream completed");
                                done = true;
                                break;
                            }
                        }
                        Ok(SseEvent::Done) => {
                            tracing::debug!("[STREAM] Received [DONE]");
                            done = true;
                            break;
                        }
                        Ok(SseEvent::Ignored) => {}
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            // A final event without a trailing newline is still an event.
            if !done && !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                match parse_sse_line(&line) {
                    Ok(SseEvent::Text { text, .. }) if !text.is_empty() => {
                        let _ = tx.send(Ok(text)).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                    }
                }
            }

            tracing::debug!("[STREAM] Gemini streaming task finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// One decoded SSE line
#[derive(Debug, PartialEq)]
enum SseEvent {
    Text { text: String, finished: bool },
    Done,
    Ignored,
}

/// Decode one SSE line. Blank lines, comments and non-data fields are ignored;
/// an API error object inside the stream becomes an error.
fn parse_sse_line(line: &str) -> Result<SseEvent> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    let Some(json_str) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Ignored);
    };
    let json_str = json_str.trim();

    if json_str.is_empty() {
        return Ok(SseEvent::Ignored);
    }
    if json_str == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let chunk: GeminiStreamChunk =
        serde_json::from_str(json_str).context("Failed to parse Gemini stream chunk")?;

    if let Some(error) = chunk.error {
        anyhow::bail!(
            "Gemini API returned an error in stream: {} ({})",
            error.message,
            error.status.unwrap_or_default()
        );
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        anyhow::bail!("Gemini blocked the prompt: {}", reason);
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(SseEvent::Ignored);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if text.is_empty() && !matches!(reason, "STOP" | "MAX_TOKENS") {
            anyhow::bail!("Gemini stopped generation without text: {}", reason);
        }
    }

    Ok(SseEvent::Text {
        text,
        finished: candidate.finish_reason.is_some(),
    })
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiError {
    message: String,
    status: Option<String>,
}
