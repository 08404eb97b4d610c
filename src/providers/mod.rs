// Text generation providers
//
// The transliteration pipeline only needs "prompt in, text chunks out".
// Gemini is the real backend; ScriptedGenerator replays fixed output so the
// whole pipeline runs without network access.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;

pub mod gemini;
pub mod scripted;
pub mod types;

pub use gemini::GeminiProvider;
pub use scripted::ScriptedGenerator;
pub use types::GenerationParams;

use crate::errors::TransliterationError;

/// Trait for generative text backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and stream the generated text.
    ///
    /// Returns a channel of text chunks in arrival order. The channel closes
    /// when generation finishes; a mid-stream failure arrives as an `Err` item.
    async fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Receiver<Result<String>>>;

    /// Provider name (e.g., "gemini")
    fn name(&self) -> &str;

    /// Model used for generation
    fn model(&self) -> &str;
}

/// Drives one generation and turns it into a single line of output
#[derive(Clone)]
pub struct TransliterationClient {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
}

impl TransliterationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, params: GenerationParams) -> Self {
        Self { generator, params }
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Generate, concatenate every chunk, and strip line breaks.
    /// No retries: the first failure is returned.
    pub async fn transliterate(&self, prompt: &str) -> Result<String, TransliterationError> {
        tracing::debug!(
            provider = self.generator.name(),
            model = self.generator.model(),
            prompt_chars = prompt.chars().count(),
            "Starting generation"
        );

        let rx = self
            .generator
            .generate_stream(prompt, &self.params)
            .await
            .map_err(TransliterationError::external)?;

        let text = collect_stream(rx)
            .await
            .map_err(TransliterationError::external)?;

        let output = strip_line_breaks(&text);
        if output.trim().is_empty() {
            return Err(TransliterationError::ExternalApiFailure(format!(
                "{} returned no text",
                self.generator.name()
            )));
        }
        Ok(output)
    }
}

/// Concatenate chunks in arrival order, stopping at the first error
pub async fn collect_stream(mut rx: Receiver<Result<String>>) -> Result<String> {
    let mut output = String::new();
    while let Some(chunk) = rx.recv().await {
        output.push_str(&chunk?);
    }
    Ok(output)
}

/// Remove internal line breaks so the output is a single line
pub fn strip_line_breaks(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}
