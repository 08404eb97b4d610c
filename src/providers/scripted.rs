// Scripted generator: replays canned chunks instead of calling a model

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::types::GenerationParams;
use super::TextGenerator;

/// Returns the same chunks for every prompt, optionally failing.
///
/// Records each prompt it receives so tests can inspect what was sent.
pub struct ScriptedGenerator {
    chunks: Vec<String>,
    open_error: Option<String>,
    stream_error: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            open_error: None,
            stream_error: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail before any chunk is produced (like a rejected request)
    pub fn failing(message: impl Into<String>) -> Self {
        let mut generator = Self::new(Vec::<String>::new());
        generator.open_error = Some(message.into());
        generator
    }

    /// Fail after the scripted chunks (like a dropped connection)
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }

    /// Number of generation requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_stream(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if let Some(message) = &self.open_error {
            return Err(anyhow!("{}", message));
        }

        // Sized so every item fits without a receiver draining it.
        let (tx, rx) = mpsc::channel(self.chunks.len() + 1);
        for chunk in &self.chunks {
            let _ = tx.send(Ok(chunk.clone())).await;
        }
        if let Some(message) = &self.stream_error {
            let _ = tx.send(Err(anyhow!("{}", message))).await;
        }

        Ok(rx)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
