// Transliteration pipeline
//
// request → load examples → build prompt → generate → log → output.
// Each call is independent; the only shared state is the activity log.

use anyhow::Result;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::Config;
use crate::data::{
    DataSourceKind, ExampleSource, GoogleSheetSource, SheetCredentials, TabularFileSource,
};
use crate::errors::TransliterationError;
use crate::logging::{ActivityLogger, LogEntry};
use crate::prompt::build_prompt;
use crate::providers::{GeminiProvider, GenerationParams, TextGenerator, TransliterationClient};

/// Wires sources, generator and logger together
pub struct Transliterator {
    sources: HashMap<DataSourceKind, Arc<dyn ExampleSource>>,
    default_source: DataSourceKind,
    client: Option<TransliterationClient>,
    logger: ActivityLogger,
    input_override: Option<PathBuf>,
}

impl Transliterator {
    /// Start with no sources and no generator
    pub fn new(logger: ActivityLogger) -> Self {
        Self {
            sources: HashMap::new(),
            default_source: DataSourceKind::default(),
            client: None,
            logger,
            input_override: None,
        }
    }

    /// Build the production pipeline from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let logger = ActivityLogger::new(
            config.logging.log_file.clone(),
            Some(config.logging.output_file.clone()),
        );

        let mut transliterator = Self::new(logger)
            .with_default_source(config.data.default_source)
            .with_source(Arc::new(TabularFileSource::new(config.data.csv_path.clone())));

        if let Some(sheet_id) = config.data.sheet_id() {
            let credentials = match &config.data.sheets_token {
                Some(token) => SheetCredentials::Bearer(token.clone()),
                None => SheetCredentials::ServiceAccount(config.data.credentials_path.clone()),
            };
            let sheet = GoogleSheetSource::new(sheet_id, credentials)?
                .with_base_url(config.data.sheets_base_url.clone());
            transliterator = transliterator.with_source(Arc::new(sheet));
        }

        if let Some(provider) = GeminiProvider::from_config(&config.gemini)? {
            transliterator = transliterator
                .with_generator(Arc::new(provider), GenerationParams::from(&config.gemini));
        }

        if let Some(path) = &config.logging.input_override_file {
            transliterator = transliterator.with_input_override(path.clone());
        }

        Ok(transliterator)
    }

    /// Register a source under its own selector, replacing any previous one
    pub fn with_source(mut self, source: Arc<dyn ExampleSource>) -> Self {
        self.sources.insert(source.kind(), source);
        self
    }

    pub fn with_default_source(mut self, kind: DataSourceKind) -> Self {
        self.default_source = kind;
        self
    }

    pub fn with_generator(
        mut self,
        generator: Arc<dyn TextGenerator>,
        params: GenerationParams,
    ) -> Self {
        self.client = Some(TransliterationClient::new(generator, params));
        self
    }

    /// Let the contents of `path` replace request input (debugging aid)
    pub fn with_input_override(mut self, path: PathBuf) -> Self {
        tracing::warn!(
            "Input override enabled: non-empty {} replaces request input",
            path.display()
        );
        self.input_override = Some(path);
        self
    }

    /// Whether a generator (and so an API key) is configured
    pub fn api_key_loaded(&self) -> bool {
        self.client.is_some()
    }

    pub fn logger(&self) -> &ActivityLogger {
        &self.logger
    }

    /// Recent activity log entries, read on the blocking pool
    pub async fn recent_logs(&self, limit: usize) -> Vec<LogEntry> {
        let logger = self.logger.clone();
        match tokio::task::spawn_blocking(move || logger.recent(limit)).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Log read task failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Append an activity record without blocking the runtime
    async fn record(&self, input: &str, kind: DataSourceKind, outcome: Result<&str, String>) {
        let logger = self.logger.clone();
        let input = input.to_string();
        let outcome = outcome.map(str::to_string);
        let task = tokio::task::spawn_blocking(move || match outcome {
            Ok(output) => logger.record_success(&input, kind.as_str(), &output),
            Err(error) => logger.record_failure(&input, kind.as_str(), &error),
        });
        if let Err(e) = task.await {
            tracing::warn!("Log write task failed: {}", e);
        }
    }

    /// Transliterate `input` using examples from `source` (or the default)
    pub async fn transliterate(
        &self,
        input: &str,
        source: Option<&str>,
    ) -> Result<String, TransliterationError> {
        if input.trim().is_empty() {
            return Err(TransliterationError::MissingInput);
        }

        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("transliterate", %request_id);
        self.run(input, source).instrument(span).await
    }

    async fn run(&self, input: &str, source: Option<&str>) -> Result<String, TransliterationError> {
        let client = self
            .client
            .as_ref()
            .ok_or(TransliterationError::MissingCredential)?;

        let kind = match source {
            Some(name) => name.parse::<DataSourceKind>()?,
            None => self.default_source,
        };
        let example_source = self.sources.get(&kind).ok_or_else(|| {
            TransliterationError::DataSourceUnreachable(format!(
                "data source '{}' is not configured",
                kind
            ))
        })?;

        let examples = match example_source.load().await {
            Ok(examples) => examples,
            Err(e) => {
                tracing::error!("Error loading data from {}: {}", example_source.describe(), e);
                self.record(input, kind, Err(e.to_string())).await;
                return Err(e);
            }
        };

        let input = self.effective_input(input).await;
        let prompt = build_prompt(&examples, &input);
        tracing::debug!("Built prompt with {} examples", examples.len());

        match client.transliterate(&prompt).await {
            Ok(output) => {
                self.record(&input, kind, Ok(output.as_str())).await;
                tracing::info!("Transliterated {} chars via {}", input.chars().count(), kind);
                Ok(output)
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.record(&input, kind, Err(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Request input, unless the override file is enabled and has content
    async fn effective_input(&self, input: &str) -> String {
        let Some(path) = &self.input_override else {
            return input.to_string();
        };

        match tokio::fs::read_to_string(path).await {
            Ok(contents) if !contents.trim().is_empty() => {
                tracing::warn!("Using input from {}", path.display());
                contents.trim().to_string()
            }
            Ok(_) => {
                tracing::debug!("{} is empty, using request input", path.display());
                input.to_string()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} not found, using request input", path.display());
                input.to_string()
            }
            Err(e) => {
                tracing::warn!("Error reading {}: {}", path.display(), e);
                input.to_string()
            }
        }
    }
}
