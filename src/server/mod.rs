// HTTP service
// Health check and transliteration endpoint over axum

mod handlers;

pub use handlers::{
    create_router, handle_logs, handle_transliterate, health_check, AppState, HealthResponse,
    LogsResponse, TransliterateRequest, TransliterateResponse,
};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::pipeline::Transliterator;

/// Request bodies are short Tamil strings; anything larger is rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The HTTP server and its pipeline
pub struct TransliterationServer {
    config: ServerConfig,
    transliterator: Arc<Transliterator>,
}

impl TransliterationServer {
    pub fn new(config: ServerConfig, transliterator: Transliterator) -> Self {
        Self {
            config,
            transliterator: Arc::new(transliterator),
        }
    }

    /// Router with body limit, tracing and (optionally) CORS layers
    pub fn router(&self) -> axum::Router {
        let app = create_router(Arc::clone(&self.transliterator))
            .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http());

        if self.config.cors_enabled {
            app.layer(CorsLayer::permissive())
        } else {
            app
        }
    }

    /// Start the HTTP server
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.bind_address))?;

        let app = self.router();

        tracing::info!("Starting arwi transliteration server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    pub fn transliterator(&self) -> &Arc<Transliterator> {
        &self.transliterator
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
