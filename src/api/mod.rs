//! HTTP API server for the AgriBot gateway

pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::channels::WhatsAppChannel;
use crate::config::Config;
use crate::db::{DbPool, MediaRepo, MessageLogRepo};
use crate::ingest::MediaIngestor;
use crate::storage::ObjectStore;
use crate::Result;

/// Shared state for API handlers
pub struct ApiState {
    pub db: DbPool,
    /// Webhook handshake verification token
    pub verify_token: String,
    pub whatsapp: WhatsAppChannel,
    pub message_repo: MessageLogRepo,
    /// Media ingestion pipeline; `None` when object storage is not configured
    pub ingestor: Option<MediaIngestor>,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Build the server from configuration and an initialized database pool
    #[must_use]
    pub fn new(config: &Config, db: DbPool, port: u16) -> Self {
        let whatsapp = WhatsAppChannel::new(&config.whatsapp);

        let ingestor = config.storage.as_ref().map(|storage| {
            MediaIngestor::new(
                whatsapp.clone(),
                ObjectStore::new(storage),
                MediaRepo::new(db.clone()),
            )
        });

        let state = Arc::new(ApiState {
            verify_token: config.whatsapp.verify_token.clone(),
            message_repo: MessageLogRepo::new(db.clone()),
            db,
            whatsapp,
            ingestor,
        });

        Self { state, port }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        Router::new()
            .merge(webhooks::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
