//! HTTP server for Rollcall.
//!
//! Provides HTTP endpoints for:
//! - Service info and health checks
//! - Transcript-completed webhooks

pub mod error;
pub mod routes;

use crate::config::ServerConfig;
use crate::webhook::EventHandler;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::{info, warn};

pub use routes::webhook::WebhookState;

pub struct ApiServer {
    host: String,
    port: u16,
    state: WebhookState,
}

impl ApiServer {
    pub fn new(handler: EventHandler, config: &ServerConfig) -> Self {
        if config.webhook_secret.is_empty() {
            warn!("No webhook secret configured; webhook calls are not authenticated");
        }

        Self {
            host: config.host.clone(),
            port: config.port,
            state: WebhookState {
                handler,
                secret: config.webhook_secret.as_str().into(),
            },
        }
    }

    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let app = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("API server listening on http://{}", addr);
        info!("Endpoints:");
        info!("  GET  /         - Service info");
        info!("  GET  /health   - Health check");
        info!("  POST /webhook  - Transcript completed notification");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// All routes, with state attached.
pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health))
        .merge(routes::webhook::router(state))
        .layer(ServiceBuilder::new())
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "rollcall",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
