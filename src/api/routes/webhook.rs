//! Webhook endpoint for transcript-completed notifications.

use crate::api::error::{ApiError, ApiResult};
use crate::webhook::{parse_event, verify_secret, EventHandler, EventOutcome, WebhookEvent};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for the webhook route.
#[derive(Clone)]
pub struct WebhookState {
    pub handler: EventHandler,
    pub secret: Arc<str>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(receive))
        .with_state(state)
}

/// POST /webhook - Record attendance for a completed transcript.
async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    if let Err(e) = verify_secret(&headers, &state.secret) {
        warn!("Rejected webhook call: {}", e);
        return Err(e.into());
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Malformed webhook payload: {}", e)))?;

    let transcript_id = match parse_event(&payload) {
        WebhookEvent::Ping => {
            info!("Webhook ping received");
            return Ok(Json(json!({ "ok": true, "pong": true })));
        }
        WebhookEvent::Unidentified => {
            info!("Webhook without transcript id, ignoring");
            return Ok(Json(json!({ "ok": true, "ignored": "no transcript id" })));
        }
        WebhookEvent::Transcript(id) => id,
    };

    match state.handler.handle(&transcript_id).await {
        Ok(EventOutcome::NotReady) => Ok(Json(json!({
            "ok": true,
            "status": "not_ready",
            "transcript_id": transcript_id,
        }))),
        Ok(EventOutcome::Recorded { rows }) => Ok(Json(json!({
            "ok": true,
            "status": "recorded",
            "transcript_id": transcript_id,
            "rows": rows,
        }))),
        Err(e) => {
            error!("Failed to record transcript {}: {:#}", transcript_id, e);
            Err(e.into())
        }
    }
}
