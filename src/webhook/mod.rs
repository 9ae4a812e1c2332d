//! Inbound webhook events.
//!
//! Payloads are loosely shaped: a health-check ping, or a notification that
//! carries the transcript identifier at the top level or one level down under
//! `data`, in snake or camel case.

use serde_json::Value;

mod auth;
mod handler;

pub use auth::{verify_secret, WebhookError, SECRET_HEADER};
pub use handler::{EventHandler, EventOutcome};

const ID_FIELDS: [&str; 2] = ["transcript_id", "transcriptId"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Ping,
    Transcript(String),
    /// No transcript identifier found; acknowledged and dropped.
    Unidentified,
}

pub fn parse_event(payload: &Value) -> WebhookEvent {
    if payload.get("type").and_then(Value::as_str) == Some("ping") {
        return WebhookEvent::Ping;
    }

    let nested = payload.get("data");
    let id = find_id(payload).or_else(|| nested.and_then(find_id));

    match id {
        Some(id) => WebhookEvent::Transcript(id),
        None => WebhookEvent::Unidentified,
    }
}

fn find_id(object: &Value) -> Option<String> {
    ID_FIELDS.iter().find_map(|field| match object.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
