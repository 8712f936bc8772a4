//! `ping` handler, sent by GitHub when a webhook is created.

use serde_json::Value;

use crate::models::{EventResponse, ResponseDetails};

pub(super) fn pong(body: &Value) -> EventResponse {
    let zen = body["zen"].as_str().unwrap_or_default().to_string();
    let hook_id = body.get("hook_id").cloned().unwrap_or(Value::Null);
    let shown = match &hook_id {
        Value::Null => "unknown".to_string(),
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };

    EventResponse::new(
        format!("Pong! Webhook {shown} connected successfully."),
        ResponseDetails::Ping { zen, hook_id },
    )
}
