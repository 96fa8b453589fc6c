//! Shared response normalization for every relayed call.

use serde_json::Value;
use tracing::{error, warn};

use crate::error::{GatewayError, GatewayResult};

/// Translate a raw (status, body) pair into the parsed success body or a typed error.
///
/// - 200: body must be JSON, otherwise `ResponseFormat`.
/// - anything else: `RemoteApi` with the body's `errors` field, or the raw text
///   when the body is not JSON or carries no `errors`.
pub fn normalize(status: u16, text: &str) -> GatewayResult<Value> {
    if status == 200 {
        return serde_json::from_str::<Value>(text).map_err(|e| {
            error!(target: "proxmox", "200 response is not valid JSON: {}", e);
            GatewayError::ResponseFormat(text.to_string())
        });
    }
    let detail = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut map)) => match map.remove("errors") {
            Some(errors) if !errors.is_null() => errors,
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    };
    warn!(target: "proxmox", status, %detail, "remote api error");
    Err(GatewayError::RemoteApi { status, detail })
}
