//! Unified gateway error model and HTTP mapping.
//! Every failure along the authenticate -> invoke -> normalize path is translated
//! into one of these variants before it reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Ticket endpoint unreachable, non-2xx, or missing ticket fields.
    /// The reason is kept for logs only; clients see a generic message.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure (DNS, refused connection, timeout) on the target call.
    #[error("request error: {0}")]
    RemoteCall(String),

    /// Remote answered with a non-200 status.
    #[error("remote api error ({status}): {detail}")]
    RemoteApi { status: u16, detail: Value },

    /// 200 response whose body is not JSON.
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl GatewayError {
    pub fn validation<S: Into<String>>(msg: S) -> Self { GatewayError::Validation(msg.into()) }

    /// Map to HTTP status code. Remote statuses pass through unless they are
    /// outside the range axum can represent.
    pub fn http_status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::RemoteApi { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            GatewayError::Authentication(_)
            | GatewayError::RemoteCall(_)
            | GatewayError::ResponseFormat(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing `detail` value.
    pub fn detail(&self) -> Value {
        match self {
            GatewayError::Authentication(_) => json!("Authentication failed."),
            GatewayError::Validation(msg) => json!(msg),
            GatewayError::RemoteCall(msg) => json!(format!("Request error: {}", msg)),
            GatewayError::RemoteApi { detail, .. } => detail.clone(),
            GatewayError::ResponseFormat(raw) => json!(format!("Unexpected response format: {}", raw)),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.http_status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
