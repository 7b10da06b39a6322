/**
 * Edge Error Types
 *
 * Errors raised by the edge. Upstream failures during normal request
 * handling never surface here: they are answered with an offline fallback.
 * What is left is storage trouble, install failures, and requests the edge
 * cannot read.
 *
 * # Response Format
 *
 * ```json
 * { "error": "Error message", "status": 500 }
 * ```
 */
use crate::shared::config::ConfigError;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("asset cache error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Precache failed; nothing from this install attempt was stored
    #[error("failed to precache {path}: {reason}")]
    Install { path: String, reason: String },

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EdgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EdgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EdgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!("Edge error ({}): {}", status, self);

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            Body::from(body.to_string()),
        )
            .into_response()
    }
}
