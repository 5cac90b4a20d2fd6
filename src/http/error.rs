//! Error types for server configuration and the HTTP handlers.
//!
//! [`AppError`] renders as `{ "error": CODE, "message": text }` with a
//! matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while loading [`ServerConfig`](super::ServerConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable was set to something unparsable.
    #[error("Invalid {key} value {value:?}: {reason}")]
    InvalidVar {
        /// Variable name.
        key: &'static str,
        /// Raw value as found.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The responder settings failed validation.
    #[error("Invalid responder configuration: {0}")]
    InvalidResponder(&'static str),
}

/// Errors returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// The requested shard is not tracked.
    #[error("Shard not found: {0}")]
    ShardNotFound(String),

    /// The shard manager is full and could not free a slot.
    #[error("Shard capacity exhausted")]
    CapacityExhausted,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AppError::ShardNotFound(_) => (StatusCode::NOT_FOUND, "SHARD_NOT_FOUND"),
            AppError::CapacityExhausted => (StatusCode::SERVICE_UNAVAILABLE, "CAPACITY_EXHAUSTED"),
        };

        (
            status,
            Json(json!({
                "error": code,
                "message": self.to_string()
            })),
        )
            .into_response()
    }
}
