//! Error types for the cache and its server
//!
//! Provides the cache error taxonomy and the HTTP error mapping using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Config Error ==
/// Construction-time misconfiguration. The only fatal error class.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity bound of zero
    #[error("maxsize must be at least 1")]
    ZeroCapacity,

    /// Codec cannot perform one of its two operations
    #[error("codec is missing its `{0}` operation")]
    MissingCodecOperation(&'static str),

    /// Timers and write-through need a Tokio runtime to spawn onto
    #[error("no Tokio runtime available; build the cache from within a runtime")]
    NoRuntime,
}

// == Codec Error ==
/// Serialization failure. Recovered locally by the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialize failed: {0}")]
    Serialize(String),

    #[error("deserialize failed: {0}")]
    Deserialize(String),

    #[error("codec has no `{0}` operation")]
    MissingOperation(&'static str),
}

// == Remote Error ==
/// Remote store failure. Logged by the cache, never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Remote link is down
    #[error("remote store is inactive")]
    Inactive,

    /// Store could not be reached
    #[error("remote transport failure: {0}")]
    Transport(String),

    /// Store refused the request
    #[error("remote store rejected request: {0}")]
    Rejected(String),
}

// == Api Error ==
/// Error type for the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not present locally or remotely
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Stored value could not be resolved
    #[error("Value unavailable: {0}")]
    Unresolved(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unresolved(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP layer.
pub type Result<T> = std::result::Result<T, ApiError>;
