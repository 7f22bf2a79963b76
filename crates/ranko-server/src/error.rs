//! Server error type with HTTP status code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ranko_core::{RankError, ShardError};
use serde::Serialize;
use thiserror::Error;

/// Errors a request handler can produce. Wraps the core domain errors
/// and adds the server-layer rejections.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain error from the ranking engine.
    #[error("{0}")]
    Rank(#[from] RankError),

    /// Request arrived without a usable identity header.
    #[error("missing x-user-id header")]
    Unauthorized,

    /// Request body failed validation before reaching the engine.
    #[error("{0}")]
    BadRequest(String),

    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Engine(#[from] ShardError),

    /// A shard replied with a shape the handler did not expect.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Rank(RankError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Rank(RankError::DuplicateMembership) => StatusCode::CONFLICT,
            ApiError::Rank(RankError::InvalidPosition { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rank(RankError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"error":{"message":...,"status":...}}`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: String,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                message: self.to_string(),
                status: status.as_u16(),
            },
        };
        (status, Json(body)).into_response()
    }
}
