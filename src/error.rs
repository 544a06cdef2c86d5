//! Error types for the order service
//!
//! Provides unified error handling using thiserror: storage outcomes for the
//! order store and HTTP-facing errors for the read API.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Outcome of a failed order store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Identifier is empty or longer than the allowed bound
    #[error("bad order_uid")]
    BadIdentifier,

    /// Valid identifier, no such order
    #[error("order not found")]
    NotFound,

    /// Required child row missing, or a negative amount reached the store
    #[error("inconsistent data: {0}")]
    Inconsistent(String),

    /// Storage or transport fault; `context` names the failing step
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: StorageCause,
    },
}

impl StoreError {
    /// Wraps a storage fault with the step it happened in.
    pub fn storage(context: impl Into<String>, source: impl Into<StorageCause>) -> Self {
        Self::Storage {
            context: context.into(),
            source: source.into(),
        }
    }
}

// == Storage Cause ==
/// Underlying cause of a [`StoreError::Storage`].
#[derive(Error, Debug)]
pub enum StorageCause {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Fault raised by a non-database backend
    #[error("{0}")]
    Fault(String),
}

// == Api Error Enum ==
/// Errors returned by the HTTP read path.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request (bad identifier, wrong path)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Order does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Route exists but not for this method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Anything else; the cause is logged, never returned
    #[error("Internal error")]
    Internal,
}

impl ApiError {
    /// Status code and machine-readable code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    /// Builds the JSON error response, tagging it with the request id.
    pub fn into_response_with(self, request_id: Option<String>) -> Response {
        let (status, code) = self.status();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::Internal => "internal error".to_string(),
        };

        (status, Json(ErrorResponse::new(code, message, request_id))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BadIdentifier => ApiError::BadRequest("bad order_uid".to_string()),
            StoreError::NotFound => ApiError::NotFound("order not found".to_string()),
            StoreError::Inconsistent(_) | StoreError::Storage { .. } => ApiError::Internal,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}

// == Result Type Alias ==
/// Convenience Result type for order store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
