//! HTTP error mapping
//!
//! Every failure leaves the service as `{"error": {"code", "message"}}`.
//! Duplicate reviews are reported as 400 with code `conflict`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use yamdb_common::api::types::ErrorResponse;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain or infrastructure error from yamdb-common
    #[error(transparent)]
    Common(#[from] yamdb_common::Error),

    /// Request body or query string could not be decoded (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        use yamdb_common::Error;

        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Common(err) => match err {
                Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                Error::Conflict(_) => (StatusCode::BAD_REQUEST, "conflict"),
                Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "not_authenticated"),
                Error::Forbidden(_) => (StatusCode::FORBIDDEN, "permission_denied"),
                Error::Database(_)
                | Error::Io(_)
                | Error::Config(_)
                | Error::Mail(_)
                | Error::Token(_)
                | Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse::new(code, self.to_string()));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
