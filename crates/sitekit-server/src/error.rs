//! HTTP error types for the `sitekit` server.
//!
//! Every error produces a JSON body with the numeric `status_code` and a
//! human-readable `detail`, the shape the frontend's error handling expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sitekit_core::csrf;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// The CSRF cookie/header pair is missing or does not match.
    CsrfFailed,
    /// Client sent invalid input.
    BadRequest(String),
    /// Requested resource not found.
    NotFound(String),
    /// The resource already exists.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    status_code: u16,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::CsrfFailed => (StatusCode::FORBIDDEN, csrf::REJECTION_DETAIL.to_owned()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            detail,
        };

        (status, axum::Json(body)).into_response()
    }
}
