//! CSRF token routes: `/api/csrf/`, `/api/get-csrf-token/`
//!
//! Both make sure the caller holds a token cookie and return the token in
//! the body. An existing well-formed cookie is kept, so repeated bootstrap
//! calls are idempotent.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use sitekit_core::csrf::CsrfToken;
use tracing::debug;

use crate::error::AppError;
use crate::middleware::cookie_token;
use crate::state::AppState;

/// Build the CSRF token router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/csrf/", get(issue_token))
        .route("/get-csrf-token/", get(issue_token))
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub csrftoken: String,
}

/// Ensure the token cookie is set and echo the token.
async fn issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let existing = cookie_token(&headers, &state.csrf.cookie_name)
        .and_then(|value| CsrfToken::parse(&value).ok());
    let reused = existing.is_some();
    let token = existing.unwrap_or_else(CsrfToken::generate);

    let cookie = HeaderValue::from_str(&state.csrf.set_cookie(&token))
        .map_err(|e| AppError::Internal(format!("invalid csrf cookie: {e}")))?;
    debug!(reused, "csrf cookie issued");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            csrftoken: token.to_string(),
        }),
    )
        .into_response())
}
