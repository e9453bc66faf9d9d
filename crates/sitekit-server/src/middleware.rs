//! CSRF enforcement middleware for the `sitekit` server.
//!
//! Safe methods pass through untouched. `POST`, `PUT`, `PATCH` and `DELETE`
//! must carry the CSRF cookie and echo the same value in the CSRF header;
//! anything else is rejected with the standard CSRF failure response.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sitekit_core::csrf::{self, CsrfToken};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that validates the CSRF cookie/header pair.
pub async fn csrf_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !csrf::is_mutating(req.method().as_str()) {
        return next.run(req).await;
    }

    let cookie = cookie_token(req.headers(), &state.csrf.cookie_name);
    let presented = req
        .headers()
        .get(&state.csrf.header_name)
        .and_then(|v| v.to_str().ok());

    let valid = match (&cookie, presented) {
        (Some(cookie), Some(presented)) => {
            CsrfToken::parse(cookie).is_ok_and(|token| token.matches(presented))
        }
        _ => false,
    };

    if valid {
        return next.run(req).await;
    }

    warn!(
        method = %req.method(),
        path = %req.uri().path(),
        cookie_present = cookie.is_some(),
        header_present = presented.is_some(),
        "csrf check failed"
    );
    AppError::CsrfFailed.into_response()
}

/// Value of the named cookie across all `Cookie` headers.
pub(crate) fn cookie_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| csrf::token_from_cookie_header(raw, name))
}
