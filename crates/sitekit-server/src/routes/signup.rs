//! Sign-up list route: `/api/sign-up`
//!
//! Collects email addresses from the marketing site's sign-up form. The list
//! lives in memory for the lifetime of the process.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::{AppState, Signup};

/// Build the sign-up router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sign-up", post(sign_up))
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Signup>), AppError> {
    let email = normalize_email(&body.email)
        .ok_or_else(|| AppError::BadRequest("Enter a valid email address.".to_owned()))?;

    let mut signups = state.signups.write().await;
    if signups.iter().any(|s| s.email == email) {
        return Err(AppError::Conflict("This email is already signed up.".to_owned()));
    }

    let signup = Signup {
        email,
        created_at: Utc::now(),
    };
    signups.push(signup.clone());
    info!(total = signups.len(), "new sign-up");

    Ok((StatusCode::CREATED, Json(signup)))
}

/// Trim and lowercase; `None` unless it looks like `local@domain.tld`.
fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    valid.then_some(email)
}
