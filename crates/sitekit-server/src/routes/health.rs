//! Health check route: `/api/healthcheck/`

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the health check router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/healthcheck/", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "OK"
}
