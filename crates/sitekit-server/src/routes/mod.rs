//! HTTP route modules for the `sitekit` server.
//!
//! Everything under `/api` goes through the CSRF middleware; the sitemap is
//! served from the root.

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::get;

use crate::error::AppError;
use crate::middleware::csrf_middleware;
use crate::state::AppState;

pub mod csrf;
pub mod health;
pub mod signup;
pub mod site;

/// Build the application router with all routes and the CSRF layer.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(csrf::router())
        .merge(health::router())
        .merge(signup::router())
        .merge(site::router())
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            csrf_middleware,
        ));

    Router::new()
        .nest("/api", api)
        .route("/sitemap.xml", get(site::sitemap_xml))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found.".to_owned())
}
