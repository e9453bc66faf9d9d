//! Full HTTP stack: the routes wrapped in tracing, security header and
//! CORS layers.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Wrap the routes in tracing, CORS and response header layers.
///
/// # Errors
///
/// Returns an error if `allowed_origin` is not a valid header value.
pub fn build_app(config: &ServerConfig, state: Arc<AppState>) -> anyhow::Result<Router> {
    let csrf_header = state.csrf.header_name.clone();

    let mut app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Credentialed CORS for a frontend served from another origin, so the
    // browser sends and accepts the CSRF cookie.
    if let Some(ref origin) = config.allowed_origin {
        let origin = HeaderValue::from_str(origin)
            .with_context(|| format!("invalid SITEKIT_ALLOWED_ORIGIN '{origin}'"))?;
        info!(origin = ?origin, "credentialed CORS enabled");
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, csrf_header]),
        );
    }

    Ok(app)
}
