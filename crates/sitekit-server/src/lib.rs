//! `sitekit` development backend.
//!
//! Stands in for the production API during local development and in tests:
//! issues CSRF cookies, enforces them on mutating requests, and serves the
//! site's metadata and sitemap. [`app::build_app`] wraps [`routes::router`]
//! in tracing, CORS and security header layers; the binary in `main.rs`
//! adds logging and graceful shutdown.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
