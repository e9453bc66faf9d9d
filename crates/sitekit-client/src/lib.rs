//! CSRF-aware HTTP client for `sitekit` backends.
//!
//! A [`SiteClient`] owns a cookie jar and an explicit middleware chain. The
//! default chain copies the CSRF cookie into a request header before every
//! send, and recovers once from a "CSRF token missing or incorrect"
//! rejection by fetching a fresh token and replaying the request.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitekit_client::{ClientConfig, SiteClient};
//!
//! # async fn example() -> Result<(), sitekit_client::ClientError> {
//! let client = SiteClient::new(ClientConfig {
//!     api_url: "http://127.0.0.1:8000/api".to_owned(),
//!     ..Default::default()
//! })?;
//! client.initialize().await;
//! let created = client
//!     .post("/sign-up", serde_json::json!({ "email": "ada@example.com" }))
//!     .await?;
//! println!("{}", created.status);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod middleware;
mod types;

pub use error::ClientError;
pub use middleware::{
    Attempt, CsrfHeader, CsrfRetry, Outcome, RequestMiddleware, ResponseContext,
    ResponseMiddleware,
};
pub use types::{ApiRequest, ApiResponse};

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::cookie::Jar;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("sitekit-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for the `sitekit` client.
///
/// Empty fields are filled from `SITEKIT_*` environment variables, then
/// from built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// API base URL. Env: `SITEKIT_API_URL`. Default: `http://127.0.0.1:8000/api`.
    pub api_url: String,
    /// CSRF cookie name. Env: `SITEKIT_CSRF_COOKIE`. Default: `csrftoken`.
    pub cookie_name: String,
    /// CSRF request header. Env: `SITEKIT_CSRF_HEADER`. Default: `X-CSRFToken`.
    pub header_name: String,
    /// Bootstrap endpoint relative to `api_url`. Default: `/csrf/`.
    pub bootstrap_path: String,
    /// JSON token endpoint relative to `api_url`. Default: `/get-csrf-token/`.
    pub token_path: String,
    /// Request timeout. Env: `SITEKIT_TIMEOUT_SECS`. Default: 10 seconds.
    pub timeout: Duration,
}

/// `sitekit` HTTP client.
///
/// Cheap to clone; clones share the cookie jar, connection pool and
/// middleware chain.
#[derive(Clone)]
pub struct SiteClient {
    inner: Arc<Inner>,
}

struct Inner {
    api_url: String,
    bootstrap_url: Url,
    token_url: Url,
    cookie_url: Url,
    cookie_name: String,
    http: reqwest::Client,
    jar: Arc<Jar>,
    request_chain: Vec<Arc<dyn RequestMiddleware>>,
    response_chain: Vec<Arc<dyn ResponseMiddleware>>,
}

impl std::fmt::Debug for SiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteClient")
            .field("api_url", &self.inner.api_url)
            .field("request_middlewares", &self.inner.request_chain.len())
            .field("response_middlewares", &self.inner.response_chain.len())
            .finish_non_exhaustive()
    }
}

/// Composes a [`SiteClient`] and its middleware chain.
///
/// The CSRF middlewares run first unless [`without_csrf`](Self::without_csrf)
/// is called; added middlewares run after them in insertion order.
pub struct ClientBuilder {
    config: ClientConfig,
    csrf: bool,
    request_chain: Vec<Arc<dyn RequestMiddleware>>,
    response_chain: Vec<Arc<dyn ResponseMiddleware>>,
}
