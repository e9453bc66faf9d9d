//! Request and response middleware chain.
//!
//! A [`SiteClient`] runs every outgoing request through its
//! [`RequestMiddleware`]s in order, sends it, and then folds the outcome
//! through its [`ResponseMiddleware`]s in order. Response middlewares may
//! replay the request through the whole chain via
//! [`ResponseContext::replay`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderName, HeaderValue};
use sitekit_core::csrf;
use tracing::{debug, info, warn};

use crate::SiteClient;
use crate::error::ClientError;
use crate::types::{ApiRequest, ApiResponse};

/// Result of one request as seen by response middlewares.
pub type Outcome = Result<ApiResponse, ClientError>;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which send of a request an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The caller's original send.
    First,
    /// A replay issued by a response middleware.
    Replay,
}

/// Transforms a request before it is sent.
pub trait RequestMiddleware: Send + Sync {
    /// Mutate the outgoing request in place.
    fn on_request(&self, request: &mut reqwest::Request);
}

/// Transforms the outcome of a request.
#[async_trait::async_trait]
pub trait ResponseMiddleware: Send + Sync {
    /// Inspect an outcome and return it, a replacement, or an error.
    async fn on_response(&self, cx: &ResponseContext<'_>, outcome: Outcome) -> Outcome;
}

/// What a response middleware knows about the request it is handling.
pub struct ResponseContext<'a> {
    client: &'a SiteClient,
    request: &'a ApiRequest,
    attempt: Attempt,
}

impl<'a> ResponseContext<'a> {
    pub(crate) fn new(client: &'a SiteClient, request: &'a ApiRequest, attempt: Attempt) -> Self {
        Self {
            client,
            request,
            attempt,
        }
    }

    /// The request as the caller described it.
    #[must_use]
    pub fn request(&self) -> &ApiRequest {
        self.request
    }

    /// Whether this is the original send or a replay.
    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// The client that sent the request.
    #[must_use]
    pub fn client(&self) -> &SiteClient {
        self.client
    }

    /// Send the request again through the full chain, marked as a replay.
    ///
    /// # Errors
    ///
    /// Returns the outcome of the replay.
    pub async fn replay(&self) -> Outcome {
        self.client.dispatch(self.request, Attempt::Replay).await
    }
}

/// Copies the CSRF cookie into the CSRF header.
///
/// The cookie is read from the jar for the request's own URL on every call,
/// so a refreshed token is picked up immediately. Without a cookie the
/// request goes out unchanged.
pub struct CsrfHeader {
    jar: Arc<Jar>,
    cookie_name: String,
    header_name: HeaderName,
}

impl CsrfHeader {
    /// Read `cookie_name` from `jar` and send it as `header_name`.
    #[must_use]
    pub fn new(jar: Arc<Jar>, cookie_name: String, header_name: HeaderName) -> Self {
        Self {
            jar,
            cookie_name,
            header_name,
        }
    }
}

impl RequestMiddleware for CsrfHeader {
    fn on_request(&self, request: &mut reqwest::Request) {
        let Some(token) = read_cookie(&self.jar, request.url(), &self.cookie_name) else {
            if csrf::is_mutating(request.method().as_str()) {
                debug!(
                    method = %request.method(),
                    url = %request.url(),
                    "no csrf cookie, sending without token"
                );
            }
            return;
        };

        match HeaderValue::from_str(&token) {
            Ok(value) => {
                request.headers_mut().insert(self.header_name.clone(), value);
            }
            Err(_) => warn!(cookie = %self.cookie_name, "csrf cookie is not a valid header value"),
        }
    }
}

/// Recovers once from a CSRF rejection.
///
/// On the first attempt of a request rejected with the exact CSRF failure
/// signature, issues one bootstrap call and replays the request once. A
/// rejected replay is returned to the caller as is. Any other outcome passes
/// through untouched.
pub struct CsrfRetry;

#[async_trait::async_trait]
impl ResponseMiddleware for CsrfRetry {
    async fn on_response(&self, cx: &ResponseContext<'_>, outcome: Outcome) -> Outcome {
        match outcome {
            Err(err) if err.is_csrf_rejection() => {
                let request = cx.request();
                if cx.attempt() == Attempt::Replay {
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        "csrf token rejected again after refresh"
                    );
                    return Err(err);
                }

                info!(
                    method = %request.method,
                    path = %request.path,
                    "csrf token rejected, refreshing and replaying once"
                );
                cx.client()
                    .bootstrap()
                    .await
                    .map_err(|e| ClientError::Bootstrap(Box::new(e)))?;
                cx.replay().await
            }
            other => other,
        }
    }
}

/// Read one cookie the jar would send to `url`.
pub(crate) fn read_cookie(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let header = header.to_str().ok()?;
    csrf::token_from_cookie_header(header, name)
}
