//! Request and response types for the `sitekit` client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Description of an HTTP call, kept around so it can be replayed.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base (`/items/`), or an absolute URL.
    pub path: String,
    /// Extra headers.
    pub headers: HeaderMap,
    /// JSON body.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// A request with no body or extra headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Whether the request changes server-side state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        sitekit_core::csrf::is_mutating(self.method.as_str())
    }
}

/// A fully buffered 2xx response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(ClientError::Json)
    }

    /// Body as (lossy) UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// --- Internal API response types ---

/// String fields of a JSON error body.
///
/// DRF-style backends send `detail`, others `message`. Each field is read
/// on its own, so an unexpected shape in one never hides the other.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ApiErrorBody {
    pub detail: Option<String>,
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub(crate) fn parse(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return Self::default();
        };
        let field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        };
        Self {
            detail: field("detail"),
            message: field("message"),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub csrftoken: String,
}
