//! Error types for the `sitekit` client.

use sitekit_core::csrf;

/// All errors that can occur when sending requests through [`SiteClient`](crate::SiteClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("sitekit config error: {0}")]
    Config(String),

    /// A request URL could not be built.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The server answered with a non-2xx status.
    #[error("api error {status}: {}", .message.as_deref().unwrap_or("no detail"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// String `detail` field of the JSON error body, if any.
        detail: Option<String>,
        /// Human-readable error text: `detail`, else a string `message` field.
        message: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// Fetching a fresh CSRF token failed while recovering from a rejection.
    #[error("csrf bootstrap failed: {0}")]
    Bootstrap(#[source] Box<ClientError>),

    /// Request timed out.
    #[error("sitekit request timed out")]
    Timeout,

    /// Network or HTTP client error.
    #[error("sitekit network error: {0}")]
    Network(#[source] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("sitekit json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of an API error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the server's "CSRF token missing or incorrect" rejection.
    #[must_use]
    pub fn is_csrf_rejection(&self) -> bool {
        match self {
            Self::Api { status, detail, .. } => csrf::is_rejection(*status, detail.as_deref()),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}
