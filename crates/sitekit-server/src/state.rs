//! Shared application state for the `sitekit` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use axum::http::HeaderName;
use chrono::{DateTime, Utc};
use cookie::{Cookie, SameSite};
use serde::Serialize;
use sitekit_core::csrf::CsrfToken;
use sitekit_core::site::{Page, SiteConfig};
use tokio::sync::RwLock;

use crate::config::ServerConfig;

/// How CSRF cookies are issued and checked.
#[derive(Debug, Clone)]
pub struct CsrfSettings {
    /// Cookie carrying the token.
    pub cookie_name: String,
    /// Header mutating requests must echo the token in.
    pub header_name: HeaderName,
    /// Whether the cookie is marked `Secure`.
    pub secure: bool,
    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,
}

impl CsrfSettings {
    /// `Set-Cookie` value for `token`.
    ///
    /// Not `HttpOnly`: browser code has to read the cookie to copy it into
    /// the header.
    #[must_use]
    pub fn set_cookie(&self, token: &CsrfToken) -> String {
        let max_age = i64::try_from(self.max_age_secs).unwrap_or(i64::MAX);
        Cookie::build((self.cookie_name.clone(), token.as_str().to_owned()))
            .path("/")
            .max_age(cookie::time::Duration::seconds(max_age))
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .http_only(false)
            .build()
            .to_string()
    }
}

/// One address on the sign-up list.
#[derive(Debug, Clone, Serialize)]
pub struct Signup {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Shared application state passed to all HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// CSRF cookie and header settings.
    pub csrf: CsrfSettings,
    /// Site constants.
    pub site: SiteConfig,
    /// Navigation pages.
    pub pages: Vec<Page>,
    /// Sign-ups received since startup.
    pub signups: RwLock<Vec<Signup>>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured CSRF header is not a valid header name.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let header_name = HeaderName::from_bytes(config.header_name.as_bytes()).map_err(|e| {
            anyhow::anyhow!("invalid csrf header name '{}': {e}", config.header_name)
        })?;

        Ok(Self {
            csrf: CsrfSettings {
                cookie_name: config.cookie_name.clone(),
                header_name,
                secure: config.secure_cookies,
                max_age_secs: config.cookie_max_age_secs,
            },
            site: config.site.clone(),
            pages: config.pages.clone(),
            signups: RwLock::new(Vec::new()),
        })
    }
}
