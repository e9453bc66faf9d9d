//! Server configuration for `sitekit`.
//!
//! Loads configuration from environment variables with development-friendly
//! defaults. All settings can be overridden via `SITEKIT_*` environment
//! variables.

use std::net::SocketAddr;

use sitekit_core::csrf;
use sitekit_core::site::{Page, SiteConfig, default_pages};

/// One year, the lifetime browsers keep the CSRF cookie for.
const DEFAULT_COOKIE_MAX_AGE_SECS: u64 = 31_449_600;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// CSRF cookie name.
    pub cookie_name: String,
    /// Header mutating requests must echo the cookie in.
    pub header_name: String,
    /// Mark the CSRF cookie `Secure` (HTTPS deployments).
    pub secure_cookies: bool,
    /// CSRF cookie `Max-Age` in seconds.
    pub cookie_max_age_secs: u64,
    /// Origin allowed to make credentialed cross-origin calls, if any.
    pub allowed_origin: Option<String>,
    /// Site constants served by `/api/site/`.
    pub site: SiteConfig,
    /// Navigation pages, used for metadata lookup and the sitemap.
    pub pages: Vec<Page>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            log_level: "info".to_owned(),
            cookie_name: csrf::DEFAULT_COOKIE_NAME.to_owned(),
            header_name: csrf::DEFAULT_HEADER_NAME.to_owned(),
            secure_cookies: false,
            cookie_max_age_secs: DEFAULT_COOKIE_MAX_AGE_SECS,
            allowed_origin: None,
            site: SiteConfig::default(),
            pages: default_pages(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on, binds to `0.0.0.0`
    /// - `SITEKIT_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8000`)
    /// - `SITEKIT_LOG_LEVEL`: log filter (default: `info`)
    /// - `SITEKIT_CSRF_COOKIE`: cookie name (default: `csrftoken`)
    /// - `SITEKIT_CSRF_HEADER`: header name (default: `X-CSRFToken`)
    /// - `SITEKIT_SECURE_COOKIES`: set `Secure` on the cookie (default: `false`)
    /// - `SITEKIT_ALLOWED_ORIGIN`: origin for credentialed CORS (default: none)
    /// - `SITEKIT_SITE_*`: see [`SiteConfig::from_env`]
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Priority: SITEKIT_BIND_ADDR > PORT > default 127.0.0.1:8000
        let bind_addr = if let Ok(addr) = std::env::var("SITEKIT_BIND_ADDR") {
            addr.parse().unwrap_or(defaults.bind_addr)
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(defaults.bind_addr.port());
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            defaults.bind_addr
        };

        let log_level = std::env::var("SITEKIT_LOG_LEVEL").unwrap_or(defaults.log_level);

        let cookie_name = std::env::var("SITEKIT_CSRF_COOKIE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.cookie_name);

        let header_name = std::env::var("SITEKIT_CSRF_HEADER")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.header_name);

        let secure_cookies = std::env::var("SITEKIT_SECURE_COOKIES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let allowed_origin = std::env::var("SITEKIT_ALLOWED_ORIGIN")
            .ok()
            .filter(|v| !v.is_empty());

        Self {
            bind_addr,
            log_level,
            cookie_name,
            header_name,
            secure_cookies,
            cookie_max_age_secs: defaults.cookie_max_age_secs,
            allowed_origin,
            site: SiteConfig::from_env(),
            pages: defaults.pages,
        }
    }
}
