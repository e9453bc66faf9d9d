//! Site-wide constants.
//!
//! Loaded once from `SITEKIT_SITE_*` environment variables. Anything left
//! unset falls back to placeholder copy that each project fills in.

use serde::Serialize;

use crate::error::SiteError;

const PLACEHOLDER: &str = "TODO";
const DEFAULT_BASE_DOMAIN: &str = "http://localhost:3000";

/// Name, tagline, description and domain of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteConfig {
    /// Display name, title-cased.
    pub name: String,
    /// Short tagline shown next to the name.
    pub tagline: String,
    /// One-paragraph description for search engines and social cards.
    pub description: String,
    /// Base domain, with or without scheme.
    pub base_domain: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER.to_owned(),
            tagline: PLACEHOLDER.to_owned(),
            description: PLACEHOLDER.to_owned(),
            base_domain: DEFAULT_BASE_DOMAIN.to_owned(),
        }
    }
}

impl SiteConfig {
    /// Load from the process environment.
    ///
    /// Environment variables:
    /// - `SITEKIT_SITE_NAME`: display name (title-cased on load)
    /// - `SITEKIT_SITE_TAGLINE`
    /// - `SITEKIT_SITE_DESCRIPTION`
    /// - `SITEKIT_SITE_BASE_DOMAIN`: default `http://localhost:3000`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        Self {
            name: title_case(&get("SITEKIT_SITE_NAME", PLACEHOLDER)),
            tagline: get("SITEKIT_SITE_TAGLINE", PLACEHOLDER),
            description: get("SITEKIT_SITE_DESCRIPTION", PLACEHOLDER),
            base_domain: get("SITEKIT_SITE_BASE_DOMAIN", DEFAULT_BASE_DOMAIN),
        }
    }

    /// Absolute base URL without a trailing slash.
    ///
    /// A domain given without a scheme is assumed to be served over HTTPS.
    #[must_use]
    pub fn base_url(&self) -> String {
        let trimmed = self.base_domain.trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        }
    }

    /// Bare host name, e.g. `example.com` for `https://www.example.com/`.
    #[must_use]
    pub fn host(&self) -> &str {
        let domain = self.base_domain.trim_end_matches('/');
        let domain = domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"))
            .unwrap_or(domain);
        domain.strip_prefix("www.").unwrap_or(domain)
    }

    /// Absolute URL of a page path.
    #[must_use]
    pub fn url_for(&self, relative_path: &str) -> String {
        if relative_path == "/" {
            self.base_url()
        } else {
            format!("{}{relative_path}", self.base_url())
        }
    }
}

/// An entry in the site's navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Link text.
    pub name: String,
    /// Absolute path on this site, or a full URL when `external`.
    pub relative_path: String,
    /// Shown in the signed-in app navigation rather than the marketing one.
    pub app_page: bool,
    /// Optional icon class.
    pub icon: Option<String>,
    /// Points off-site; excluded from the sitemap.
    pub external: bool,
}

impl Page {
    /// An internal marketing page.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::RelativePath`] if `relative_path` does not start
    /// with `/`.
    pub fn new(name: &str, relative_path: &str) -> Result<Self, SiteError> {
        if !relative_path.starts_with('/') {
            return Err(SiteError::RelativePath {
                path: relative_path.to_owned(),
            });
        }
        Ok(Self {
            name: name.to_owned(),
            relative_path: relative_path.to_owned(),
            app_page: false,
            icon: None,
            external: false,
        })
    }

    /// A link to another site.
    #[must_use]
    pub fn external(name: &str, url: &str) -> Self {
        Self {
            name: name.to_owned(),
            relative_path: url.to_owned(),
            app_page: false,
            icon: None,
            external: true,
        }
    }
}

/// Pages every fresh site starts with.
#[must_use]
pub fn default_pages() -> Vec<Page> {
    vec![Page {
        name: "Home".to_owned(),
        relative_path: "/".to_owned(),
        app_page: false,
        icon: None,
        external: false,
    }]
}

/// Upper-case the first character of every word.
///
/// A word starts at any ASCII alphanumeric or `_` character not preceded
/// by one, so letters next to non-ASCII characters start a new word.
/// Other characters are left untouched.
#[must_use]
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        let word_char = c.is_ascii_alphanumeric() || c == '_';
        if word_char && !in_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        in_word = word_char;
    }
    out
}
