//! Error types for `sitekit-core`.

/// Errors from CSRF token handling.
#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    /// The token does not have the expected shape.
    #[error("malformed csrf token: {reason}")]
    Malformed { reason: String },
}

/// Errors from site configuration and page lookup.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// The status code has no dedicated error page.
    #[error("no error page for status code {code}")]
    UnknownErrorPage { code: u16 },

    /// A page path must be absolute.
    #[error("page path '{path}' must start with '/'")]
    RelativePath { path: String },
}
