//! CSRF cookie and header contract.
//!
//! The backend issues the token as a cookie in response to a bootstrap GET.
//! Clients copy the cookie value into a request header on every
//! state-changing request, and the backend rejects mismatches with a 403
//! whose JSON `detail` field is exactly [`REJECTION_DETAIL`].

use std::fmt;

use cookie::Cookie;
use subtle::ConstantTimeEq;

use crate::error::CsrfError;

/// Cookie the backend stores the token in.
pub const DEFAULT_COOKIE_NAME: &str = "csrftoken";

/// Header mutating requests carry the token in.
pub const DEFAULT_HEADER_NAME: &str = "X-CSRFToken";

/// Bootstrap endpoint, relative to the API base.
pub const BOOTSTRAP_PATH: &str = "/csrf/";

/// Endpoint returning the token in a JSON body, relative to the API base.
pub const TOKEN_PATH: &str = "/get-csrf-token/";

/// Status code of a CSRF rejection.
pub const REJECTION_STATUS: u16 = 403;

/// `detail` message of a CSRF rejection. Matched exactly.
pub const REJECTION_DETAIL: &str = "CSRF Failed: CSRF token missing or incorrect.";

/// Length in hex characters of a generated token.
pub const TOKEN_LEN: usize = 64;

/// Whether requests with this method change server-side state.
///
/// Only `POST`, `PUT`, `PATCH` and `DELETE` count. Comparison is
/// case-insensitive.
pub fn is_mutating(method: &str) -> bool {
    ["POST", "PUT", "PATCH", "DELETE"]
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

/// Whether a failed response is the CSRF rejection signature.
pub fn is_rejection(status: u16, detail: Option<&str>) -> bool {
    status == REJECTION_STATUS && detail == Some(REJECTION_DETAIL)
}

/// Extract a named cookie from a `Cookie` header value (`a=b; c=d`).
///
/// Malformed pairs are skipped. Empty values are treated as absent.
pub fn token_from_cookie_header(header: &str, cookie_name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == cookie_name)
        .map(|c| c.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// An opaque CSRF token.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a fresh token: 32 bytes of OS randomness, hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        // Two UUID v4s = 32 bytes from the OS CSPRNG.
        let mut bytes = Vec::with_capacity(32);
        bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        Self(hex::encode(bytes))
    }

    /// Validate a token received from a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CsrfError::Malformed`] unless the value is exactly
    /// [`TOKEN_LEN`] hex characters.
    pub fn parse(value: &str) -> Result<Self, CsrfError> {
        if value.len() != TOKEN_LEN {
            return Err(CsrfError::Malformed {
                reason: format!("expected {TOKEN_LEN} characters, got {}", value.len()),
            });
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CsrfError::Malformed {
                reason: "non-hex character".to_owned(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Borrow the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a presented value.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Never print the token value in logs.
impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CsrfToken").field(&"[redacted]").finish()
    }
}
