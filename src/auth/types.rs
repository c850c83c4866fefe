//! Credential types

use crate::config::redact;
use crate::error::{Error, Result};
use std::fmt;

/// Name of the primary session cookie
pub const D_COOKIE: &str = "d";

/// Name of the secondary session cookie
pub const DS_COOKIE: &str = "d-s";

/// Token and session cookies for one workspace
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    d_cookie: String,
    ds_cookie: Option<String>,
}

impl Credentials {
    /// Create credentials from a token and the `d` cookie
    pub fn new(token: impl Into<String>, d_cookie: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            d_cookie: d_cookie.into(),
            ds_cookie: None,
        }
    }

    /// Add the `d-s` cookie
    #[must_use]
    pub fn with_ds_cookie(mut self, ds_cookie: impl Into<String>) -> Self {
        self.ds_cookie = Some(ds_cookie.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn d_cookie(&self) -> &str {
        &self.d_cookie
    }

    pub fn ds_cookie(&self) -> Option<&str> {
        self.ds_cookie.as_deref()
    }

    /// Cookie name/value pairs in the order they are sent
    pub fn cookies(&self) -> Vec<(&'static str, &str)> {
        let mut cookies = vec![(D_COOKIE, self.d_cookie.as_str())];
        if let Some(ds) = self.ds_cookie.as_deref() {
            cookies.push((DS_COOKIE, ds));
        }
        cookies
    }

    /// Value for a `Cookie` request header, e.g. `d=...; d-s=...`
    pub fn cookie_header(&self) -> String {
        self.cookies()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Reject credentials that cannot authenticate anything
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::missing_field("token"));
        }
        if self.d_cookie.trim().is_empty() {
            return Err(Error::missing_field("d_cookie"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &redact(&self.token))
            .field("d_cookie", &redact(&self.d_cookie))
            .field("ds_cookie", &self.ds_cookie.as_deref().map(redact))
            .finish()
    }
}
