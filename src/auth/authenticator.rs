//! Authenticator implementation
//!
//! Applies the token to Web API requests and seeds the session cookies.

use super::types::Credentials;
use crate::error::{Error, Result};
use reqwest::cookie::Jar;
use reqwest::RequestBuilder;
use std::sync::Arc;
use tracing::debug;
use url::{Host, Url};

/// Authenticator handles applying session credentials to HTTP requests
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Credentials,
}

impl Authenticator {
    /// Create a new authenticator, rejecting incomplete credentials
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.validate()?;
        Ok(Self { credentials })
    }

    /// The credentials in use
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Apply the token to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(self.credentials.token())
    }

    /// Build a cookie jar holding the session cookies for `origin`
    pub fn cookie_jar(&self, origin: &str) -> Result<Arc<Jar>> {
        let url = Url::parse(origin)?;
        if url.host().is_none() {
            return Err(Error::auth(format!("cookie origin has no host: {origin}")));
        }

        let jar = Jar::default();
        for (name, value) in self.credentials.cookies() {
            jar.add_cookie_str(&cookie_string(name, value, &url), &url);
        }
        debug!(
            "Seeded {} session cookie(s) for {}",
            self.credentials.cookies().len(),
            url.host_str().unwrap_or_default()
        );

        Ok(Arc::new(jar))
    }

    /// Value for the websocket handshake `Cookie` header
    pub fn cookie_header(&self) -> String {
        self.credentials.cookie_header()
    }
}

/// Render a `Set-Cookie` style string scoped to the url's host
///
/// Domain names get a `Domain` attribute so the cookie also reaches
/// sub-domains; IP hosts get a host-only cookie.
pub fn cookie_string(name: &str, value: &str, url: &Url) -> String {
    match url.host() {
        Some(Host::Domain(domain)) => format!("{name}={value}; Path=/; Domain={domain}"),
        _ => format!("{name}={value}; Path=/"),
    }
}
