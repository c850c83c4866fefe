//! Authentication module
//!
//! Session credentials are a user token plus the browser session cookies
//! `d` and (optionally) `d-s`. The `Authenticator` turns them into a
//! bearer header for Web API calls, a cookie jar for the HTTP client and a
//! `Cookie` header for the realtime websocket handshake.

mod authenticator;
mod types;

pub use authenticator::{cookie_string, Authenticator};
pub use types::{Credentials, D_COOKIE, DS_COOKIE};
