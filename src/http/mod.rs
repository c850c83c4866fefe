//! HTTP client module
//!
//! Provides the HTTP transport underneath the Web API.
//!
//! # Features
//!
//! - **Session Auth**: bearer token plus a seeded cookie jar
//! - **Per-call Context**: every call takes a [`CallContext`] carrying an
//!   optional timeout and a cancellation token
//! - **Error Classification**: 429 becomes `RateLimited`, other failures
//!   become `HttpStatus`; nothing is retried

mod client;
mod context;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use context::CallContext;

#[cfg(test)]
mod tests;
