// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # slack-cookie-cli
//!
//! A small client for a Slack workspace that authenticates the way the
//! browser does: a user token plus the `d` (and optionally `d-s`) session
//! cookies.
//!
//! ## Features
//!
//! - **Cursor pagination**: walk `conversations.list` and
//!   `conversations.history` to the last page, keeping partial results when
//!   a page fails
//! - **Session bootstrap**: explicit config, cookie jar, bearer token
//! - **Realtime events**: `rtm.connect` websocket with a typed event stream
//! - **Posting**: `chat.postMessage` and RTM typing indicators
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slack_cookie_cli::{ClientConfig, Session, CallContext, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::new("xoxc-...", "xoxd-...");
//!     let session = Session::new(&config)?;
//!     let ctx = CallContext::new();
//!
//!     let walk = session.client().list_conversations(&ctx, &[]).await;
//!     for name in &walk.items {
//!         println!("{name}");
//!     }
//!
//!     session.client().send_message(&ctx, "C012AB3CD", "Hello").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 Session  (ClientConfig → client)             │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──┬──────────────┬─────────────┐
//! │ SlackClient  │   Pagination     │     RTM      │   Output    │
//! ├──────────────┼──────────────────┼──────────────┼─────────────┤
//! │ conversations│ Cursor / Page    │ connection   │ JSON lines  │
//! │ history      │ Walker           │ Event enum   │             │
//! │ users / send │ Walk (partial)   │ consumer     │             │
//! └──────────────┴──────────────────┴──────────────┴─────────────┘
//!            SlackApi → WebApi → HttpClient (auth, cookie jar)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Wire data model
pub mod types;

/// Client configuration
pub mod config;

/// Session credentials and cookie jar
pub mod auth;

/// HTTP transport with per-call context
pub mod http;

/// Web API capability and implementation
pub mod api;

/// Cursor pagination walker
pub mod pagination;

/// JSON-lines output
pub mod output;

/// Realtime (RTM) connection
pub mod rtm;

/// Client operations
pub mod client;

/// Session bootstrap
pub mod session;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use api::{SlackApi, WebApi};
pub use client::SlackClient;
pub use config::ClientConfig;
pub use http::CallContext;
pub use pagination::{Continuation, Cursor, Page, PageFetcher, Walk, Walker};
pub use session::{Realtime, Session};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
