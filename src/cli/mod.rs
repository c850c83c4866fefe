//! CLI module
//!
//! Command-line interface for the client.
//!
//! # Commands
//!
//! - `conversations` - List conversation names
//! - `history` - Dump a conversation's messages
//! - `users` - List workspace members
//! - `send` - Post a message
//! - `listen` - Follow the realtime event stream

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
