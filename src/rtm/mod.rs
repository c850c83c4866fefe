//! Realtime messaging module
//!
//! A websocket connection obtained through `rtm.connect`, a closed [`Event`]
//! enum for what arrives on it, and an [`EventConsumer`] that reacts to each
//! event.
//!
//! # Example
//!
//! ```ignore
//! let (connection, events) = RtmConnection::spawn(api, RtmConfig::default());
//! let consumer = EventConsumer::new(connection.handle(), ConsumerSettings::default());
//! let stats = consumer.spawn(events);
//! ```

mod connection;
mod consumer;
mod types;

pub use connection::{RtmConnection, RtmHandle};
pub use consumer::{ConsumerSettings, ConsumerStats, EventConsumer, Flow, Greeting};
pub use types::{DesktopNotification, Event, RtmConfig, RtmError};

#[cfg(test)]
mod tests;
