//! Event consumer
//!
//! Drains the event stream of a connection in arrival order and reacts to
//! each event. Reactions that write go through the [`RtmHandle`].

use super::connection::RtmHandle;
use super::types::Event;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

fn default_greeting_text() -> String {
    "Hello world".to_string()
}

/// Message posted once the connection is up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub channel: String,
    #[serde(default = "default_greeting_text")]
    pub text: String,
}

impl Greeting {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: default_greeting_text(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// What the consumer does beyond logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerSettings {
    pub greeting: Option<Greeting>,
    /// Channels that get a typing indicator on unrecognised events
    pub typing_channels: Vec<String>,
}

/// Summary returned when the consumer stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub events: usize,
    pub messages: usize,
    pub stopped_on_invalid_auth: bool,
}

/// Whether to keep draining after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct EventConsumer {
    handle: RtmHandle,
    settings: ConsumerSettings,
    stats: ConsumerStats,
}

impl EventConsumer {
    pub fn new(handle: RtmHandle, settings: ConsumerSettings) -> Self {
        Self {
            handle,
            settings,
            stats: ConsumerStats::default(),
        }
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// React to one event
    pub fn handle_event(&mut self, event: &Event) -> Flow {
        self.stats.events += 1;

        match event {
            Event::Connecting { attempt } => debug!("Connecting (attempt {attempt})"),
            Event::Hello => debug!("Hello received"),
            Event::Connected {
                info,
                connection_count,
            } => {
                info!(
                    "Connected to {} ({}) as {}, connection count {connection_count}",
                    info.team.name, info.team.id, info.user.name
                );
                if let Some(greeting) = &self.settings.greeting {
                    if let Err(e) = self.handle.send_message(&greeting.channel, &greeting.text) {
                        warn!("Could not queue greeting for {}: {e}", greeting.channel);
                    }
                }
            }
            Event::Message(message) => {
                self.stats.messages += 1;
                info!(
                    "Message in {}: {} ({})",
                    message.channel.as_deref().unwrap_or("?"),
                    message.text,
                    message.ts
                );
            }
            Event::PresenceChange { user, presence } => {
                info!("Presence change: {user} is {presence}");
            }
            Event::LatencyReport { latency } => info!("Current latency: {latency:?}"),
            Event::DesktopNotification(note) => {
                info!("Desktop notification: {} {}", note.title, note.content);
            }
            Event::Ack {
                reply_to,
                ok,
                error: failure,
                ..
            } => {
                if *ok {
                    debug!("Frame {reply_to} acknowledged");
                } else {
                    let reason = failure.as_ref().map(ToString::to_string).unwrap_or_default();
                    warn!("Frame {reply_to} rejected: {reason}");
                }
            }
            Event::Error(rtm_error) => error!("RTM error: {rtm_error}"),
            Event::ConnectionError { message } => error!("Connection error: {message}"),
            Event::InvalidAuth => {
                error!("Invalid credentials");
                self.stats.stopped_on_invalid_auth = true;
                return Flow::Stop;
            }
            Event::Disconnected { intentional } => {
                info!("Disconnected (intentional: {intentional})");
            }
            Event::Unknown {
                event_type,
                payload,
            } => {
                debug!("Unexpected event {event_type}: {payload}");
                for channel in &self.settings.typing_channels {
                    if let Err(e) = self.handle.send_typing(channel) {
                        warn!("Could not queue typing indicator for {channel}: {e}");
                    }
                }
            }
        }

        Flow::Continue
    }

    /// Drain `events` until the stream ends or an event says stop
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>) -> ConsumerStats {
        while let Some(event) = events.recv().await {
            if self.handle_event(&event) == Flow::Stop {
                break;
            }
        }
        debug!(
            "Event consumer finished after {} events",
            self.stats.events
        );
        self.stats
    }

    /// Run on its own task
    pub fn spawn(self, events: mpsc::Receiver<Event>) -> JoinHandle<ConsumerStats> {
        tokio::spawn(self.run(events))
    }
}
