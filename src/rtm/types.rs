//! Realtime event types and frame decoding

use crate::api::RtmConnectInfo;
use crate::error::Result;
use crate::types::{JsonValue, Message};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one realtime connection
#[derive(Debug, Clone)]
pub struct RtmConfig {
    /// Interval between keepalive pings
    pub ping_interval: Duration,
    /// Capacity of the inbound event channel
    pub event_buffer: usize,
    /// `Cookie` header sent with the websocket upgrade
    pub cookie_header: Option<String>,
}

impl Default for RtmConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            event_buffer: 100,
            cookie_header: None,
        }
    }
}

/// Error frame sent by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtmError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

impl std::fmt::Display for RtmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.msg, self.code)
    }
}

/// Desktop notification pushed to the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopNotification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Timestamp of the message that triggered it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Everything the realtime connection reports
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// About to call `rtm.connect`
    Connecting { attempt: u32 },
    /// Websocket is open
    Connected {
        info: RtmConnectInfo,
        connection_count: u32,
    },
    /// Server greeting, first frame after connect
    Hello,
    Message(Message),
    PresenceChange { user: String, presence: String },
    /// Round trip of one keepalive ping
    LatencyReport { latency: Duration },
    DesktopNotification(DesktopNotification),
    /// Reply to a frame we sent
    Ack {
        reply_to: u64,
        ok: bool,
        ts: Option<String>,
        error: Option<RtmError>,
    },
    /// Error frame from the server
    Error(RtmError),
    /// Transport failure; the connection is going away
    ConnectionError { message: String },
    /// Credentials were rejected during connect
    InvalidAuth,
    /// Connection ended; `intentional` when we asked for it
    Disconnected { intentional: bool },
    /// A frame type this client does not model
    Unknown {
        event_type: String,
        payload: JsonValue,
    },
}

impl Event {
    /// Short name for log lines
    pub fn name(&self) -> &str {
        match self {
            Event::Connecting { .. } => "connecting",
            Event::Connected { .. } => "connected",
            Event::Hello => "hello",
            Event::Message(_) => "message",
            Event::PresenceChange { .. } => "presence_change",
            Event::LatencyReport { .. } => "latency_report",
            Event::DesktopNotification(_) => "desktop_notification",
            Event::Ack { .. } => "ack",
            Event::Error(_) => "error",
            Event::ConnectionError { .. } => "connection_error",
            Event::InvalidAuth => "invalid_auth",
            Event::Disconnected { .. } => "disconnected",
            Event::Unknown { event_type, .. } => event_type,
        }
    }
}

// ============================================================================
// Wire frames
// ============================================================================

/// A decoded inbound text frame
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Frame {
    /// Reply to one of our pings; consumed by the connection task
    Pong { reply_to: u64 },
    Event(Event),
}

#[derive(Deserialize)]
struct PresenceFrame {
    #[serde(default)]
    user: String,
    #[serde(default)]
    presence: String,
}

#[derive(Deserialize)]
struct AckFrame {
    reply_to: u64,
    #[serde(default = "default_ok")]
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<RtmError>,
}

fn default_ok() -> bool {
    true
}

/// Decode one inbound text frame by its `type` field
pub(crate) fn decode_frame(text: &str) -> Result<Frame> {
    let value: JsonValue = serde_json::from_str(text)?;

    let Some(kind) = value.get("type").and_then(JsonValue::as_str) else {
        if value.get("reply_to").is_some() {
            let ack: AckFrame = serde_json::from_value(value)?;
            return Ok(Frame::Event(Event::Ack {
                reply_to: ack.reply_to,
                ok: ack.ok,
                ts: ack.ts,
                error: ack.error,
            }));
        }
        return Ok(Frame::Event(Event::Unknown {
            event_type: String::new(),
            payload: value,
        }));
    };

    let event = match kind {
        "pong" => {
            let reply_to = value
                .get("reply_to")
                .and_then(JsonValue::as_u64)
                .unwrap_or_default();
            return Ok(Frame::Pong { reply_to });
        }
        "hello" => Event::Hello,
        "message" => Event::Message(serde_json::from_value(value)?),
        "presence_change" => {
            let presence: PresenceFrame = serde_json::from_value(value)?;
            Event::PresenceChange {
                user: presence.user,
                presence: presence.presence,
            }
        }
        "desktop_notification" => Event::DesktopNotification(serde_json::from_value(value)?),
        "error" => {
            let error = value
                .get("error")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_default();
            Event::Error(error)
        }
        other => Event::Unknown {
            event_type: other.to_string(),
            payload: value,
        },
    };

    Ok(Frame::Event(event))
}

/// A frame we send; `id` is echoed back as `reply_to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Outgoing {
    Message {
        id: u64,
        channel: String,
        text: String,
    },
    Typing {
        id: u64,
        channel: String,
    },
    Ping {
        id: u64,
        time: i64,
    },
}

impl Outgoing {
    pub(crate) fn id(&self) -> u64 {
        match self {
            Outgoing::Message { id, .. } | Outgoing::Typing { id, .. } | Outgoing::Ping { id, .. } => {
                *id
            }
        }
    }
}
