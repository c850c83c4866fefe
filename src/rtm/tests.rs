//! Tests for the realtime module

use super::connection::PingTracker;
use super::types::{decode_frame, Frame, Outgoing};
use super::*;
use crate::api::{ConversationsParams, HistoryParams, RtmConnectInfo, SlackApi, TeamInfo};
use crate::error::{Error, Result};
use crate::http::CallContext;
use crate::pagination::{Cursor, Page};
use crate::types::{Conversation, Message, PostedMessage, User};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn event(frame: serde_json::Value) -> Event {
    match decode_frame(&frame.to_string()).unwrap() {
        Frame::Event(event) => event,
        Frame::Pong { .. } => panic!("expected an event, got a pong"),
    }
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_decode_known_types() {
    assert_eq!(event(json!({"type": "hello"})), Event::Hello);

    match event(json!({
        "type": "message",
        "channel": "C1",
        "user": "U1",
        "text": "hi",
        "ts": "1700000000.000100"
    })) {
        Event::Message(message) => {
            assert_eq!(message.channel.as_deref(), Some("C1"));
            assert_eq!(message.text, "hi");
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(
        event(json!({"type": "presence_change", "user": "U1", "presence": "away"})),
        Event::PresenceChange {
            user: "U1".to_string(),
            presence: "away".to_string()
        }
    );

    match event(json!({"type": "desktop_notification", "title": "Acme", "content": "ping"})) {
        Event::DesktopNotification(note) => assert_eq!(note.content, "ping"),
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(
        event(json!({"type": "error", "error": {"code": 2, "msg": "message text is missing"}})),
        Event::Error(RtmError {
            code: 2,
            msg: "message text is missing".to_string()
        })
    );
}

#[test]
fn test_decode_unknown_type() {
    let frame = json!({"type": "user_typing", "channel": "C1", "user": "U2"});
    assert_eq!(
        event(frame.clone()),
        Event::Unknown {
            event_type: "user_typing".to_string(),
            payload: frame
        }
    );
}

#[test]
fn test_decode_ack_and_pong() {
    assert_eq!(
        event(json!({"ok": true, "reply_to": 4, "ts": "1.2", "text": "hi"})),
        Event::Ack {
            reply_to: 4,
            ok: true,
            ts: Some("1.2".to_string()),
            error: None
        }
    );

    assert_eq!(
        decode_frame(r#"{"type":"pong","reply_to":9}"#).unwrap(),
        Frame::Pong { reply_to: 9 }
    );
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(decode_frame("not json").is_err());
}

#[test]
fn test_outgoing_wire_format() {
    let frame = Outgoing::Typing {
        id: 3,
        channel: "D02EF7FSVB6".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&frame).unwrap(),
        json!({"type": "typing", "id": 3, "channel": "D02EF7FSVB6"})
    );
    assert_eq!(frame.id(), 3);
}

// ============================================================================
// Handle
// ============================================================================

#[test]
fn test_handle_ids_increase() {
    let (handle, mut rx) = RtmHandle::detached();

    let first = handle.send_message("C1", "one").unwrap();
    let second = handle.send_typing("C1").unwrap();
    assert!(second > first);

    assert_eq!(
        rx.try_recv().unwrap(),
        Outgoing::Message {
            id: first,
            channel: "C1".to_string(),
            text: "one".to_string()
        }
    );
    assert_eq!(rx.try_recv().unwrap().id(), second);
}

#[test]
fn test_handle_after_receiver_dropped() {
    let (handle, rx) = RtmHandle::detached();
    drop(rx);

    assert!(matches!(
        handle.send_message("C1", "x"),
        Err(Error::ChannelClosed)
    ));
}

// ============================================================================
// Ping tracking
// ============================================================================

#[test]
fn test_ping_tracker_measures_answered_pings() {
    let mut pings = PingTracker::new(Duration::from_secs(30));
    let start = tokio::time::Instant::now();
    pings.sent(1, start);

    let latency = pings.answered(1, start + Duration::from_millis(120));
    assert_eq!(latency, Some(Duration::from_millis(120)));
    assert_eq!(pings.answered(1, start + Duration::from_secs(1)), None);
    assert_eq!(pings.answered(99, start), None);
}

#[test]
fn test_ping_tracker_forgets_unanswered_pings() {
    let interval = Duration::from_secs(30);
    let mut pings = PingTracker::new(interval);
    let start = tokio::time::Instant::now();

    for id in 0..100u64 {
        pings.sent(id, start + interval * id as u32);
    }
    assert!(pings.outstanding() <= 3);

    // the oldest pings are gone, the newest is still tracked
    assert_eq!(pings.answered(0, start + interval * 100), None);
    assert!(pings.answered(99, start + interval * 100).is_some());
}

// ============================================================================
// Consumer
// ============================================================================

fn connected() -> Event {
    Event::Connected {
        info: RtmConnectInfo {
            url: "wss://example/link".to_string(),
            team: TeamInfo {
                id: "T1".to_string(),
                name: "Acme".to_string(),
                domain: "acme".to_string(),
            },
            ..Default::default()
        },
        connection_count: 1,
    }
}

#[test]
fn test_consumer_sends_greeting_on_connected() {
    let (handle, mut rx) = RtmHandle::detached();
    let settings = ConsumerSettings {
        greeting: Some(Greeting::new("C2147483705")),
        typing_channels: Vec::new(),
    };
    let mut consumer = EventConsumer::new(handle, settings);

    assert_eq!(consumer.handle_event(&Event::Hello), Flow::Continue);
    assert!(rx.try_recv().is_err());

    assert_eq!(consumer.handle_event(&connected()), Flow::Continue);
    match rx.try_recv().unwrap() {
        Outgoing::Message { channel, text, .. } => {
            assert_eq!(channel, "C2147483705");
            assert_eq!(text, "Hello world");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_consumer_types_on_unknown_events() {
    let (handle, mut rx) = RtmHandle::detached();
    let settings = ConsumerSettings {
        greeting: None,
        typing_channels: vec!["D02EF7FSVB6".to_string(), "C03K5EJRYLU".to_string()],
    };
    let mut consumer = EventConsumer::new(handle, settings);

    consumer.handle_event(&Event::Unknown {
        event_type: "reaction_added".to_string(),
        payload: json!({}),
    });

    let channels: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|frame| match frame {
            Outgoing::Typing { channel, .. } => channel,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(channels, vec!["D02EF7FSVB6", "C03K5EJRYLU"]);
}

#[tokio::test]
async fn test_consumer_stops_on_invalid_auth() {
    let (handle, _rx) = RtmHandle::detached();
    let consumer = EventConsumer::new(handle, ConsumerSettings::default());
    let (tx, events) = mpsc::channel(8);

    tx.send(Event::Connecting { attempt: 1 }).await.unwrap();
    tx.send(Event::InvalidAuth).await.unwrap();
    tx.send(Event::Message(Message::default())).await.unwrap();
    drop(tx);

    let stats = consumer.run(events).await;

    assert_eq!(
        stats,
        ConsumerStats {
            events: 2,
            messages: 0,
            stopped_on_invalid_auth: true
        }
    );
}

#[tokio::test]
async fn test_consumer_drains_until_stream_ends() {
    let (handle, _rx) = RtmHandle::detached();
    let consumer = EventConsumer::new(handle, ConsumerSettings::default());
    let (tx, events) = mpsc::channel(8);

    let task = consumer.spawn(events);
    tx.send(Event::Hello).await.unwrap();
    tx.send(Event::Message(Message::default())).await.unwrap();
    tx.send(Event::LatencyReport {
        latency: Duration::from_millis(12),
    })
    .await
    .unwrap();
    drop(tx);

    let stats = task.await.unwrap();
    assert_eq!(stats.events, 3);
    assert_eq!(stats.messages, 1);
    assert!(!stats.stopped_on_invalid_auth);
}

// ============================================================================
// Connection without a socket
// ============================================================================

/// Answers `rtm.connect` with a fixed result; everything else is unused
struct ConnectOnly {
    result: fn() -> Result<RtmConnectInfo>,
}

#[async_trait]
impl SlackApi for ConnectOnly {
    async fn conversations(
        &self,
        _ctx: &CallContext,
        _params: &ConversationsParams,
        _cursor: &Cursor,
    ) -> Result<Page<Conversation>> {
        Err(Error::Other("unused".to_string()))
    }

    async fn history(
        &self,
        _ctx: &CallContext,
        _params: &HistoryParams,
        _cursor: &Cursor,
    ) -> Result<Page<Message>> {
        Err(Error::Other("unused".to_string()))
    }

    async fn users(&self, _ctx: &CallContext) -> Result<Vec<User>> {
        Err(Error::Other("unused".to_string()))
    }

    async fn post_message(
        &self,
        _ctx: &CallContext,
        _channel: &str,
        _text: &str,
    ) -> Result<PostedMessage> {
        Err(Error::Other("unused".to_string()))
    }

    async fn rtm_connect(&self, _ctx: &CallContext) -> Result<RtmConnectInfo> {
        (self.result)()
    }
}

async fn collect(mut events: mpsc::Receiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn test_connection_invalid_auth() {
    let api = Arc::new(ConnectOnly {
        result: || Err(Error::api("rtm.connect", "invalid_auth")),
    });

    let (connection, events) = RtmConnection::spawn(api, RtmConfig::default());
    let seen = collect(events).await;
    connection.join().await.unwrap();

    assert_eq!(
        seen,
        vec![Event::Connecting { attempt: 1 }, Event::InvalidAuth]
    );
}

#[tokio::test]
async fn test_connection_other_failure() {
    let api = Arc::new(ConnectOnly {
        result: || Err(Error::http_status(500, "down")),
    });

    let (connection, events) = RtmConnection::spawn(api, RtmConfig::default());
    let seen = collect(events).await;
    connection.join().await.unwrap();

    assert_eq!(seen.len(), 3);
    assert!(matches!(seen[1], Event::ConnectionError { .. }));
    assert_eq!(seen[2], Event::Disconnected { intentional: false });
}

#[tokio::test]
async fn test_connection_unreachable_socket() {
    let api = Arc::new(ConnectOnly {
        result: || {
            Ok(RtmConnectInfo {
                url: "ws://127.0.0.1:1/link".to_string(),
                ..Default::default()
            })
        },
    });

    let (connection, events) = RtmConnection::spawn(api, RtmConfig::default());
    let seen = collect(events).await;
    connection.join().await.unwrap();

    assert_eq!(seen.first(), Some(&Event::Connecting { attempt: 1 }));
    assert_eq!(seen.last(), Some(&Event::Disconnected { intentional: false }));
    assert!(seen
        .iter()
        .any(|e| matches!(e, Event::ConnectionError { .. })));
}
