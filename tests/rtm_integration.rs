//! Realtime integration tests
//!
//! A local websocket server stands in for the RTM endpoint; `rtm.connect`
//! itself is served by wiremock and points at it.

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use slack_cookie_cli::rtm::{Event, Greeting, RtmConnection};
use slack_cookie_cli::{ClientConfig, Session};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

struct FakeRtm {
    url: String,
    cookie: oneshot::Receiver<Option<String>>,
    frames: mpsc::UnboundedReceiver<Value>,
}

async fn start_fake_rtm() -> FakeRtm {
    start_fake_rtm_with(false).await
}

/// Accept one websocket client, greet it, then record what it sends.
/// With `answer_pings` every ping gets its pong.
async fn start_fake_rtm_with(answer_pings: bool) -> FakeRtm {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/link", listener.local_addr().unwrap());
    let (cookie_tx, cookie_rx) = oneshot::channel();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let cookie = req
                    .headers()
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string);
                let _ = cookie_tx.send(cookie);
                Ok(resp)
            },
        )
        .await
        .unwrap();

        ws.send(WsMessage::Text(json!({"type": "hello"}).to_string()))
            .await
            .unwrap();
        ws.send(WsMessage::Text(
            json!({
                "type": "message",
                "channel": "C1",
                "user": "U2",
                "text": "hi there",
                "ts": "1700000000.000100"
            })
            .to_string(),
        ))
        .await
        .unwrap();

        while let Some(Ok(frame)) = ws.next().await {
            match frame {
                WsMessage::Text(text) => {
                    let value: Value = serde_json::from_str(&text).unwrap();
                    if answer_pings && value["type"] == "ping" {
                        let pong = json!({"type": "pong", "reply_to": value["id"]});
                        if ws.send(WsMessage::Text(pong.to_string())).await.is_err() {
                            break;
                        }
                    }
                    let _ = frame_tx.send(value);
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
    });

    FakeRtm {
        url,
        cookie: cookie_rx,
        frames: frame_rx,
    }
}

async fn mount_rtm_connect(server: &MockServer, ws_url: &str) {
    Mock::given(method("POST"))
        .and(path("/api/rtm.connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "url": ws_url,
            "self": {"id": "U1", "name": "alice"},
            "team": {"id": "T1", "name": "Acme", "domain": "acme"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new("xoxc-rtm", "xoxd-rtm")
        .with_ds_cookie("ds-rtm")
        .with_api_url(format!("{}/api/", server.uri()))
}

async fn next_event(events: &mut mpsc::Receiver<Event>) -> Option<Event> {
    timeout(WAIT, events.recv()).await.expect("event timed out")
}

#[tokio::test]
async fn test_events_arrive_in_order() {
    let fake = start_fake_rtm().await;
    let server = MockServer::start().await;
    mount_rtm_connect(&server, &fake.url).await;

    let config = config_for(&server);
    let session = Session::new(&config).unwrap();
    let (connection, mut events) =
        RtmConnection::spawn(Arc::clone(session.api()), config.rtm_config());

    assert_eq!(
        next_event(&mut events).await,
        Some(Event::Connecting { attempt: 1 })
    );
    match next_event(&mut events).await {
        Some(Event::Connected {
            info,
            connection_count,
        }) => {
            assert_eq!(info.url, fake.url);
            assert_eq!(info.team.domain, "acme");
            assert_eq!(connection_count, 1);
        }
        other => panic!("expected Connected, got {other:?}"),
    }
    assert_eq!(next_event(&mut events).await, Some(Event::Hello));
    match next_event(&mut events).await {
        Some(Event::Message(message)) => {
            assert_eq!(message.text, "hi there");
            assert_eq!(message.channel.as_deref(), Some("C1"));
        }
        other => panic!("expected Message, got {other:?}"),
    }

    let cookie = fake.cookie.await.unwrap().unwrap();
    assert!(cookie.contains("d=xoxd-rtm"));
    assert!(cookie.contains("d-s=ds-rtm"));

    connection.shutdown();
    assert_eq!(
        next_event(&mut events).await,
        Some(Event::Disconnected { intentional: true })
    );
    assert_eq!(next_event(&mut events).await, None);
    connection.join().await.unwrap();
}

#[tokio::test]
async fn test_outgoing_frames_reach_server() {
    let mut fake = start_fake_rtm().await;
    let server = MockServer::start().await;
    mount_rtm_connect(&server, &fake.url).await;

    let config = config_for(&server);
    let session = Session::new(&config).unwrap();
    let (connection, mut events) =
        RtmConnection::spawn(Arc::clone(session.api()), config.rtm_config());

    // wait until the socket is open
    loop {
        match next_event(&mut events).await {
            Some(Event::Connected { .. }) => break,
            Some(_) => {}
            None => panic!("connection ended early"),
        }
    }

    let handle = connection.handle();
    let id = handle.send_typing("D02EF7FSVB6").unwrap();

    let frame = timeout(WAIT, fake.frames.recv()).await.unwrap().unwrap();
    assert_eq!(
        frame,
        json!({"type": "typing", "id": id, "channel": "D02EF7FSVB6"})
    );

    connection.shutdown();
    connection.join().await.unwrap();
}

#[tokio::test]
async fn test_session_sends_greeting_when_connected() {
    let mut fake = start_fake_rtm().await;
    let server = MockServer::start().await;
    mount_rtm_connect(&server, &fake.url).await;

    let mut config = config_for(&server);
    config.rtm.greeting = Some(Greeting::new("C2147483705").with_text("Morning all"));
    let session = Session::new(&config).unwrap();

    let realtime = session.start_realtime();
    let frame = timeout(WAIT, fake.frames.recv()).await.unwrap().unwrap();

    assert_eq!(frame["type"], "message");
    assert_eq!(frame["channel"], "C2147483705");
    assert_eq!(frame["text"], "Morning all");

    let stats = realtime.finish().await.unwrap();
    assert!(stats.events >= 2);
    assert!(!stats.stopped_on_invalid_auth);
}

#[tokio::test]
async fn test_pongs_produce_latency_reports() {
    let mut fake = start_fake_rtm_with(true).await;
    let server = MockServer::start().await;
    mount_rtm_connect(&server, &fake.url).await;

    let config = config_for(&server);
    let session = Session::new(&config).unwrap();
    let mut rtm_config = config.rtm_config();
    rtm_config.ping_interval = Duration::from_millis(50);
    let (connection, mut events) = RtmConnection::spawn(Arc::clone(session.api()), rtm_config);

    let latency = loop {
        match next_event(&mut events).await {
            Some(Event::LatencyReport { latency }) => break latency,
            Some(_) => {}
            None => panic!("connection ended before a pong arrived"),
        }
    };
    assert!(latency < WAIT);

    let ping = timeout(WAIT, fake.frames.recv()).await.unwrap().unwrap();
    assert_eq!(ping["type"], "ping");
    assert!(ping["id"].is_u64());
    assert!(ping["time"].is_i64());

    connection.shutdown();
    connection.join().await.unwrap();
}

#[tokio::test]
async fn test_finish_during_stalled_handshake() {
    // accepts the TCP connection but never answers the upgrade request
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/link", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(stream);
    });

    let server = MockServer::start().await;
    mount_rtm_connect(&server, &url).await;

    let config = config_for(&server);
    let session = Session::new(&config).unwrap();
    let realtime = session.start_realtime();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let stats = timeout(WAIT, realtime.finish())
        .await
        .expect("finish hung on the websocket handshake")
        .unwrap();
    assert!(!stats.stopped_on_invalid_auth);
}
