//! Realtime connection task
//!
//! One task owns the websocket. Inbound frames are decoded and forwarded in
//! arrival order over a bounded channel; outgoing frames come in through an
//! unbounded channel so the writer half has a single owner. There is no
//! reconnect: when the socket goes away the task emits `Disconnected` and
//! closes the event channel.

use super::types::{decode_frame, Event, Frame, Outgoing, RtmConfig};
use crate::api::SlackApi;
use crate::error::{Error, Result};
use crate::http::CallContext;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Sends frames over a running connection and stops it
#[derive(Debug, Clone)]
pub struct RtmHandle {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    shutdown: CancellationToken,
    next_id: Arc<AtomicU64>,
}

impl RtmHandle {
    fn new(outgoing: mpsc::UnboundedSender<Outgoing>, shutdown: CancellationToken) -> Self {
        Self {
            outgoing,
            shutdown,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// A handle with no connection behind it; frames land on the returned receiver
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, CancellationToken::new()), rx)
    }

    /// Queue a plain text message; returns the frame id
    pub fn send_message(&self, channel: &str, text: &str) -> Result<u64> {
        let id = self.next_id();
        self.queue(Outgoing::Message {
            id,
            channel: channel.to_string(),
            text: text.to_string(),
        })?;
        Ok(id)
    }

    /// Queue a typing indicator; returns the frame id
    pub fn send_typing(&self, channel: &str) -> Result<u64> {
        let id = self.next_id();
        self.queue(Outgoing::Typing {
            id,
            channel: channel.to_string(),
        })?;
        Ok(id)
    }

    /// Ask the connection to close
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn queue(&self, frame: Outgoing) -> Result<()> {
        self.outgoing.send(frame).map_err(|_| Error::ChannelClosed)
    }
}

/// A spawned realtime connection
pub struct RtmConnection {
    handle: RtmHandle,
    task: JoinHandle<()>,
}

impl RtmConnection {
    /// Start the connection task
    ///
    /// Returns the connection and the receiving end of its event stream. The
    /// stream ends when the task does.
    pub fn spawn<A>(api: Arc<A>, config: RtmConfig) -> (Self, mpsc::Receiver<Event>)
    where
        A: SlackApi + ?Sized + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let handle = RtmHandle::new(out_tx, CancellationToken::new());

        let worker = Worker {
            config,
            events: event_tx,
            outgoing: out_rx,
            shutdown: handle.shutdown.clone(),
            next_id: handle.next_id.clone(),
        };
        let task = tokio::spawn(worker.run(api));

        (Self { handle, task }, event_rx)
    }

    pub fn handle(&self) -> RtmHandle {
        self.handle.clone()
    }

    pub fn shutdown(&self) {
        self.handle.shutdown();
    }

    /// Wait for the connection task to finish
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::rtm(format!("connection task failed: {e}")))
    }
}

impl std::fmt::Debug for RtmConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtmConnection")
            .field("shutdown", &self.handle.is_shutdown())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

/// Pings awaiting a pong. A ping older than `MAX_OUTSTANDING_PINGS`
/// intervals is forgotten so a server that drops pongs cannot grow the map.
pub(crate) struct PingTracker {
    pending: HashMap<u64, Instant>,
    max_age: Duration,
}

const MAX_OUTSTANDING_PINGS: u32 = 3;

impl PingTracker {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            max_age: interval * MAX_OUTSTANDING_PINGS,
        }
    }

    pub(crate) fn sent(&mut self, id: u64, at: Instant) {
        let max_age = self.max_age;
        self.pending
            .retain(|_, sent| at.saturating_duration_since(*sent) < max_age);
        self.pending.insert(id, at);
    }

    /// Round trip for `reply_to`, if that ping is still tracked.
    pub(crate) fn answered(&mut self, reply_to: u64, at: Instant) -> Option<Duration> {
        self.pending
            .remove(&reply_to)
            .map(|sent| at.saturating_duration_since(sent))
    }

    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

struct Worker {
    config: RtmConfig,
    events: mpsc::Sender<Event>,
    outgoing: mpsc::UnboundedReceiver<Outgoing>,
    shutdown: CancellationToken,
    next_id: Arc<AtomicU64>,
}

impl Worker {
    async fn run<A: SlackApi + ?Sized>(mut self, api: Arc<A>) {
        if !self.emit(Event::Connecting { attempt: 1 }).await {
            return;
        }

        let ctx = CallContext::new().with_cancellation(self.shutdown.child_token());
        let info = match api.rtm_connect(&ctx).await {
            Ok(info) => info,
            Err(e) if e.is_auth_failure() => {
                warn!("rtm.connect rejected the credentials: {e}");
                self.emit(Event::InvalidAuth).await;
                return;
            }
            Err(Error::Cancelled) => {
                self.emit(Event::Disconnected { intentional: true }).await;
                return;
            }
            Err(e) => {
                self.fail(e).await;
                return;
            }
        };

        let opened = tokio::select! {
            _ = self.shutdown.cancelled() => {
                debug!("RTM shutdown requested during the websocket handshake");
                self.emit(Event::Disconnected { intentional: true }).await;
                return;
            }
            opened = open_socket(&info.url, self.config.cookie_header.as_deref()) => opened,
        };
        let socket = match opened {
            Ok(socket) => socket,
            Err(e) => {
                self.fail(e).await;
                return;
            }
        };

        info!(
            "Connected to {} as {} ({})",
            info.team.domain, info.user.name, info.user.id
        );
        if !self
            .emit(Event::Connected {
                info,
                connection_count: 1,
            })
            .await
        {
            return;
        }

        let intentional = self.pump(socket).await;
        self.emit(Event::Disconnected { intentional }).await;
    }

    /// Shuttle frames until the socket or the shutdown token ends it.
    /// Returns whether the end was requested.
    async fn pump(&mut self, socket: WsStream) -> bool {
        let (mut writer, mut reader) = socket.split();
        let period = self.config.ping_interval.max(Duration::from_millis(10));
        let mut pings = PingTracker::new(period);
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("RTM shutdown requested");
                    if let Err(e) = writer.send(WsMessage::Close(None)).await {
                        debug!("close frame not sent: {e}");
                    }
                    return true;
                }

                Some(frame) = self.outgoing.recv() => {
                    if let Err(e) = send_frame(&mut writer, &frame).await {
                        self.emit(Event::ConnectionError { message: e.to_string() }).await;
                        return false;
                    }
                }

                _ = ticker.tick() => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let ping = Outgoing::Ping { id, time: chrono::Utc::now().timestamp() };
                    pings.sent(id, Instant::now());
                    if let Err(e) = send_frame(&mut writer, &ping).await {
                        self.emit(Event::ConnectionError { message: e.to_string() }).await;
                        return false;
                    }
                }

                inbound = reader.next() => match inbound {
                    Some(Ok(WsMessage::Text(text))) => match decode_frame(&text) {
                        Ok(Frame::Pong { reply_to }) => {
                            if let Some(latency) = pings.answered(reply_to, Instant::now()) {
                                if !self.emit(Event::LatencyReport { latency }).await {
                                    return true;
                                }
                            }
                        }
                        Ok(Frame::Event(event)) => {
                            if !self.emit(event).await {
                                return true;
                            }
                        }
                        Err(e) => warn!("Dropping undecodable RTM frame: {e}"),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        debug!("Server closed the RTM socket: {frame:?}");
                        return false;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.emit(Event::ConnectionError { message: e.to_string() }).await;
                        return false;
                    }
                    None => return false,
                },
            }
        }
    }

    async fn fail(&self, err: Error) {
        warn!("RTM connection failed: {err}");
        if self
            .emit(Event::ConnectionError {
                message: err.to_string(),
            })
            .await
        {
            self.emit(Event::Disconnected { intentional: false }).await;
        }
    }

    /// Forward an event; false once nobody is listening
    async fn emit(&self, event: Event) -> bool {
        debug!("RTM event: {}", event.name());
        self.events.send(event).await.is_ok()
    }
}

async fn open_socket(url: &str, cookie: Option<&str>) -> Result<WsStream> {
    let mut request = url.into_client_request()?;
    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| Error::rtm(format!("invalid cookie header: {e}")))?;
        request.headers_mut().insert(COOKIE, value);
    }

    let (socket, response) = tokio_tungstenite::connect_async(request).await?;
    debug!("RTM websocket upgraded with status {}", response.status());
    Ok(socket)
}

async fn send_frame<S>(writer: &mut S, frame: &Outgoing) -> Result<()>
where
    S: futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(frame)?;
    debug!("RTM send #{}: {text}", frame.id());
    writer.send(WsMessage::Text(text)).await?;
    Ok(())
}
