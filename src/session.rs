//! Session bootstrap
//!
//! Turns a [`ClientConfig`] into a ready client: credentials are validated,
//! the cookie jar and HTTP transport are built, and the Web API is wrapped
//! in a [`SlackClient`]. Nothing here is global; every session owns its own
//! transport.

use crate::api::WebApi;
use crate::auth::Authenticator;
use crate::client::SlackClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::rtm::{
    ConsumerSettings, ConsumerStats, EventConsumer, RtmConfig, RtmConnection, RtmHandle,
};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// An authenticated session
#[derive(Debug)]
pub struct Session {
    api: Arc<WebApi>,
    client: SlackClient<WebApi>,
    rtm: RtmConfig,
    consumer: ConsumerSettings,
}

impl Session {
    /// Bootstrap a session from `config`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let authenticator = Authenticator::new(config.credentials())?;
        let http = HttpClient::with_auth(config.http_config(), authenticator)?;
        let api = Arc::new(WebApi::new(http));
        debug!("Session ready for {}", config.api_url);

        Ok(Self {
            client: SlackClient::new(Arc::clone(&api)),
            api,
            rtm: config.rtm_config(),
            consumer: config.consumer_settings(),
        })
    }

    pub fn client(&self) -> &SlackClient<WebApi> {
        &self.client
    }

    pub fn api(&self) -> &Arc<WebApi> {
        &self.api
    }

    /// Open the realtime connection and start consuming its events
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_realtime(&self) -> Realtime {
        let (connection, events) = RtmConnection::spawn(Arc::clone(&self.api), self.rtm.clone());
        let consumer = EventConsumer::new(connection.handle(), self.consumer.clone()).spawn(events);
        info!("Realtime connection started");
        Realtime {
            connection,
            consumer,
        }
    }
}

/// A running realtime connection and its consumer
#[derive(Debug)]
pub struct Realtime {
    connection: RtmConnection,
    consumer: JoinHandle<ConsumerStats>,
}

impl Realtime {
    pub fn handle(&self) -> RtmHandle {
        self.connection.handle()
    }

    /// Ask the connection to close
    pub fn shutdown(&self) {
        self.connection.shutdown();
    }

    /// Run until `stop` resolves or the consumer ends on its own, then shut
    /// down and join both tasks
    pub async fn run_until<F>(mut self, stop: F) -> Result<ConsumerStats>
    where
        F: Future<Output = ()>,
    {
        let finished = tokio::select! {
            _ = stop => None,
            joined = &mut self.consumer => Some(joined),
        };

        self.connection.shutdown();
        let joined = match finished {
            Some(joined) => joined,
            None => self.consumer.await,
        };
        self.connection.join().await?;

        joined.map_err(|e| Error::rtm(format!("event consumer failed: {e}")))
    }

    /// Shut down now and join both tasks
    pub async fn finish(self) -> Result<ConsumerStats> {
        self.run_until(std::future::ready(())).await
    }
}
