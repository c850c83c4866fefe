//! Client configuration
//!
//! `ClientConfig` is the single explicit configuration value handed to
//! [`Session::new`](crate::session::Session::new). It can be loaded from a
//! YAML (or JSON) file and then overridden field by field from the command
//! line or the environment.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::rtm::{ConsumerSettings, Greeting, RtmConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default Web API base URL
pub const DEFAULT_API_URL: &str = "https://slack.com/api/";

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User token (`xoxc-...`)
    #[serde(default)]
    pub token: String,

    /// Value of the `d` session cookie
    #[serde(default)]
    pub d_cookie: String,

    /// Value of the `d-s` session cookie
    #[serde(default)]
    pub ds_cookie: Option<String>,

    /// Web API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Log every API call at debug level
    #[serde(default)]
    pub debug: bool,

    /// Realtime connection settings
    #[serde(default)]
    pub rtm: RtmSettings,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            d_cookie: String::new(),
            ds_cookie: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            debug: false,
            rtm: RtmSettings::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &redact(&self.token))
            .field("d_cookie", &redact(&self.d_cookie))
            .field("ds_cookie", &self.ds_cookie.as_deref().map(redact))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .field("rtm", &self.rtm)
            .finish()
    }
}

pub(crate) fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

// ============================================================================
// Realtime Settings
// ============================================================================

/// Realtime (RTM) settings as they appear in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtmSettings {
    /// Seconds between keepalive pings
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Capacity of the inbound event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Message to post once connected
    #[serde(default)]
    pub greeting: Option<Greeting>,

    /// Channels that get a typing indicator when an unrecognised event arrives
    #[serde(default)]
    pub typing_channels: Vec<String>,
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    100
}

impl Default for RtmSettings {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            event_buffer: default_event_buffer(),
            greeting: None,
            typing_channels: Vec::new(),
        }
    }
}

// ============================================================================
// Overrides
// ============================================================================

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub token: Option<String>,
    pub d_cookie: Option<String>,
    pub ds_cookie: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub debug: bool,
}

// ============================================================================
// Loading and Validation
// ============================================================================

impl ClientConfig {
    /// Create a config from credentials, everything else defaulted
    pub fn new(token: impl Into<String>, d_cookie: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            d_cookie: d_cookie.into(),
            ..Default::default()
        }
    }

    /// Set the `d-s` cookie
    #[must_use]
    pub fn with_ds_cookie(mut self, ds_cookie: impl Into<String>) -> Self {
        self.ds_cookie = Some(ds_cookie.into());
        self
    }

    /// Set the Web API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Load a config file (YAML; JSON is valid YAML)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a config from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply command-line / environment overrides on top of file values
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.token {
            self.token = token;
        }
        if let Some(d) = overrides.d_cookie {
            self.d_cookie = d;
        }
        if let Some(ds) = overrides.ds_cookie {
            self.ds_cookie = Some(ds);
        }
        if let Some(url) = overrides.api_url {
            self.api_url = url;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        if overrides.debug {
            self.debug = true;
        }
    }

    /// Check that the config can bootstrap a session
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::missing_field("token"));
        }
        if self.d_cookie.trim().is_empty() {
            return Err(Error::missing_field("d_cookie"));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be positive"));
        }
        if self.rtm.event_buffer == 0 {
            return Err(Error::invalid_value("rtm.event_buffer", "must be positive"));
        }
        if self.rtm.ping_interval_secs == 0 {
            return Err(Error::invalid_value(
                "rtm.ping_interval_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Session credentials
    pub fn credentials(&self) -> Credentials {
        let mut creds = Credentials::new(&self.token, &self.d_cookie);
        if let Some(ds) = self.ds_cookie.as_deref().filter(|s| !s.is_empty()) {
            creds = creds.with_ds_cookie(ds);
        }
        creds
    }

    /// HTTP transport settings
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .debug(self.debug);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// Realtime connection settings
    pub fn rtm_config(&self) -> RtmConfig {
        RtmConfig {
            ping_interval: Duration::from_secs(self.rtm.ping_interval_secs),
            event_buffer: self.rtm.event_buffer,
            cookie_header: Some(self.credentials().cookie_header()),
        }
    }

    /// Event consumer settings
    pub fn consumer_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            greeting: self.rtm.greeting.clone(),
            typing_channels: self.rtm.typing_channels.clone(),
        }
    }
}
