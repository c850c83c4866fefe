//! Common types used throughout the client
//!
//! Wire types for the handful of Web API objects the client reads and
//! writes. All of them deserialize leniently: unknown fields are ignored
//! and missing optional fields fall back to defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Form fields for a Web API call
pub type FormFields = Vec<(String, String)>;

// ============================================================================
// Conversation Types
// ============================================================================

/// Kind of conversation to include in a listing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ConversationType {
    /// Public channels
    PublicChannel,
    /// Private channels
    PrivateChannel,
    /// Multi-person direct messages
    Mpim,
    /// Direct messages
    Im,
}

impl ConversationType {
    /// Every conversation type, the default when none is requested
    pub const ALL: [ConversationType; 4] = [
        ConversationType::PublicChannel,
        ConversationType::PrivateChannel,
        ConversationType::Mpim,
        ConversationType::Im,
    ];

    /// Wire name of the type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicChannel => "public_channel",
            Self::PrivateChannel => "private_channel",
            Self::Mpim => "mpim",
            Self::Im => "im",
        }
    }

    /// Join types into the comma-separated form the API expects
    pub fn join(types: &[ConversationType]) -> String {
        types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "public_channel" => Ok(Self::PublicChannel),
            "private_channel" => Ok(Self::PrivateChannel),
            "mpim" => Ok(Self::Mpim),
            "im" => Ok(Self::Im),
            other => Err(crate::Error::invalid_value(
                "types",
                format!("unknown conversation type '{other}'"),
            )),
        }
    }
}

/// Topic or purpose text attached to a conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// The text
    #[serde(default)]
    pub value: String,
    /// User who set it
    #[serde(default)]
    pub creator: String,
    /// Unix time it was last set
    #[serde(default)]
    pub last_set: i64,
}

/// A channel, private group, IM or MPIM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation ID (e.g. `C012AB3CD`)
    pub id: String,
    /// Channel name; empty for direct messages
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_channel: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_member: bool,
    /// Unix creation time
    #[serde(default)]
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Other party of a direct message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_members: Option<u32>,
}

// ============================================================================
// Messages
// ============================================================================

/// A message, as found in history responses and RTM events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Always "message" for real messages
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Message timestamp, which doubles as its ID within a channel
    #[serde(default)]
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u32>,
    /// Present on RTM message events, absent in history responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Message {
    /// Parse `ts` ("seconds.micros") into a UTC timestamp
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_ts(&self.ts)
    }
}

/// Parse a platform timestamp such as `1700000000.000200`
pub fn parse_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().take(6).collect();
        let padded = format!("{digits:0<6}");
        padded.parse().ok()?
    };
    DateTime::from_timestamp(secs, micros * 1_000)
}

/// Result of posting a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    /// Channel the message landed in
    pub channel: String,
    /// Timestamp of the new message
    pub ts: String,
}

// ============================================================================
// Users
// ============================================================================

/// Profile block of a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_72: Option<String>,
}

/// A workspace member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
}

impl User {
    /// Best human-readable name: display name, then real name, then handle
    pub fn display_name(&self) -> &str {
        if !self.profile.display_name.is_empty() {
            &self.profile.display_name
        } else if let Some(real) = self.real_name.as_deref().filter(|s| !s.is_empty()) {
            real
        } else {
            &self.name
        }
    }
}
