//! Web API parameter types and the capability trait

use crate::error::Result;
use crate::http::CallContext;
use crate::pagination::{Cursor, Page};
use crate::types::{Conversation, ConversationType, FormFields, Message, PostedMessage, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Capability Trait
// ============================================================================

/// Operations the client needs from the platform
///
/// Every call takes a [`CallContext`] for its timeout and cancellation.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// One page of `conversations.list`
    async fn conversations(
        &self,
        ctx: &CallContext,
        params: &ConversationsParams,
        cursor: &Cursor,
    ) -> Result<Page<Conversation>>;

    /// One page of `conversations.history`
    async fn history(
        &self,
        ctx: &CallContext,
        params: &HistoryParams,
        cursor: &Cursor,
    ) -> Result<Page<Message>>;

    /// `users.list`, first page only
    async fn users(&self, ctx: &CallContext) -> Result<Vec<User>>;

    /// `chat.postMessage` with plain text
    async fn post_message(
        &self,
        ctx: &CallContext,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage>;

    /// `rtm.connect`: websocket URL plus who we are
    async fn rtm_connect(&self, ctx: &CallContext) -> Result<RtmConnectInfo>;
}

// ============================================================================
// conversations.list
// ============================================================================

/// Fixed parameters of a conversation listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationsParams {
    /// Conversation kinds to include
    pub types: Vec<ConversationType>,
    /// Skip archived channels
    pub exclude_archived: bool,
    /// Page size hint
    pub limit: Option<u32>,
    /// Workspace to list, for org-wide tokens
    pub team_id: Option<String>,
}

impl Default for ConversationsParams {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl ConversationsParams {
    /// List the given types; all four when `types` is empty
    pub fn new(types: &[ConversationType]) -> Self {
        let types = if types.is_empty() {
            ConversationType::ALL.to_vec()
        } else {
            types.to_vec()
        };
        Self {
            types,
            exclude_archived: false,
            limit: None,
            team_id: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn excluding_archived(mut self) -> Self {
        self.exclude_archived = true;
        self
    }

    #[must_use]
    pub fn in_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Form body for the page starting at `cursor`
    pub fn form(&self, cursor: &Cursor) -> FormFields {
        let mut form = vec![("types".to_string(), ConversationType::join(&self.types))];
        if self.exclude_archived {
            form.push(("exclude_archived".to_string(), "true".to_string()));
        }
        if let Some(limit) = self.limit {
            form.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(team) = &self.team_id {
            form.push(("team_id".to_string(), team.clone()));
        }
        push_cursor(&mut form, cursor);
        form
    }
}

// ============================================================================
// conversations.history
// ============================================================================

/// Fixed parameters of a history dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryParams {
    /// Conversation ID
    pub channel: String,
    /// Ask for message metadata as well
    pub include_all_metadata: bool,
    /// Page size hint
    pub limit: Option<u32>,
    /// Only messages after this timestamp
    pub oldest: Option<String>,
    /// Only messages before this timestamp
    pub latest: Option<String>,
    /// Include messages exactly at `oldest` / `latest`
    pub inclusive: bool,
}

impl HistoryParams {
    /// Full history of `channel`, metadata included
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            include_all_metadata: true,
            limit: None,
            oldest: None,
            latest: None,
            inclusive: false,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn between(mut self, oldest: Option<String>, latest: Option<String>) -> Self {
        self.oldest = oldest;
        self.latest = latest;
        self
    }

    #[must_use]
    pub fn inclusive(mut self) -> Self {
        self.inclusive = true;
        self
    }

    /// Form body for the page starting at `cursor`
    pub fn form(&self, cursor: &Cursor) -> FormFields {
        let mut form = vec![("channel".to_string(), self.channel.clone())];
        if self.include_all_metadata {
            form.push(("include_all_metadata".to_string(), "true".to_string()));
        }
        if let Some(limit) = self.limit {
            form.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(oldest) = &self.oldest {
            form.push(("oldest".to_string(), oldest.clone()));
        }
        if let Some(latest) = &self.latest {
            form.push(("latest".to_string(), latest.clone()));
        }
        if self.inclusive {
            form.push(("inclusive".to_string(), "true".to_string()));
        }
        push_cursor(&mut form, cursor);
        form
    }
}

fn push_cursor(form: &mut FormFields, cursor: &Cursor) {
    if !cursor.is_empty() {
        form.push(("cursor".to_string(), cursor.as_str().to_string()));
    }
}

// ============================================================================
// rtm.connect
// ============================================================================

/// Identity of the connected user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Workspace of the connected user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
}

/// Result of `rtm.connect`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtmConnectInfo {
    /// Websocket URL to open
    pub url: String,
    #[serde(rename = "self", default)]
    pub user: SelfInfo,
    #[serde(default)]
    pub team: TeamInfo,
}
