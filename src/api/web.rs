//! HTTP implementation of [`SlackApi`]

use super::types::{ConversationsParams, HistoryParams, RtmConnectInfo, SlackApi};
use crate::error::{Error, Result};
use crate::http::{CallContext, HttpClient, RequestConfig};
use crate::pagination::{Cursor, Page, PageFetcher};
use crate::types::{Conversation, FormFields, JsonValue, Message, PostedMessage, User};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Envelope every Web API response is wrapped in
#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Cursor,
}

#[derive(Debug, Deserialize)]
struct ConversationsResponse {
    #[serde(default)]
    channels: Vec<Conversation>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    members: Vec<User>,
}

/// Web API client
///
/// Every method is a form-encoded POST to `{api_url}/{method}`. Credentials
/// ride on the underlying [`HttpClient`].
#[derive(Debug, Clone)]
pub struct WebApi {
    http: HttpClient,
}

impl WebApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Call `method` and decode its envelope
    ///
    /// `ok: false` becomes [`Error::Api`] carrying the platform's error code.
    pub async fn call<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        method: &str,
        form: FormFields,
    ) -> Result<T> {
        let body: JsonValue = self
            .http
            .request_json(ctx, Method::POST, method, RequestConfig::new().form(form))
            .await?;

        let envelope = Envelope::deserialize(&body)?;
        if let Some(warning) = &envelope.warning {
            warn!("{method}: {warning}");
        }
        if !envelope.ok {
            let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(Error::api(method, code));
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Bind conversation listing to fixed parameters
    pub fn conversation_pages<'a>(
        &'a self,
        ctx: &'a CallContext,
        params: &'a ConversationsParams,
    ) -> ConversationPages<'a, Self> {
        ConversationPages::new(self, ctx, params)
    }

    /// Bind a history dump to fixed parameters
    pub fn history_pages<'a>(
        &'a self,
        ctx: &'a CallContext,
        params: &'a HistoryParams,
    ) -> HistoryPages<'a, Self> {
        HistoryPages::new(self, ctx, params)
    }
}

#[async_trait]
impl SlackApi for WebApi {
    async fn conversations(
        &self,
        ctx: &CallContext,
        params: &ConversationsParams,
        cursor: &Cursor,
    ) -> Result<Page<Conversation>> {
        let response: ConversationsResponse = self
            .call(ctx, "conversations.list", params.form(cursor))
            .await?;
        Ok(Page::new(
            response.channels,
            response.response_metadata.next_cursor,
        ))
    }

    async fn history(
        &self,
        ctx: &CallContext,
        params: &HistoryParams,
        cursor: &Cursor,
    ) -> Result<Page<Message>> {
        let response: HistoryResponse = self
            .call(ctx, "conversations.history", params.form(cursor))
            .await?;
        let next = response.response_metadata.next_cursor;
        if response.has_more && next.is_empty() {
            debug!(
                "conversations.history for {} reported has_more without a cursor",
                params.channel
            );
        }
        Ok(Page::new(response.messages, next))
    }

    async fn users(&self, ctx: &CallContext) -> Result<Vec<User>> {
        let response: UsersResponse = self.call(ctx, "users.list", Vec::new()).await?;
        Ok(response.members)
    }

    async fn post_message(
        &self,
        ctx: &CallContext,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage> {
        let form = vec![
            ("channel".to_string(), channel.to_string()),
            ("text".to_string(), text.to_string()),
        ];
        self.call(ctx, "chat.postMessage", form).await
    }

    async fn rtm_connect(&self, ctx: &CallContext) -> Result<RtmConnectInfo> {
        self.call(ctx, "rtm.connect", Vec::new()).await
    }
}

// ============================================================================
// Page fetchers
// ============================================================================

/// `conversations.list` bound to one context and parameter set
pub struct ConversationPages<'a, A: SlackApi + ?Sized> {
    api: &'a A,
    ctx: &'a CallContext,
    params: &'a ConversationsParams,
}

impl<'a, A: SlackApi + ?Sized> ConversationPages<'a, A> {
    pub fn new(api: &'a A, ctx: &'a CallContext, params: &'a ConversationsParams) -> Self {
        Self { api, ctx, params }
    }
}

#[async_trait]
impl<A: SlackApi + ?Sized> PageFetcher<Conversation> for ConversationPages<'_, A> {
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<Conversation>> {
        self.api.conversations(self.ctx, self.params, cursor).await
    }
}

/// `conversations.history` bound to one context and parameter set
pub struct HistoryPages<'a, A: SlackApi + ?Sized> {
    api: &'a A,
    ctx: &'a CallContext,
    params: &'a HistoryParams,
}

impl<'a, A: SlackApi + ?Sized> HistoryPages<'a, A> {
    pub fn new(api: &'a A, ctx: &'a CallContext, params: &'a HistoryParams) -> Self {
        Self { api, ctx, params }
    }
}

#[async_trait]
impl<A: SlackApi + ?Sized> PageFetcher<Message> for HistoryPages<'_, A> {
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<Message>> {
        self.api.history(self.ctx, self.params, cursor).await
    }
}
