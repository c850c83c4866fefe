//! Slack client operations
//!
//! [`SlackClient`] is the caller-facing surface: the two paginated walks plus
//! the single-shot user listing and posting. It is generic over
//! [`SlackApi`] so tests can run it against a stub.

use crate::api::{ConversationPages, ConversationsParams, HistoryPages, HistoryParams, SlackApi};
use crate::error::Result;
use crate::http::CallContext;
use crate::pagination::{Continuation, PageObserver, Walk, Walker};
use crate::types::{Conversation, ConversationType, Message, PostedMessage, User};
use std::sync::Arc;
use tracing::{debug, info};

/// Conversation, history, user and posting operations over one API
pub struct SlackClient<A: SlackApi + ?Sized> {
    api: Arc<A>,
}

impl<A: SlackApi + ?Sized> Clone for SlackClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: SlackApi + ?Sized> SlackClient<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// The API the client calls
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Names of every conversation of the given types
    ///
    /// No types means all four. The walk ends quietly at the first failed
    /// page; whatever was gathered is returned with the error attached.
    pub async fn list_conversations(
        &self,
        ctx: &CallContext,
        types: &[ConversationType],
    ) -> Walk<String> {
        self.walk_conversations(ctx, &ConversationsParams::new(types), None)
            .await
    }

    /// Like [`SlackClient::list_conversations`], handing each page to `observer`
    pub async fn list_conversations_observed(
        &self,
        ctx: &CallContext,
        params: &ConversationsParams,
        observer: &mut (dyn PageObserver<Conversation> + Send),
    ) -> Walk<String> {
        self.walk_conversations(ctx, params, Some(observer)).await
    }

    /// Text of every message in a conversation, newest first
    pub async fn dump_conversation(&self, ctx: &CallContext, channel_id: &str) -> Walk<String> {
        self.walk_history(ctx, &HistoryParams::new(channel_id), None)
            .await
    }

    /// Like [`SlackClient::dump_conversation`], handing each page to `observer`
    pub async fn dump_conversation_observed(
        &self,
        ctx: &CallContext,
        params: &HistoryParams,
        observer: &mut (dyn PageObserver<Message> + Send),
    ) -> Walk<String> {
        self.walk_history(ctx, params, Some(observer)).await
    }

    /// First page of workspace members
    pub async fn list_users(&self, ctx: &CallContext) -> Result<Vec<User>> {
        let users = self.api.users(ctx).await?;
        debug!("users.list returned {} members", users.len());
        Ok(users)
    }

    /// Post `text` to `channel`
    pub async fn send_message(
        &self,
        ctx: &CallContext,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage> {
        let posted = self.api.post_message(ctx, channel, text).await?;
        info!(
            "Message successfully sent to channel {} at {}",
            posted.channel, posted.ts
        );
        Ok(posted)
    }

    async fn walk_conversations(
        &self,
        ctx: &CallContext,
        params: &ConversationsParams,
        observer: Option<&mut (dyn PageObserver<Conversation> + Send)>,
    ) -> Walk<String> {
        let fetcher = ConversationPages::new(&*self.api, ctx, params);
        let mut walker = Walker::new(Continuation::UntilError).labelled("conversations.list");
        if let Some(observer) = observer {
            walker = walker.observe(observer);
        }

        let walk = walker
            .run(&fetcher, |conversation: &Conversation| {
                conversation.name.clone()
            })
            .await;
        debug!(
            "Listed {} conversations over {} pages",
            walk.items.len(),
            walk.pages
        );
        walk
    }

    async fn walk_history(
        &self,
        ctx: &CallContext,
        params: &HistoryParams,
        observer: Option<&mut (dyn PageObserver<Message> + Send)>,
    ) -> Walk<String> {
        let fetcher = HistoryPages::new(&*self.api, ctx, params);
        let label = format!("conversations.history {}", params.channel);
        let mut walker = Walker::new(Continuation::WhileHasMore).labelled(label);
        if let Some(observer) = observer {
            walker = walker.observe(observer);
        }

        let walk = walker
            .run(&fetcher, |message: &Message| message.text.clone())
            .await;
        debug!(
            "Dumped {} messages from {} over {} pages",
            walk.items.len(),
            params.channel,
            walk.pages
        );
        walk
    }
}

impl<A: SlackApi + ?Sized> std::fmt::Debug for SlackClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient").finish_non_exhaustive()
    }
}
