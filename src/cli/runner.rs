//! CLI runner - executes commands

use crate::api::{ConversationsParams, HistoryParams};
use crate::cli::commands::{Cli, Commands};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::CallContext;
use crate::output::{print_json, JsonLinesTrace, OutputStyle};
use crate::pagination::Walk;
use crate::session::Session;
use crate::types::ConversationType;
use std::time::Duration;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Whether `-v` was given
    pub fn verbose(&self) -> bool {
        self.cli.verbose
    }

    /// Config file (if any) with flag and environment overrides applied
    pub fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply(self.cli.overrides());
        Ok(config)
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        self.run_with_config(config).await
    }

    /// Run the CLI command against an already loaded config
    pub async fn run_with_config(&self, config: ClientConfig) -> Result<()> {
        let session = Session::new(&config)?;
        let ctx = CallContext::new();

        match &self.cli.command {
            Commands::Conversations {
                types,
                limit,
                exclude_archived,
                team_id,
            } => {
                let mut params = ConversationsParams::new(types);
                params.limit = *limit;
                params.exclude_archived = *exclude_archived;
                params.team_id = team_id.clone();
                self.conversations(&session, &ctx, &params).await
            }
            Commands::History {
                channel,
                limit,
                oldest,
                latest,
                inclusive,
            } => {
                let mut params =
                    HistoryParams::new(channel).between(oldest.clone(), latest.clone());
                params.limit = *limit;
                params.inclusive = *inclusive;
                self.history(&session, &ctx, &params).await
            }
            Commands::Users => self.users(&session, &ctx).await,
            Commands::Send { channel, text } => self.send(&session, &ctx, channel, text).await,
            Commands::Listen { duration } => self.listen(&session, *duration).await,
        }
    }

    fn style(&self) -> OutputStyle {
        self.cli.format.into()
    }

    async fn conversations(
        &self,
        session: &Session,
        ctx: &CallContext,
        params: &ConversationsParams,
    ) -> Result<()> {
        let mut trace = JsonLinesTrace::stdout(self.style());
        let walk = session
            .client()
            .list_conversations_observed(ctx, params, &mut trace)
            .await;

        info!(
            "{} conversations ({})",
            walk.items.len(),
            ConversationType::join(&params.types)
        );
        finish_walk("conversations.list", walk)
    }

    async fn history(
        &self,
        session: &Session,
        ctx: &CallContext,
        params: &HistoryParams,
    ) -> Result<()> {
        let mut trace = JsonLinesTrace::stdout(self.style());
        let walk = session
            .client()
            .dump_conversation_observed(ctx, params, &mut trace)
            .await;

        info!("{} messages from {}", walk.items.len(), params.channel);
        finish_walk("conversations.history", walk)
    }

    async fn users(&self, session: &Session, ctx: &CallContext) -> Result<()> {
        let users = session.client().list_users(ctx).await?;
        let mut trace = JsonLinesTrace::stdout(self.style());
        for user in &users {
            trace.write_record(user)?;
        }
        info!("{} users", users.len());
        Ok(())
    }

    async fn send(
        &self,
        session: &Session,
        ctx: &CallContext,
        channel: &str,
        text: &str,
    ) -> Result<()> {
        let posted = session.client().send_message(ctx, channel, text).await?;
        print_json(&posted, self.style())
    }

    async fn listen(&self, session: &Session, duration: u64) -> Result<()> {
        let realtime = session.start_realtime();

        let stop = async move {
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Cannot listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            };
            if duration == 0 {
                ctrl_c.await;
            } else {
                tokio::select! {
                    () = tokio::time::sleep(Duration::from_secs(duration)) => {}
                    () = ctrl_c => info!("Interrupted"),
                }
            }
        };

        let stats = realtime.run_until(stop).await?;
        info!(
            "Realtime session ended: {} events, {} messages",
            stats.events, stats.messages
        );

        if stats.stopped_on_invalid_auth {
            return Err(Error::auth("Invalid credentials"));
        }
        Ok(())
    }
}

/// Items were already printed; surface the error that cut the walk short
fn finish_walk(method: &str, walk: Walk<String>) -> Result<()> {
    match walk.error {
        None => Ok(()),
        Some(err) => {
            warn!(
                "{method} stopped after {} pages with {} items",
                walk.pages,
                walk.items.len()
            );
            Err(err)
        }
    }
}
