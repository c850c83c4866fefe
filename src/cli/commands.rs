//! CLI commands and argument parsing

use crate::config::ConfigOverrides;
use crate::output::OutputStyle;
use crate::types::ConversationType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cookie-authenticated Slack client
#[derive(Parser, Debug)]
#[command(name = "slack-cookie-cli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// User token (xoxc-...)
    #[arg(long, global = true, env = "SLACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Value of the `d` session cookie
    #[arg(long, global = true, env = "SLACK_D_COOKIE", hide_env_values = true)]
    pub d_cookie: Option<String>,

    /// Value of the `d-s` session cookie
    #[arg(long, global = true, env = "SLACK_DS_COOKIE", hide_env_values = true)]
    pub ds_cookie: Option<String>,

    /// Web API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Flag and environment values that override the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            token: self.token.clone(),
            d_cookie: self.d_cookie.clone(),
            ds_cookie: self.ds_cookie.clone(),
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout,
            debug: self.verbose,
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List conversation names
    Conversations {
        /// Conversation types (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        types: Vec<ConversationType>,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Skip archived channels
        #[arg(long)]
        exclude_archived: bool,

        /// Workspace to list, for org-wide tokens
        #[arg(long)]
        team_id: Option<String>,
    },

    /// Dump every message of a conversation
    History {
        /// Conversation ID
        channel: String,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Only messages after this timestamp
        #[arg(long)]
        oldest: Option<String>,

        /// Only messages before this timestamp
        #[arg(long)]
        latest: Option<String>,

        /// Include messages exactly at --oldest / --latest
        #[arg(long)]
        inclusive: bool,
    },

    /// List workspace members
    Users,

    /// Post a message
    Send {
        /// Conversation ID
        channel: String,

        /// Message text
        text: String,
    },

    /// Follow the realtime event stream
    Listen {
        /// Seconds to stay connected (0 = until Ctrl-C)
        #[arg(long, default_value = "60")]
        duration: u64,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Indented JSON
    Pretty,
}

impl From<OutputFormat> for OutputStyle {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => OutputStyle::Lines,
            OutputFormat::Pretty => OutputStyle::Pretty,
        }
    }
}
