//! Web API module
//!
//! The [`SlackApi`] trait is the capability object the rest of the crate
//! depends on: paged conversation listing, paged history, user listing,
//! posting, and the `rtm.connect` handshake. [`WebApi`] implements it over
//! HTTP; tests substitute their own implementations.

mod types;
mod web;

pub use types::{
    ConversationsParams, HistoryParams, RtmConnectInfo, SelfInfo, SlackApi, TeamInfo,
};
pub use web::{ConversationPages, HistoryPages, WebApi};
