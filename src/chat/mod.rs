//! Chat module — the conversational command dispatcher.
//!
//! This module contains:
//! - Slash commands, chat requests, and follow-ups
//! - Prompt templates per command
//! - Per-conversation pagination over catalog results
//! - Relay of streamed completion fragments to a progress sink
//! - The dispatcher and the session-aware [`ChatAgent`] wrapped around it

mod agent;
mod dispatcher;

pub mod command;
pub mod pagination;
pub mod prompts;
pub mod relay;

pub use agent::ChatAgent;
pub use command::{
    ChatRequest, Command, DispatchResult, Followup, SlashCommand, CONTINUATION, SLASH_COMMANDS,
};
pub use dispatcher::Dispatcher;
pub use pagination::{PaginationState, SessionStore, PAGE_SIZE};
pub use relay::{relay, strip_response_end, ProgressSink};
