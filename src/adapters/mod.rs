//! Adapters module — hosts that drive the chat agent.
//!
//! # Supported Channels
//!
//! - **CLI** — Interactive and single-command terminal interface

pub mod cli;
