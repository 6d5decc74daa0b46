//! apicenter-chat - conversational API catalog assistant
//!
//! This library provides the command dispatcher that pages through an API
//! catalog and streams language-model answers about it, plus the catalog and
//! completion clients it runs against.

pub mod adapters;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod ui;

pub use error::{Error, Result};
