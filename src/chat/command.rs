//! Slash commands, chat requests, and follow-up suggestions

use std::fmt;

/// Prompt text that asks `list`/`find` for the next page instead of a new query.
pub const CONTINUATION: &str = "$more";

/// A slash command recognised by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    List,
    Find,
    Describe,
    /// Reserved for API client generation; recognised but does nothing yet.
    Generate,
    Other(String),
}

impl Command {
    /// Parse a command name, with or without its leading slash.
    pub fn parse(name: &str) -> Self {
        match name.trim_start_matches('/') {
            "list" => Command::List,
            "find" => Command::Find,
            "describe" => Command::Describe,
            "generate" => Command::Generate,
            other => Command::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::List => "list",
            Command::Find => "find",
            Command::Describe => "describe",
            Command::Generate => "generate",
            Command::Other(name) => name,
        }
    }

    /// Whether the command pages through the catalog.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Command::List | Command::Find)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Metadata for a slash command offered to the user.
#[derive(Debug, Clone, Copy)]
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
}

/// Commands advertised to the host.
pub const SLASH_COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "list",
        description: "List available APIs.",
    },
    SlashCommand {
        name: "find",
        description: "Find an API given a search query.",
    },
    SlashCommand {
        name: "describe",
        description: "Describe an API.",
    },
];

/// One chat turn: an optional slash command and the free text after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub command: Option<Command>,
    pub prompt: String,
}

impl ChatRequest {
    pub fn new(command: Option<Command>, prompt: impl Into<String>) -> Self {
        Self {
            command,
            prompt: prompt.into(),
        }
    }

    /// Parse an input line such as `/find payments` or `/list $more`.
    ///
    /// Lines that do not start with `/` carry no command.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if !line.starts_with('/') {
            return Self::new(None, line);
        }

        let (name, prompt) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        Self::new(Some(Command::parse(name)), prompt)
    }

    /// Whether this request asks for the next page of the previous results.
    pub fn is_continuation(&self) -> bool {
        self.prompt == CONTINUATION
    }
}

/// Outcome of a dispatch, used only to pick a follow-up.
///
/// `command: None` means there is nothing to follow up on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchResult {
    pub command: Option<Command>,
}

impl DispatchResult {
    pub fn terminal() -> Self {
        Self { command: None }
    }

    pub fn of(command: Command) -> Self {
        Self {
            command: Some(command),
        }
    }

    /// Command name, or `""` for a terminal result.
    pub fn command_name(&self) -> &str {
        self.command.as_ref().map(Command::name).unwrap_or("")
    }

    /// The suggested next input for this result.
    pub fn followup(&self) -> Option<Followup> {
        match self.command {
            Some(Command::List) => Some(Followup {
                message: "/list $more",
                title: "List more APIs",
            }),
            Some(Command::Find) => Some(Followup {
                message: "/find $more",
                title: "Find in more APIs",
            }),
            _ => None,
        }
    }
}

/// A suggested next input offered after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Followup {
    pub message: &'static str,
    pub title: &'static str,
}
