//! CLI adapter — interactive and single-command terminal host.
//!
//! Reads slash-command lines, streams the answer to stdout as it arrives,
//! and prints the follow-up suggestion for the turn.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::catalog::Catalog;
use crate::chat::{
    ChatAgent, ChatRequest, DispatchResult, Followup, ProgressSink, SLASH_COMMANDS,
};
use crate::llm::CompletionClient;
use crate::ui;
use crate::Result;

/// Writes fragments straight to stdout.
pub struct StdoutSink;

impl ProgressSink for StdoutSink {
    fn report(&mut self, fragment: &str) {
        let mut stdout = io::stdout();
        if write!(stdout, "{fragment}").and_then(|_| stdout.flush()).is_err() {
            warn!("Failed to write fragment to stdout");
        }
    }
}

/// Token of the turn in flight, shared with the Ctrl+C handler.
pub type InterruptHandle = Arc<Mutex<Option<CancellationToken>>>;

/// CLI channel for one conversation.
pub struct CliChannel<K: Catalog, C: CompletionClient> {
    agent: ChatAgent<K, C>,
    session: String,
    in_flight: InterruptHandle,
    offer_followups: bool,
}

impl<K: Catalog, C: CompletionClient> CliChannel<K, C> {
    /// Create a new CLI channel.
    pub fn new(agent: ChatAgent<K, C>, session: impl Into<String>) -> Self {
        Self {
            agent,
            session: session.into(),
            in_flight: Arc::new(Mutex::new(None)),
            offer_followups: true,
        }
    }

    /// Channel for a single command per process.
    ///
    /// Pagination state does not outlive the process, so `$more` follow-ups
    /// are not offered.
    pub fn single_shot(mut self) -> Self {
        self.offer_followups = false;
        self
    }

    /// Follow-up to print after `result`, if this channel offers one.
    pub fn followup(&self, result: &DispatchResult) -> Option<Followup> {
        if self.offer_followups {
            result.followup()
        } else {
            None
        }
    }

    /// Handle for cancelling the turn in flight, if any.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.in_flight.clone()
    }

    /// Run a single input line and print the streamed answer.
    pub async fn run_once(&self, line: &str) -> Result<DispatchResult> {
        let request = ChatRequest::parse(line);
        if request.command.is_none() {
            ui::print_warning(
                "Start your message with a slash command, e.g. /list or /find payments",
            );
            return Ok(DispatchResult::terminal());
        }

        let cancel = CancellationToken::new();
        self.set_in_flight(Some(cancel.clone()));

        let result = self
            .agent
            .handle(&self.session, &request, &mut StdoutSink, &cancel)
            .await;

        self.set_in_flight(None);
        println!();

        let result = result?;
        if cancel.is_cancelled() {
            ui::print_warning("Cancelled");
        } else if let Some(followup) = self.followup(&result) {
            ui::print_followup(&followup);
        }

        Ok(result)
    }

    /// Run interactive REPL loop.
    pub async fn run_interactive(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        ui::print_commands(SLASH_COMMANDS);

        loop {
            print!("\n> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
                println!("Goodbye! 👋");
                break;
            }

            if let Err(e) = self.run_once(input).await {
                ui::print_error(&e.to_string());
            }
        }

        Ok(())
    }

    fn set_in_flight(&self, token: Option<CancellationToken>) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            *in_flight = token;
        }
    }
}

/// Cancel the turn in flight. Returns false when nothing was running.
pub fn interrupt(handle: &InterruptHandle) -> bool {
    match handle.lock() {
        Ok(in_flight) => match in_flight.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        },
        Err(_) => false,
    }
}
