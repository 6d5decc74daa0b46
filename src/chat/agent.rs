//! Chat agent - routes chat turns to the dispatcher per conversation

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::Catalog;
use crate::llm::CompletionClient;
use crate::Result;

use super::command::{ChatRequest, DispatchResult};
use super::dispatcher::Dispatcher;
use super::pagination::SessionStore;
use super::relay::ProgressSink;

/// Owns the dispatcher and the pagination state of every conversation.
pub struct ChatAgent<K: Catalog, C: CompletionClient> {
    dispatcher: Dispatcher<K, C>,
    sessions: SessionStore,
}

impl<K: Catalog, C: CompletionClient> ChatAgent<K, C> {
    pub fn new(dispatcher: Dispatcher<K, C>) -> Self {
        Self {
            dispatcher,
            sessions: SessionStore::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<K, C> {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one chat turn of conversation `session`.
    ///
    /// The conversation's state stays locked until the turn completes, so a
    /// second turn of the same conversation waits for the first.
    pub async fn handle(
        &self,
        session: &str,
        request: &ChatRequest,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult> {
        let state = self.sessions.session(session).await;
        let mut state = state.lock().await;
        debug!("Handling turn for session {}", session);

        let result = self.dispatcher.dispatch(request, &mut state, sink, cancel).await?;
        debug!(
            "Session {} turn finished (followup command: {:?})",
            session,
            result.command_name()
        );
        Ok(result)
    }
}
