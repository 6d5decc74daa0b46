//! Command dispatcher - turns a chat request into a streamed answer

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::llm::{CompletionClient, CompletionOptions, Message};
use crate::Result;

use super::command::{ChatRequest, Command, DispatchResult};
use super::pagination::PaginationState;
use super::prompts::{render_page, substitute, template_for};
use super::relay::{relay, ProgressSink};

const QUERYING_NOTICE: &str = "`>` Querying data from Azure API Center...\n\n";
const NO_MORE_NOTICE: &str = "`>` There are no more API Specifications.\n\n";
const PARSING_NOTICE: &str = "`>` Parsing API Specifications...\n\n";
const LIST_REQUEST: &str = "What APIs are available for me to use in Azure API Center?";

/// Dispatches slash commands against a catalog and a completion client.
pub struct Dispatcher<K: Catalog, C: CompletionClient> {
    catalog: K,
    client: C,
    options: CompletionOptions,
}

impl<K: Catalog, C: CompletionClient> Dispatcher<K, C> {
    pub fn new(catalog: K, client: C) -> Self {
        Self {
            catalog,
            client,
            options: CompletionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &K {
        &self.catalog
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Handle one chat request.
    ///
    /// `state` is the pagination state of the requesting conversation. The
    /// cancellation token is handed to the completion client untouched.
    /// Catalog and completion errors are returned as they are.
    pub async fn dispatch(
        &self,
        request: &ChatRequest,
        state: &mut PaginationState,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult> {
        let Some(command) = request.command.clone() else {
            debug!("No slash command, nothing to dispatch");
            return Ok(DispatchResult::terminal());
        };

        info!("Dispatching {} ({} chars of prompt)", command, request.prompt.len());

        if command.is_paginated() {
            return self.dispatch_paged(command, request, state, sink, cancel).await;
        }

        match command {
            Command::Describe => self.describe(&request.prompt, sink, cancel).await,
            Command::Generate => {
                info!("/generate is not implemented yet");
                Ok(DispatchResult::terminal())
            }
            other => {
                debug!("Ignoring unknown command {}", other);
                Ok(DispatchResult::terminal())
            }
        }
    }

    async fn dispatch_paged(
        &self,
        command: Command,
        request: &ChatRequest,
        state: &mut PaginationState,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult> {
        if request.is_continuation() {
            state.advance();
            debug!("Continuing {} at offset {}", command, state.offset());
        } else {
            sink.report(QUERYING_NOTICE);
            let records = self.catalog.fetch_all_specifications().await?;
            info!("Catalog returned {} specifications", records.len());

            let query = (command == Command::Find).then_some(request.prompt.as_str());
            state.restart(records, query);
        }

        let page = state.current_page();
        if page.is_empty() {
            sink.report(NO_MORE_NOTICE);
            return Ok(DispatchResult::terminal());
        }

        let Some(template) = template_for(&command) else {
            return Ok(DispatchResult::terminal());
        };
        let system = substitute(template, &render_page(page));

        let user = if command == Command::Find {
            let query = state.last_query();
            sink.report(&format!("`>` Parsing API Specifications for '{query}'...\n\n"));
            format!("Find an API for '{query}' from the provided list in the system prompt.")
        } else {
            sink.report(PARSING_NOTICE);
            LIST_REQUEST.to_string()
        };

        self.complete(vec![Message::system(system), Message::user(user)], sink, cancel)
            .await?;

        Ok(DispatchResult::of(command))
    }

    async fn describe(
        &self,
        specification: &str,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult> {
        if let Some(template) = template_for(&Command::Describe) {
            let messages = vec![
                Message::system(template),
                Message::user(format!(
                    "Describe an API using the following specification: {specification}"
                )),
            ];
            self.complete(messages, sink, cancel).await?;
        }

        Ok(DispatchResult::terminal())
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let stream = self.client.stream(&messages, &self.options, cancel).await?;
        let relayed = relay(stream, sink).await?;

        if cancel.is_cancelled() {
            info!("Completion cancelled after {} fragments", relayed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::error::Error;
    use crate::llm::{FakeCompletionClient, Role};

    const ANSWER: [&str; 3] = ["Here are ", "your APIs.", "[RESPONSE END]"];

    type TestDispatcher = Dispatcher<StaticCatalog, FakeCompletionClient>;

    fn dispatcher(specs: usize) -> TestDispatcher {
        Dispatcher::new(
            StaticCatalog::numbered(specs),
            FakeCompletionClient::new(ANSWER.to_vec()),
        )
    }

    async fn run(
        dispatcher: &TestDispatcher,
        line: &str,
        state: &mut PaginationState,
    ) -> (DispatchResult, Vec<String>) {
        let mut sink: Vec<String> = Vec::new();
        let result = dispatcher
            .dispatch(
                &ChatRequest::parse(line),
                state,
                &mut sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        (result, sink)
    }

    fn last_system_prompt(dispatcher: &TestDispatcher) -> String {
        let calls = dispatcher.client().calls();
        let messages = calls.last().unwrap();
        assert_eq!(messages[0].role, Role::System);
        messages[0].content.clone()
    }

    fn last_user_prompt(dispatcher: &TestDispatcher) -> String {
        let calls = dispatcher.client().calls();
        let messages = calls.last().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
        messages[1].content.clone()
    }

    #[tokio::test]
    async fn test_list_pages_through_catalog() {
        let dispatcher = dispatcher(7);
        let mut state = PaginationState::new();

        let (result, sink) = run(&dispatcher, "/list", &mut state).await;
        assert_eq!(result, DispatchResult::of(Command::List));
        assert_eq!(result.followup().unwrap().message, "/list $more");
        assert_eq!(
            sink,
            vec![QUERYING_NOTICE, PARSING_NOTICE, "Here are ", "your APIs.", ""]
        );
        let system = last_system_prompt(&dispatcher);
        assert!(system.contains("## Spec 1:\nopenapi: spec-1\n\n## Spec 2:\nopenapi: spec-2"));
        assert!(system.contains("## Spec 3:\nopenapi: spec-3"));
        assert!(!system.contains("spec-4"));
        assert!(!system.contains("<SPECIFICATIONS>"));
        assert_eq!(last_user_prompt(&dispatcher), LIST_REQUEST);

        let (result, sink) = run(&dispatcher, "/list $more", &mut state).await;
        assert_eq!(result.command, Some(Command::List));
        assert_eq!(sink[0], PARSING_NOTICE);
        assert_eq!(state.offset(), 3);
        let system = last_system_prompt(&dispatcher);
        assert!(system.contains("## Spec 1:\nopenapi: spec-4"));
        assert!(system.contains("## Spec 3:\nopenapi: spec-6"));
        assert!(!system.contains("spec-3\n"));

        let (result, _) = run(&dispatcher, "/list $more", &mut state).await;
        assert_eq!(result.command, Some(Command::List));
        let system = last_system_prompt(&dispatcher);
        assert!(system.contains("## Spec 1:\nopenapi: spec-7"));
        assert!(!system.contains("## Spec 2:"));

        let (result, sink) = run(&dispatcher, "/list $more", &mut state).await;
        assert_eq!(result, DispatchResult::terminal());
        assert!(result.followup().is_none());
        assert_eq!(sink, vec![NO_MORE_NOTICE]);

        assert_eq!(dispatcher.catalog().fetch_count(), 1);
        assert_eq!(dispatcher.client().call_count(), 3);
    }

    #[tokio::test]
    async fn test_fresh_list_resets_offset() {
        let dispatcher = dispatcher(7);
        let mut state = PaginationState::new();

        run(&dispatcher, "/list", &mut state).await;
        run(&dispatcher, "/list $more", &mut state).await;
        assert_eq!(state.offset(), 3);

        run(&dispatcher, "/list", &mut state).await;
        assert_eq!(state.offset(), 0);
        assert_eq!(dispatcher.catalog().fetch_count(), 2);
        assert!(last_system_prompt(&dispatcher).contains("openapi: spec-1"));
    }

    #[tokio::test]
    async fn test_find_reuses_query_on_continuation() {
        let dispatcher = dispatcher(5);
        let mut state = PaginationState::new();

        let (result, sink) = run(&dispatcher, "/find payments", &mut state).await;
        assert_eq!(result.command, Some(Command::Find));
        assert_eq!(result.followup().unwrap().message, "/find $more");
        assert_eq!(sink[1], "`>` Parsing API Specifications for 'payments'...\n\n");
        assert_eq!(
            last_user_prompt(&dispatcher),
            "Find an API for 'payments' from the provided list in the system prompt."
        );

        let (result, sink) = run(&dispatcher, "/find $more", &mut state).await;
        assert_eq!(result.command, Some(Command::Find));
        assert_eq!(sink[0], "`>` Parsing API Specifications for 'payments'...\n\n");
        assert_eq!(
            last_user_prompt(&dispatcher),
            "Find an API for 'payments' from the provided list in the system prompt."
        );
        assert_eq!(state.last_query(), "payments");
        assert!(last_system_prompt(&dispatcher).contains("## Spec 1:\nopenapi: spec-4"));
        assert_eq!(dispatcher.catalog().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_terminal_without_completion() {
        let dispatcher = dispatcher(0);
        let mut state = PaginationState::new();

        let (result, sink) = run(&dispatcher, "/find anything", &mut state).await;

        assert_eq!(result, DispatchResult::terminal());
        assert_eq!(sink, vec![QUERYING_NOTICE, NO_MORE_NOTICE]);
        assert_eq!(dispatcher.client().call_count(), 0);
    }

    #[tokio::test]
    async fn test_continuation_before_any_fetch() {
        let dispatcher = dispatcher(7);
        let mut state = PaginationState::new();

        let (result, sink) = run(&dispatcher, "/list $more", &mut state).await;

        assert_eq!(result, DispatchResult::terminal());
        assert_eq!(sink, vec![NO_MORE_NOTICE]);
        assert_eq!(dispatcher.catalog().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_describe_leaves_pagination_alone() {
        let dispatcher = dispatcher(7);
        let mut state = PaginationState::new();
        run(&dispatcher, "/find orders", &mut state).await;
        run(&dispatcher, "/find $more", &mut state).await;

        let line = "/describe openapi: 3.0.0 petstore";
        let (result, sink) = run(&dispatcher, line, &mut state).await;

        assert_eq!(result, DispatchResult::terminal());
        assert!(result.followup().is_none());
        assert_eq!(sink, vec!["Here are ", "your APIs.", ""]);
        assert_eq!(state.offset(), 3);
        assert_eq!(state.last_query(), "orders");
        assert_eq!(state.cached_results().len(), 7);
        assert_eq!(dispatcher.catalog().fetch_count(), 1);
        assert_eq!(
            last_user_prompt(&dispatcher),
            "Describe an API using the following specification: openapi: 3.0.0 petstore"
        );
        assert!(!last_system_prompt(&dispatcher).contains("## Spec"));
    }

    #[tokio::test]
    async fn test_generate_and_unknown_commands_are_noops() {
        let dispatcher = dispatcher(7);
        let mut state = PaginationState::new();

        for line in ["/generate a client", "/help", "just chatting"] {
            let (result, sink) = run(&dispatcher, line, &mut state).await;
            assert_eq!(result, DispatchResult::terminal(), "{line}");
            assert!(sink.is_empty(), "{line}");
        }

        assert_eq!(dispatcher.catalog().fetch_count(), 0);
        assert_eq!(dispatcher.client().call_count(), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_propagates() {
        let dispatcher = Dispatcher::new(
            StaticCatalog::failing(),
            FakeCompletionClient::new(vec!["x"]),
        );
        let mut state = PaginationState::new();
        let mut sink: Vec<String> = Vec::new();

        let err = dispatcher
            .dispatch(
                &ChatRequest::parse("/list"),
                &mut state,
                &mut sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Catalog(_)));
        assert_eq!(sink, vec![QUERYING_NOTICE]);
        assert_eq!(dispatcher.client().call_count(), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let dispatcher = Dispatcher::new(
            StaticCatalog::numbered(2),
            FakeCompletionClient::failing("quota exceeded"),
        );
        let mut state = PaginationState::new();
        let mut sink: Vec<String> = Vec::new();

        let err = dispatcher
            .dispatch(
                &ChatRequest::parse("/list"),
                &mut state,
                &mut sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Completion(ref m) if m == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_relayed_fragments() {
        let dispatcher = Dispatcher::new(
            StaticCatalog::numbered(2),
            FakeCompletionClient::scripted(vec![
                Ok("first".to_string()),
                Err("stream reset".to_string()),
                Ok("lost".to_string()),
            ]),
        );
        let mut state = PaginationState::new();
        let mut sink: Vec<String> = Vec::new();

        let result = dispatcher
            .dispatch(
                &ChatRequest::parse("/describe x"),
                &mut state,
                &mut sink,
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(Error::Completion(_))));
        assert_eq!(sink, vec!["first"]);
    }

    /// Cancels the token on the first fragment it receives.
    struct CancellingSink {
        token: CancellationToken,
        received: Vec<String>,
    }

    impl ProgressSink for CancellingSink {
        fn report(&mut self, fragment: &str) {
            self.received.push(fragment.to_string());
            self.token.cancel();
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_relay() {
        let dispatcher = Dispatcher::new(
            StaticCatalog::numbered(1),
            FakeCompletionClient::new(vec!["a", "b", "c"]),
        );
        let cancel = CancellationToken::new();
        let mut sink = CancellingSink {
            token: cancel.clone(),
            received: Vec::new(),
        };
        let mut state = PaginationState::new();

        let result = dispatcher
            .dispatch(&ChatRequest::parse("/describe x"), &mut state, &mut sink, &cancel)
            .await
            .unwrap();

        assert_eq!(result, DispatchResult::terminal());
        assert_eq!(sink.received, vec!["a"]);
    }

    #[tokio::test]
    async fn test_marker_stripped_once_per_fragment() {
        let dispatcher = Dispatcher::new(
            StaticCatalog::numbered(1),
            FakeCompletionClient::new(vec!["end[RESPONSE END] and [RESPONSE END]"]),
        );
        let mut state = PaginationState::new();

        let (_, sink) = run(&dispatcher, "/describe x", &mut state).await;

        assert_eq!(sink, vec!["end and [RESPONSE END]"]);
    }
}
