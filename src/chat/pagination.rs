//! Pagination over the last catalog fetch, scoped per conversation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::SpecificationRecord;

/// Number of specifications shown per page.
pub const PAGE_SIZE: usize = 3;

/// Browsing position within the cached catalog results of one conversation.
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    offset: usize,
    last_query: String,
    cached_results: Vec<SpecificationRecord>,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new browsing session over freshly fetched `records`.
    ///
    /// `query` is stored for `find`; `list` passes `None` and keeps the
    /// previous query.
    pub fn restart(&mut self, records: Vec<SpecificationRecord>, query: Option<&str>) {
        self.offset = 0;
        self.cached_results = records;
        if let Some(query) = query {
            self.last_query = query.to_string();
        }
    }

    /// Move to the next page, keeping the cached results.
    pub fn advance(&mut self) {
        self.offset = self.offset.saturating_add(PAGE_SIZE);
    }

    /// Records of the current page; empty once past the end.
    pub fn current_page(&self) -> &[SpecificationRecord] {
        let len = self.cached_results.len();
        let start = self.offset.min(len);
        let end = self.offset.saturating_add(PAGE_SIZE).min(len);
        &self.cached_results[start..end]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    pub fn cached_results(&self) -> &[SpecificationRecord] {
        &self.cached_results
    }
}

/// Pagination state per conversation key.
///
/// Each conversation gets its own lock, so dispatches within one
/// conversation run one at a time while different conversations proceed
/// independently.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<PaginationState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `key`, created empty on first use.
    pub async fn session(&self, key: &str) -> Arc<Mutex<PaginationState>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PaginationState::new())))
            .clone()
    }

    /// Forget the state of `key`. Returns whether it existed.
    pub async fn reset(&self, key: &str) -> bool {
        self.sessions.lock().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
