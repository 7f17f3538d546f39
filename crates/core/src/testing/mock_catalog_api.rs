//! Mock catalog API for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::{CatalogItem, Contributor};
use crate::gateway::{CatalogApi, GatewayError};

/// Items returned by `top_items` when no explicit list is set.
const DEFAULT_TOP_COUNT: usize = 5;

/// A recorded API call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    SearchItem { title: String },
    AllItems,
    ItemsByLanguage { language: String },
    TopItems,
    AllContributors,
    ContributorsAlive { year: i32 },
}

impl RecordedCall {
    /// Name of the trait method that produced this call.
    pub fn method(&self) -> &'static str {
        match self {
            RecordedCall::SearchItem { .. } => "search_item",
            RecordedCall::AllItems => "all_items",
            RecordedCall::ItemsByLanguage { .. } => "items_by_language",
            RecordedCall::TopItems => "top_items",
            RecordedCall::AllContributors => "all_contributors",
            RecordedCall::ContributorsAlive { .. } => "contributors_alive_in",
        }
    }
}

/// Mock implementation of the CatalogApi trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable items and contributors
/// - Track calls for assertions
/// - Simulate failures and slow responses
///
/// Responses are snapshotted when the call is made, before any configured
/// delay, so a delayed call returns the data that was current when it
/// started.
#[derive(Debug, Default)]
pub struct MockCatalogApi {
    /// Backing list for `all_items`, `items_by_language` and search.
    items: Arc<RwLock<Vec<CatalogItem>>>,
    /// Explicit top list. Falls back to the most searched items.
    top_items: Arc<RwLock<Option<Vec<CatalogItem>>>>,
    /// Explicit search hit. Falls back to a title match in `items`.
    search_result: Arc<RwLock<Option<CatalogItem>>>,
    contributors: Arc<RwLock<Vec<Contributor>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<GatewayError>>>,
    /// If set, the next call will wait this long before answering.
    next_delay: Arc<RwLock<Option<Duration>>>,
}

impl MockCatalogApi {
    /// Create a new empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub async fn set_items(&self, items: Vec<CatalogItem>) {
        *self.items.write().await = items;
    }

    pub async fn set_top_items(&self, items: Vec<CatalogItem>) {
        *self.top_items.write().await = Some(items);
    }

    pub async fn set_search_result(&self, item: CatalogItem) {
        *self.search_result.write().await = Some(item);
    }

    pub async fn set_contributors(&self, contributors: Vec<Contributor>) {
        *self.contributors.write().await = contributors;
    }

    /// Make the next call fail with a 500 carrying `message`.
    pub async fn fail_next(&self, message: &str) {
        self.set_next_error(GatewayError::Status {
            status: 500,
            message: message.to_string(),
        })
        .await;
    }

    pub async fn set_next_error(&self, error: GatewayError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make the next call take `delay` before answering.
    pub async fn delay_next(&self, delay: Duration) {
        *self.next_delay.write().await = Some(delay);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Number of calls to the trait method named `method`.
    pub async fn call_count(&self, method: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.method() == method)
            .count()
    }

    pub async fn total_calls(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Record the call and take any configured delay and error.
    async fn begin(&self, call: RecordedCall) -> (Option<Duration>, Option<GatewayError>) {
        self.calls.write().await.push(call);
        let delay = self.next_delay.write().await.take();
        let error = self.next_error.write().await.take();
        (delay, error)
    }

    async fn respond<T>(
        &self,
        call: RecordedCall,
        snapshot: impl std::future::Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        let (delay, error) = self.begin(call).await;
        let result = match error {
            Some(error) => Err(error),
            None => snapshot.await,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn search_item(&self, title: &str) -> Result<CatalogItem, GatewayError> {
        let call = RecordedCall::SearchItem {
            title: title.to_string(),
        };
        self.respond(call, async {
            if let Some(item) = self.search_result.read().await.clone() {
                return Ok(item);
            }
            let needle = title.to_lowercase();
            self.items
                .read()
                .await
                .iter()
                .find(|i| i.title.to_lowercase().contains(&needle))
                .cloned()
                .ok_or_else(|| GatewayError::Status {
                    status: 404,
                    message: format!("No book found for '{}'", title),
                })
        })
        .await
    }

    async fn all_items(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        self.respond(RecordedCall::AllItems, async {
            Ok(self.items.read().await.clone())
        })
        .await
    }

    async fn items_by_language(&self, language: &str) -> Result<Vec<CatalogItem>, GatewayError> {
        let call = RecordedCall::ItemsByLanguage {
            language: language.to_string(),
        };
        self.respond(call, async {
            Ok(self
                .items
                .read()
                .await
                .iter()
                .filter(|i| {
                    i.language
                        .as_deref()
                        .is_some_and(|l| l.eq_ignore_ascii_case(language))
                })
                .cloned()
                .collect())
        })
        .await
    }

    async fn top_items(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        self.respond(RecordedCall::TopItems, async {
            if let Some(top) = self.top_items.read().await.clone() {
                return Ok(top);
            }
            let mut items = self.items.read().await.clone();
            items.sort_by(|a, b| b.search_count.cmp(&a.search_count));
            items.truncate(DEFAULT_TOP_COUNT);
            Ok(items)
        })
        .await
    }

    async fn all_contributors(&self) -> Result<Vec<Contributor>, GatewayError> {
        self.respond(RecordedCall::AllContributors, async {
            Ok(self.contributors.read().await.clone())
        })
        .await
    }

    async fn contributors_alive_in(&self, year: i32) -> Result<Vec<Contributor>, GatewayError> {
        self.respond(RecordedCall::ContributorsAlive { year }, async {
            Ok(self
                .contributors
                .read()
                .await
                .iter()
                .filter(|c| c.is_alive_in(year))
                .cloned()
                .collect())
        })
        .await
    }
}
