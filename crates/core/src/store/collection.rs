use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::criteria::{FilterCriteria, FilterUpdate};
use super::view::{compute_filtered, compute_statistics, Statistics};
use crate::cache::{Clock, TtlCache};
use crate::catalog::CatalogItem;
use crate::config::CacheConfig;
use crate::gateway::{CatalogApi, GatewayError};
use crate::metrics::STALE_RESPONSES_DISCARDED;

const ALL_ITEMS_KEY: &str = "books";
const TOP_ITEMS_KEY: &str = "top_books";
const LANGUAGE_KEY_PREFIX: &str = "lang_";

/// Independently invalidated cache partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePartition {
    AllItems,
    TopItems,
    /// Every per-language partition.
    Languages,
}

/// Issued vs applied request generations for one logical resource.
///
/// A response is applied only if it belongs to a newer request than the last
/// applied one, so the last request wins rather than the last response.
#[derive(Debug, Default, Clone, Copy)]
struct Generation {
    issued: u64,
    applied: u64,
}

impl Generation {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn try_apply(&mut self, generation: u64) -> bool {
        if generation > self.applied {
            self.applied = generation;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct CollectionState {
    items: Vec<CatalogItem>,
    top_items: Vec<CatalogItem>,
    search_results: Vec<CatalogItem>,
    selection: Option<CatalogItem>,
    criteria: FilterCriteria,
    lists: TtlCache<Vec<CatalogItem>>,
    languages: TtlCache<Vec<CatalogItem>>,
    all_generation: Generation,
    top_generation: Generation,
    language_generations: HashMap<String, Generation>,
}

impl CollectionState {
    fn invalidate(&mut self, partitions: &[CachePartition]) {
        for partition in partitions {
            match partition {
                CachePartition::AllItems => {
                    self.lists.invalidate(ALL_ITEMS_KEY);
                }
                CachePartition::TopItems => {
                    self.lists.invalidate(TOP_ITEMS_KEY);
                }
                CachePartition::Languages => {
                    self.languages.invalidate_all(Some(LANGUAGE_KEY_PREFIX));
                }
            }
        }
    }
}

/// Lifetimes for the cached resources.
#[derive(Debug, Clone, Copy)]
struct Lifetimes {
    all_items: Duration,
    top_items: Duration,
    language: Duration,
}

/// Single source of truth for catalog items.
///
/// Owns the authoritative list, the top-items view, the latest search result,
/// the current selection and filter criteria, and the caches in front of the
/// catalog API. Read operations degrade to an empty result when the API
/// fails and leave existing state untouched.
pub struct CollectionStore<A: CatalogApi> {
    api: Arc<A>,
    lifetimes: Lifetimes,
    state: RwLock<CollectionState>,
}

impl<A: CatalogApi> CollectionStore<A> {
    pub fn new(api: Arc<A>, cache: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            lifetimes: Lifetimes {
                all_items: cache.all_items_ttl(),
                top_items: cache.top_items_ttl(),
                language: cache.language_ttl(),
            },
            state: RwLock::new(CollectionState {
                items: Vec::new(),
                top_items: Vec::new(),
                search_results: Vec::new(),
                selection: None,
                criteria: FilterCriteria::default(),
                lists: TtlCache::new("lists", Arc::clone(&clock)),
                languages: TtlCache::new("languages", clock),
                all_generation: Generation::default(),
                top_generation: Generation::default(),
                language_generations: HashMap::new(),
            }),
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the full catalog, from cache when fresh unless `force` is set.
    ///
    /// On success the authoritative list is replaced wholesale. On failure
    /// the error is logged, an empty list is returned and the authoritative
    /// list is left as it was.
    pub async fn load_all(&self, force: bool) -> Vec<CatalogItem> {
        let generation = {
            let mut state = self.state.write().await;
            if !force {
                if let Some(cached) = state.lists.get(ALL_ITEMS_KEY).cloned() {
                    debug!("Serving {} catalog items from cache", cached.len());
                    state.items = cached.clone();
                    return cached;
                }
            }
            state.all_generation.issue()
        };

        match self.api.all_items().await {
            Ok(items) => {
                let mut state = self.state.write().await;
                if !state.all_generation.try_apply(generation) {
                    debug!("Discarding superseded catalog response (generation {})", generation);
                    STALE_RESPONSES_DISCARDED.with_label_values(&["all_items"]).inc();
                    return state.items.clone();
                }
                info!("Loaded {} catalog items", items.len());
                state.items = items.clone();
                state
                    .lists
                    .set(ALL_ITEMS_KEY, items.clone(), self.lifetimes.all_items);
                items
            }
            Err(e) => {
                error!("Error loading catalog items: {}", e);
                Vec::new()
            }
        }
    }

    /// Load the most searched items. Same caching pattern as
    /// [`load_all`](Self::load_all), with its own partition and lifetime.
    pub async fn load_top(&self, force: bool) -> Vec<CatalogItem> {
        let generation = {
            let mut state = self.state.write().await;
            if !force {
                if let Some(cached) = state.lists.get(TOP_ITEMS_KEY).cloned() {
                    debug!("Serving {} top items from cache", cached.len());
                    state.top_items = cached.clone();
                    return cached;
                }
            }
            state.top_generation.issue()
        };

        match self.api.top_items().await {
            Ok(items) => {
                let mut state = self.state.write().await;
                if !state.top_generation.try_apply(generation) {
                    debug!("Discarding superseded top items response (generation {})", generation);
                    STALE_RESPONSES_DISCARDED.with_label_values(&["top_items"]).inc();
                    return state.top_items.clone();
                }
                info!("Loaded {} top items", items.len());
                state.top_items = items.clone();
                state
                    .lists
                    .set(TOP_ITEMS_KEY, items.clone(), self.lifetimes.top_items);
                items
            }
            Err(e) => {
                error!("Error loading top items: {}", e);
                Vec::new()
            }
        }
    }

    /// Load the items of one language. Served from that language's partition
    /// while it is younger than the language lifetime. Does not touch the
    /// authoritative list.
    pub async fn load_by_language(&self, language: &str) -> Vec<CatalogItem> {
        let key = format!("{}{}", LANGUAGE_KEY_PREFIX, language);

        let generation = {
            let mut state = self.state.write().await;
            if let Some(cached) = state.languages.get_within(&key, self.lifetimes.language) {
                debug!("Serving {} items for language '{}' from cache", cached.len(), language);
                return cached.clone();
            }
            state
                .language_generations
                .entry(key.clone())
                .or_default()
                .issue()
        };

        match self.api.items_by_language(language).await {
            Ok(items) => {
                let mut state = self.state.write().await;
                let applied = state
                    .language_generations
                    .entry(key.clone())
                    .or_default()
                    .try_apply(generation);
                if !applied {
                    debug!("Discarding superseded response for language '{}'", language);
                    STALE_RESPONSES_DISCARDED.with_label_values(&["language"]).inc();
                    return state
                        .languages
                        .entry(&key)
                        .map(|e| e.data.clone())
                        .unwrap_or_default();
                }
                info!("Loaded {} items for language '{}'", items.len(), language);
                state.languages.set(key, items.clone(), self.lifetimes.language);
                items
            }
            Err(e) => {
                error!("Error loading items for language '{}': {}", language, e);
                Vec::new()
            }
        }
    }

    /// Search the catalog for the best match of `term`.
    ///
    /// A blank term clears the search results without calling the API. A hit
    /// replaces the item with the same id in place, or is prepended when
    /// new, and becomes both the search result and the selection. The full
    /// and top lists are invalidated since server-side search counts have
    /// changed. Errors clear the search results and are returned to the
    /// caller.
    pub async fn search(&self, term: &str) -> Result<Vec<CatalogItem>, GatewayError> {
        if term.trim().is_empty() {
            self.state.write().await.search_results.clear();
            return Ok(Vec::new());
        }

        match self.api.search_item(term).await {
            Ok(item) => {
                let mut state = self.state.write().await;
                match state.items.iter().position(|i| i.id == item.id) {
                    Some(index) => {
                        debug!("Search hit '{}' updates existing item at {}", item.id, index);
                        state.items[index] = item.clone();
                    }
                    None => {
                        debug!("Search hit '{}' is new, prepending", item.id);
                        state.items.insert(0, item.clone());
                    }
                }
                state.search_results = vec![item.clone()];
                state.selection = Some(item.clone());
                state.invalidate(&[CachePartition::AllItems, CachePartition::TopItems]);
                Ok(vec![item])
            }
            Err(e) => {
                error!("Error searching catalog for '{}': {}", term, e);
                self.state.write().await.search_results.clear();
                Err(e)
            }
        }
    }

    /// Mark cache partitions stale.
    pub async fn invalidate_cache(&self, partitions: &[CachePartition]) {
        self.state.write().await.invalidate(partitions);
    }

    /// Whether a partition currently holds fresh data. For
    /// [`CachePartition::Languages`] this asks about a single language.
    pub async fn is_cached(&self, partition: CachePartition, language: Option<&str>) -> bool {
        let state = self.state.read().await;
        match partition {
            CachePartition::AllItems => state.lists.is_fresh(ALL_ITEMS_KEY),
            CachePartition::TopItems => state.lists.is_fresh(TOP_ITEMS_KEY),
            CachePartition::Languages => language.is_some_and(|l| {
                state.languages.is_fresh(&format!("{}{}", LANGUAGE_KEY_PREFIX, l))
            }),
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// The authoritative list.
    pub async fn items(&self) -> Vec<CatalogItem> {
        self.state.read().await.items.clone()
    }

    pub async fn top_items(&self) -> Vec<CatalogItem> {
        self.state.read().await.top_items.clone()
    }

    pub async fn search_results(&self) -> Vec<CatalogItem> {
        self.state.read().await.search_results.clone()
    }

    /// Authoritative list with the current criteria applied.
    pub async fn filtered(&self) -> Vec<CatalogItem> {
        let state = self.state.read().await;
        compute_filtered(&state.items, &state.criteria)
    }

    pub async fn statistics(&self) -> Statistics {
        compute_statistics(&self.state.read().await.items)
    }

    // =========================================================================
    // Filters and selection
    // =========================================================================

    pub async fn criteria(&self) -> FilterCriteria {
        self.state.read().await.criteria.clone()
    }

    pub async fn set_filter(&self, update: FilterUpdate) {
        self.state.write().await.criteria.apply(update);
    }

    /// Reset to the default criteria.
    pub async fn clear_filters(&self) {
        self.state.write().await.criteria = FilterCriteria::default();
    }

    pub async fn selection(&self) -> Option<CatalogItem> {
        self.state.read().await.selection.clone()
    }

    pub async fn select(&self, item: CatalogItem) {
        self.state.write().await.selection = Some(item);
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.selection = None;
    }
}
