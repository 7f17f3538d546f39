//! Catalog lifecycle integration tests.
//!
//! These tests run the real HTTP gateway against an in-process catalog
//! server and verify caching, search patching and error handling end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use bookshelf_core::{
    AppContext, CachePartition, Config, DisplayMode, FilterUpdate, HttpGateway, ManualClock,
    MemoryStorage, PreferencesConfig, RequestKey,
};

/// Fake catalog backend with request counters.
#[derive(Default)]
struct Backend {
    books: Mutex<Vec<Value>>,
    requests: Mutex<HashMap<&'static str, usize>>,
    failing: AtomicUsize,
}

impl Backend {
    fn hit(&self, endpoint: &'static str) {
        *self.requests.lock().unwrap().entry(endpoint).or_default() += 1;
    }

    fn count(&self, endpoint: &'static str) -> usize {
        self.requests.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    /// Fail the next `n` requests with a 500 and a JSON error body.
    fn fail_next(&self, n: usize) {
        self.failing.store(n, Ordering::SeqCst);
    }

    fn take_failure(&self) -> Option<Response> {
        let failing = self.failing.load(Ordering::SeqCst);
        if failing == 0 {
            return None;
        }
        self.failing.store(failing - 1, Ordering::SeqCst);
        Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": 500, "error": "Catalog database unavailable" })),
            )
                .into_response(),
        )
    }
}

async fn all_books(State(backend): State<Arc<Backend>>) -> Response {
    backend.hit("books");
    if let Some(failure) = backend.take_failure() {
        return failure;
    }
    Json(Value::Array(backend.books.lock().unwrap().clone())).into_response()
}

async fn top_books(State(backend): State<Arc<Backend>>) -> Response {
    backend.hit("top");
    let mut books = backend.books.lock().unwrap().clone();
    books.sort_by_key(|b| std::cmp::Reverse(b["searchCount"].as_u64().unwrap_or(0)));
    books.truncate(5);
    Json(Value::Array(books)).into_response()
}

async fn books_by_language(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    backend.hit("language");
    let lang = params.get("lang").cloned().unwrap_or_default();
    let books: Vec<Value> = backend
        .books
        .lock()
        .unwrap()
        .iter()
        .filter(|b| b["language"].as_str() == Some(lang.as_str()))
        .cloned()
        .collect();
    Json(Value::Array(books)).into_response()
}

/// Finds a book by title, bumps its search count, and stores new titles.
async fn search_book(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    backend.hit("search");
    let title = params.get("title").cloned().unwrap_or_default();
    let mut books = backend.books.lock().unwrap();

    if let Some(book) = books.iter_mut().find(|b| {
        b["title"]
            .as_str()
            .is_some_and(|t| t.to_lowercase().contains(&title.to_lowercase()))
    }) {
        let count = book["searchCount"].as_u64().unwrap_or(0) + 1;
        book["searchCount"] = json!(count);
        return Json(book.clone()).into_response();
    }

    if title == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": 404, "error": "No se encontró el libro" })),
        )
            .into_response();
    }

    let book = json!({
        "id": 100 + books.len(),
        "title": title,
        "language": "en",
        "searchCount": 1,
        "author": null
    });
    books.push(book.clone());
    Json(book).into_response()
}

struct TestHarness {
    backend: Arc<Backend>,
    context: AppContext<HttpGateway>,
    clock: ManualClock,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let backend = Arc::new(Backend::default());
        *backend.books.lock().unwrap() = vec![
            json!({ "id": 1, "title": "Dune", "language": "en", "searchCount": 5,
                    "author": { "id": 10, "name": "Frank Herbert" } }),
            json!({ "id": 2, "title": "1984", "language": "en", "searchCount": 9,
                    "author": { "id": 11, "name": "George Orwell" } }),
            json!({ "id": 3, "title": "Don Quijote", "language": "es", "searchCount": 2,
                    "author": { "id": 12, "name": "Miguel de Cervantes" } }),
        ];

        let router = Router::new()
            .route("/api/books", get(all_books))
            .route("/api/books/top", get(top_books))
            .route("/api/books/language", get(books_by_language))
            .route("/api/books/search", get(search_book))
            .with_state(Arc::clone(&backend));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config {
            preferences: PreferencesConfig {
                path: temp_dir.path().join("prefs.json"),
            },
            ..Default::default()
        };
        config.api.base_url = format!("http://{}/api", addr);
        config.api.timeout_secs = 5;

        let clock = ManualClock::default();
        let gateway = Arc::new(HttpGateway::new(&config.api).expect("Failed to create gateway"));
        let context = AppContext::from_parts(
            config,
            gateway,
            Arc::new(clock.clone()),
            Box::new(MemoryStorage::new()),
            Some(DisplayMode::Dark),
        );

        Self {
            backend,
            context,
            clock,
            _temp_dir: temp_dir,
        }
    }
}

fn titles(items: &[bookshelf_core::CatalogItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

#[tokio::test]
async fn test_load_all_twice_within_ttl_hits_network_once() {
    let harness = TestHarness::new().await;
    let collection = harness.context.collection();

    let first = collection.load_all(false).await;
    let second = collection.load_all(false).await;

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(harness.backend.count("books"), 1);

    collection.load_all(true).await;
    assert_eq!(harness.backend.count("books"), 2);

    harness.clock.advance(Duration::from_secs(5 * 60));
    collection.load_all(false).await;
    assert_eq!(harness.backend.count("books"), 3);
}

#[tokio::test]
async fn test_search_patches_list_and_invalidates_lists() {
    let harness = TestHarness::new().await;
    let collection = harness.context.collection();
    collection.load_all(false).await;
    collection.load_top(false).await;
    collection.load_by_language("es").await;

    // Existing item: replaced in place with the bumped search count.
    let hit = collection.search("quijote").await.unwrap();
    assert_eq!(hit[0].search_count, 3);
    let items = collection.items().await;
    assert_eq!(titles(&items), vec!["Dune", "1984", "Don Quijote"]);
    assert_eq!(items[2].search_count, 3);

    // New item: prepended.
    collection.search("Emma").await.unwrap();
    assert_eq!(
        titles(&collection.items().await),
        vec!["Emma", "Dune", "1984", "Don Quijote"]
    );
    assert_eq!(
        collection.selection().await.map(|i| i.title),
        Some("Emma".to_string())
    );

    assert!(!collection.is_cached(CachePartition::AllItems, None).await);
    assert!(!collection.is_cached(CachePartition::TopItems, None).await);
    assert!(collection.is_cached(CachePartition::Languages, Some("es")).await);

    collection.load_all(false).await;
    collection.load_by_language("es").await;
    assert_eq!(harness.backend.count("books"), 2);
    assert_eq!(harness.backend.count("language"), 1);
}

#[tokio::test]
async fn test_blank_search_makes_no_request() {
    let harness = TestHarness::new().await;

    let result = harness.context.collection().search("  ").await.unwrap();

    assert!(result.is_empty());
    assert_eq!(harness.backend.count("search"), 0);
}

#[tokio::test]
async fn test_search_not_found_surfaces_server_message() {
    let harness = TestHarness::new().await;

    let err = harness
        .context
        .collection()
        .search("missing")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "No se encontró el libro");
    assert_eq!(
        harness.context.gateway().error_for(&RequestKey::SearchItem).as_deref(),
        Some("No se encontró el libro")
    );
}

#[tokio::test]
async fn test_server_error_degrades_to_empty_and_keeps_list() {
    let harness = TestHarness::new().await;
    let collection = harness.context.collection();
    collection.load_all(false).await;

    harness.backend.fail_next(1);
    let result = collection.load_all(true).await;

    assert!(result.is_empty());
    assert_eq!(collection.items().await.len(), 3);
    assert_eq!(
        harness.context.gateway().error_for(&RequestKey::AllItems).as_deref(),
        Some("Catalog database unavailable")
    );
    assert!(!harness.context.gateway().is_loading());
}

#[tokio::test]
async fn test_filters_and_statistics_over_loaded_items() {
    let harness = TestHarness::new().await;
    let collection = harness.context.collection();
    collection.load_all(false).await;

    collection
        .set_filter(FilterUpdate::Language(Some("ES".to_string())))
        .await;
    assert_eq!(titles(&collection.filtered().await), vec!["Don Quijote"]);

    collection.clear_filters().await;
    collection
        .set_filter(FilterUpdate::SearchTerm(Some("orwell".to_string())))
        .await;
    assert_eq!(titles(&collection.filtered().await), vec!["1984"]);

    let stats = collection.statistics().await;
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.total_languages, 2);
    assert_eq!(stats.total_searches, 16);
    assert_eq!(
        stats.contributors,
        vec!["Frank Herbert", "George Orwell", "Miguel de Cervantes"]
    );
}

#[tokio::test]
async fn test_preferences_follow_environment_then_user() {
    let harness = TestHarness::new().await;
    let preferences = harness.context.preferences();

    assert!(preferences.is_dark());
    assert_eq!(preferences.toggle().unwrap(), DisplayMode::Light);
    assert!(!preferences.on_environment_change(DisplayMode::Dark));
    assert!(preferences.is_light());
}
