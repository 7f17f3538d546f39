//! Testing utilities and mock implementations.
//!
//! Provides a mock [`CatalogApi`](crate::gateway::CatalogApi) so stores can be
//! exercised without a catalog server.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookshelf_core::testing::{fixtures, MockCatalogApi};
//!
//! let api = Arc::new(MockCatalogApi::new());
//! api.set_items(vec![fixtures::catalog_item("1", "Dune", Some("en"), 3)]).await;
//!
//! let store = CollectionStore::new(api.clone(), &CacheConfig::default(), Arc::new(SystemClock));
//! store.load_all(false).await;
//! assert_eq!(api.call_count("all_items").await, 1);
//! ```

mod mock_catalog_api;

pub use mock_catalog_api::{MockCatalogApi, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{CatalogItem, Contributor};
    use chrono::NaiveDate;

    /// Create a catalog item without a contributor.
    pub fn catalog_item(
        id: &str,
        title: &str,
        language: Option<&str>,
        search_count: u64,
    ) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: title.to_string(),
            first_publish_year: Some(2000),
            language: language.map(str::to_string),
            cover_id: None,
            search_count,
            contributor: None,
        }
    }

    /// Create a catalog item attributed to `author`.
    pub fn item_by(id: &str, title: &str, author: &str, search_count: u64) -> CatalogItem {
        let mut item = catalog_item(id, title, Some("en"), search_count);
        item.contributor = Some(contributor(
            &format!("author-{}", author.to_lowercase().replace(' ', "-")),
            author,
        ));
        item
    }

    /// Create a contributor without dates.
    pub fn contributor(id: &str, name: &str) -> Contributor {
        Contributor {
            id: id.to_string(),
            name: name.to_string(),
            birth_date: None,
            death_date: None,
            bio: None,
            item_ids: None,
        }
    }

    /// Create a contributor with a lifespan given in years.
    pub fn contributor_lived(id: &str, name: &str, born: i32, died: Option<i32>) -> Contributor {
        Contributor {
            birth_date: NaiveDate::from_ymd_opt(born, 1, 1),
            death_date: died.and_then(|d| NaiveDate::from_ymd_opt(d, 12, 31)),
            ..contributor(id, name)
        }
    }
}
