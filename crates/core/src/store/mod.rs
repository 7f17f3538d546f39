//! The collection store: authoritative item list, filter state, derived views
//! and cache coordination.

mod collection;
mod criteria;
mod view;

pub use collection::{CachePartition, CollectionStore};
pub use criteria::{FilterCriteria, FilterUpdate, SortKey, SortOrder};
pub use view::{compute_filtered, compute_statistics, Statistics, MAX_LISTED_CONTRIBUTORS};
