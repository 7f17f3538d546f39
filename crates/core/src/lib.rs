pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod gateway;
pub mod metrics;
pub mod preferences;
pub mod store;
pub mod testing;

pub use cache::{CacheEntry, Clock, ManualClock, SystemClock, TtlCache};
pub use catalog::{CatalogItem, Contributor};
pub use config::{
    load_config, load_config_from_str, validate_config, ApiConfig, CacheConfig, Config,
    ConfigError, PreferencesConfig,
};
pub use context::{AppContext, ContextError};
pub use gateway::{CatalogApi, GatewayError, HttpGateway, RequestKey, RequestTracker};
pub use preferences::{
    resolve_display_mode, DisplayMode, JsonFileStorage, MemoryStorage, PreferenceError,
    PreferenceStorage, PreferenceStore,
};
pub use store::{
    compute_filtered, compute_statistics, CachePartition, CollectionStore, FilterCriteria,
    FilterUpdate, SortKey, SortOrder, Statistics,
};
