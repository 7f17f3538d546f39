//! Application context: every store, built once at startup and passed down.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::cache::{Clock, SystemClock};
use crate::config::{validate_config, Config, ConfigError};
use crate::gateway::{CatalogApi, GatewayError, HttpGateway};
use crate::preferences::{DisplayMode, JsonFileStorage, PreferenceStorage, PreferenceStore};
use crate::store::CollectionStore;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create catalog gateway: {0}")]
    Gateway(#[from] GatewayError),
}

/// Shared application state.
pub struct AppContext<A: CatalogApi = HttpGateway> {
    config: Config,
    api: Arc<A>,
    collection: CollectionStore<A>,
    preferences: PreferenceStore,
}

impl AppContext<HttpGateway> {
    /// Build the production context: HTTP gateway, wall clock and file-backed
    /// preferences.
    ///
    /// `environment` is the platform's light/dark signal, if it has one.
    pub fn from_config(config: Config, environment: Option<DisplayMode>) -> Result<Self, ContextError> {
        validate_config(&config)?;
        let gateway = Arc::new(HttpGateway::new(&config.api)?);
        info!("Catalog API at {}", gateway.base_url());
        let storage = JsonFileStorage::new(&config.preferences.path);
        Ok(Self::from_parts(
            config,
            gateway,
            Arc::new(SystemClock),
            Box::new(storage),
            environment,
        ))
    }

    pub fn gateway(&self) -> &HttpGateway {
        &self.api
    }
}

impl<A: CatalogApi> AppContext<A> {
    /// Assemble a context from explicit collaborators.
    pub fn from_parts(
        config: Config,
        api: Arc<A>,
        clock: Arc<dyn Clock>,
        storage: Box<dyn PreferenceStorage>,
        environment: Option<DisplayMode>,
    ) -> Self {
        let collection = CollectionStore::new(Arc::clone(&api), &config.cache, clock);
        let preferences = PreferenceStore::new(storage, environment);
        Self {
            config,
            api,
            collection,
            preferences,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn collection(&self) -> &CollectionStore<A> {
        &self.collection
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }
}
