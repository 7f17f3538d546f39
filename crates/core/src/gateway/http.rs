//! reqwest-backed catalog API client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::requests::{RequestFailure, RequestKey, RequestTracker};
use super::{CatalogApi, GatewayError};
use crate::catalog::{CatalogItem, Contributor};
use crate::config::ApiConfig;
use crate::metrics::{GATEWAY_REQUESTS, GATEWAY_REQUEST_DURATION};

/// Error body returned by the catalog API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Single choke point for outbound catalog calls.
///
/// One attempt per call: no retries, no backoff. Loading and error state is
/// kept per [`RequestKey`] in the gateway's [`RequestTracker`].
#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    tracker: RequestTracker,
}

impl HttpGateway {
    /// Create a new gateway.
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tracker: RequestTracker::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// True while any request is in flight.
    pub fn is_loading(&self) -> bool {
        self.tracker.is_loading()
    }

    /// Most recent failure across all requests.
    pub fn last_error(&self) -> Option<RequestFailure> {
        self.tracker.last_failure()
    }

    /// Error of the latest call for `key`, if it failed.
    pub fn error_for(&self, key: &RequestKey) -> Option<String> {
        self.tracker.error_for(key)
    }

    pub fn clear_error(&self) {
        self.tracker.clear_errors();
    }

    async fn request<T: DeserializeOwned>(
        &self,
        key: RequestKey,
        endpoint: &str,
    ) -> Result<T, GatewayError> {
        let label = key.endpoint();
        let ticket = self.tracker.begin(key);
        let started = Instant::now();

        let result = self.send(endpoint).await;
        GATEWAY_REQUEST_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                GATEWAY_REQUESTS.with_label_values(&[label, "success"]).inc();
                ticket.succeed();
            }
            Err(e) => {
                debug!("Catalog API request failed: endpoint={}, error={}", endpoint, e);
                GATEWAY_REQUESTS.with_label_values(&[label, "error"]).inc();
                ticket.fail(e.to_string());
            }
        }

        result
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("Catalog API request: GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response.json::<T>().await.map_err(|e| {
            GatewayError::Decode(format!("{} returned an unexpected body: {}", endpoint, e))
        })
    }
}

/// Build the error for a non-success response.
///
/// Prefers the `error` field of a JSON body and falls back to
/// `HTTP <code>: <reason>`.
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });

    GatewayError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CatalogApi for HttpGateway {
    async fn search_item(&self, title: &str) -> Result<CatalogItem, GatewayError> {
        let endpoint = format!("/books/search?title={}", urlencoding::encode(title));
        self.request(RequestKey::SearchItem, &endpoint).await
    }

    async fn all_items(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        self.request(RequestKey::AllItems, "/books").await
    }

    async fn items_by_language(&self, language: &str) -> Result<Vec<CatalogItem>, GatewayError> {
        let endpoint = format!("/books/language?lang={}", urlencoding::encode(language));
        self.request(RequestKey::ItemsByLanguage(language.to_string()), &endpoint)
            .await
    }

    async fn top_items(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        self.request(RequestKey::TopItems, "/books/top").await
    }

    async fn all_contributors(&self) -> Result<Vec<Contributor>, GatewayError> {
        self.request(RequestKey::AllContributors, "/authors").await
    }

    async fn contributors_alive_in(&self, year: i32) -> Result<Vec<Contributor>, GatewayError> {
        let endpoint = format!("/authors/alive?year={}", year);
        self.request(RequestKey::ContributorsAlive(year), &endpoint)
            .await
    }
}
