//! Outbound access to the remote catalog API.
//!
//! Every network call goes through a [`CatalogApi`] implementation. The
//! production one is [`HttpGateway`]; tests use
//! [`MockCatalogApi`](crate::testing::MockCatalogApi).

mod http;
mod requests;

pub use http::HttpGateway;
pub use requests::{RequestFailure, RequestId, RequestKey, RequestState, RequestTicket, RequestTracker};

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{CatalogItem, Contributor};

/// Errors that can occur when talking to the catalog API.
///
/// Each variant renders as a single human readable message, which is also
/// what the gateway records as the request's error.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure (connection refused, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `message` comes from the `{"error": ...}` body when
    /// present, otherwise from the status line.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Http(e) => e.status().map(|s| s.as_u16()),
            GatewayError::Decode(_) => None,
        }
    }
}

/// Typed requests against the catalog API.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /books/search?title=` - best single match for a title.
    async fn search_item(&self, title: &str) -> Result<CatalogItem, GatewayError>;

    /// `GET /books`
    async fn all_items(&self) -> Result<Vec<CatalogItem>, GatewayError>;

    /// `GET /books/language?lang=`
    async fn items_by_language(&self, language: &str) -> Result<Vec<CatalogItem>, GatewayError>;

    /// `GET /books/top`
    async fn top_items(&self) -> Result<Vec<CatalogItem>, GatewayError>;

    /// `GET /authors`
    async fn all_contributors(&self) -> Result<Vec<Contributor>, GatewayError>;

    /// `GET /authors/alive?year=`
    async fn contributors_alive_in(&self, year: i32) -> Result<Vec<Contributor>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_displays_message_only() {
        let err = GatewayError::Status {
            status: 404,
            message: "Book not found".to_string(),
        };
        assert_eq!(err.to_string(), "Book not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let err = GatewayError::Decode("missing field `title`".to_string());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("missing field"));
    }
}
