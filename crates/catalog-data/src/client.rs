//! Catalog fetch client.

use async_trait::async_trait;
use catalog_core::{BrowserConfig, CatalogPage, Record};
use serde::de::DeserializeOwned;

use crate::timeout::TimeoutConfig;
use crate::wire::{ListResponse, RecordResponse};

/// Error type for fetch operations.
///
/// `Clone` so one failure can be handed to every caller waiting on the same
/// request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status code, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Network, timeout and 5xx failures.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Http { status, .. } => (500..600).contains(status) || *status == 429,
            _ => false,
        }
    }

    /// Upstream has no record under the requested id.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_decode() {
            Self::Deserialization(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// The two read operations offered by the upstream catalog service.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch `limit` items starting at `offset`.
    async fn list_page(&self, limit: u32, offset: u32) -> Result<CatalogPage, FetchError>;

    /// Fetch one record by numeric id or by name.
    async fn get_record(&self, id_or_name: &str) -> Result<Record, FetchError>;
}

/// `reqwest`-backed client for the live catalog API.
///
/// Pure I/O: no caching and no retries happen here.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    collection_url: String,
}

impl HttpCatalogClient {
    /// Create a client from the browser configuration.
    pub fn new(config: &BrowserConfig) -> Result<Self, FetchError> {
        Self::with_timeouts(config, TimeoutConfig::from_total(config.request_timeout()))
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(config: &BrowserConfig, timeouts: TimeoutConfig) -> Result<Self, FetchError> {
        let collection_url = config.collection_url();
        if !collection_url.starts_with("http://") && !collection_url.starts_with("https://") {
            return Err(FetchError::InvalidUrl(collection_url));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.total)
            .build()?;

        Ok(Self {
            http,
            collection_url,
        })
    }

    /// URL of one listing page.
    pub fn list_url(&self, limit: u32, offset: u32) -> String {
        format!("{}?limit={}&offset={}", self.collection_url, limit, offset)
    }

    /// URL of one record. Rejects identifiers that would escape the collection path.
    pub fn record_url(&self, id_or_name: &str) -> Result<String, FetchError> {
        let id = id_or_name.trim();
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(FetchError::InvalidUrl(format!(
                "{}/{}",
                self.collection_url, id_or_name
            )));
        }
        Ok(format!("{}/{}", self.collection_url, id.to_lowercase()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        tracing::debug!(url, "catalog request");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn list_page(&self, limit: u32, offset: u32) -> Result<CatalogPage, FetchError> {
        let url = self.list_url(limit, offset);
        let body: ListResponse = self.get_json(&url).await?;
        Ok(body.into())
    }

    async fn get_record(&self, id_or_name: &str) -> Result<Record, FetchError> {
        let url = self.record_url(id_or_name)?;
        let body: RecordResponse = self.get_json(&url).await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpCatalogClient {
        HttpCatalogClient::new(&BrowserConfig::default()).unwrap()
    }

    #[test]
    fn test_list_url() {
        assert_eq!(
            client().list_url(20, 40),
            "https://pokeapi.co/api/v2/pokemon?limit=20&offset=40"
        );
    }

    #[test]
    fn test_record_url_lowercases_names() {
        assert_eq!(
            client().record_url("Pikachu").unwrap(),
            "https://pokeapi.co/api/v2/pokemon/pikachu"
        );
        assert_eq!(
            client().record_url("25").unwrap(),
            "https://pokeapi.co/api/v2/pokemon/25"
        );
    }

    #[test]
    fn test_record_url_rejects_path_escape() {
        assert!(matches!(
            client().record_url("../berry"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            client().record_url(""),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            client().record_url("1?x=2"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_new_rejects_non_http_base() {
        let config = BrowserConfig::default().with_base_url("ftp://example.com");
        assert!(matches!(
            HttpCatalogClient::new(&config),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_classification() {
        let server = FetchError::Http {
            status: 503,
            url: "u".to_string(),
        };
        let missing = FetchError::Http {
            status: 404,
            url: "u".to_string(),
        };
        assert!(server.is_transient());
        assert!(!server.is_not_found());
        assert!(!missing.is_transient());
        assert!(missing.is_not_found());
        assert!(FetchError::Timeout("slow".to_string()).is_transient());
        assert!(!FetchError::Deserialization("bad".to_string()).is_transient());
        assert_eq!(FetchError::Connection("x".to_string()).status(), None);
    }
}
