use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{ImageMap, StockItem, WantedEntry};

/// Read-only client for the stock API. Cheap to clone; clones share one
/// connection pool.
#[derive(Clone)]
pub struct StockClient {
    client: Client,
    base_url: String,
}

impl StockClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("stock_watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Request {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self { client, base_url })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn fetch_images(&self) -> Result<ImageMap, FetchError> {
        self.fetch_json("/images").await
    }

    pub async fn fetch_all(&self) -> Result<Vec<StockItem>, FetchError> {
        self.fetch_json("/all").await
    }

    pub async fn fetch_wanted(&self) -> Result<Vec<StockItem>, FetchError> {
        let entries: Vec<WantedEntry> = self.fetch_json("/wanted").await?;
        Ok(entries.into_iter().map(StockItem::from).collect())
    }

    /// Raw bytes behind an absolute image URL from the image map.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.send(url).await?;
        let bytes = response.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let response = self.send(&url).await?;

        let body = response.bytes().await.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;

        debug!(url = %url, bytes = body.len(), "fetched");
        decode(&url, &body)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}
