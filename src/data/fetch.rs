//! Retrieval of remote GeoJSON collections
//!
//! A fetch is a single attempt: network failures surface as
//! [`MapError::FetchFailed`], bodies that are not a FeatureCollection as
//! [`MapError::ParseFailed`]. Callers decide what a failure means; the engine
//! treats it as "this source contributes no layers".

use crate::core::constants::USER_AGENT;
use crate::data::geojson::FeatureCollection;
use crate::{MapError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

#[cfg(feature = "tokio-runtime")]
use crate::core::config::{DataSourceSpec, SourceData};
#[cfg(feature = "tokio-runtime")]
use std::sync::Arc;

/// Shared HTTP client so that every fetcher reuses one connection pool.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
});

/// Anything that can turn a URL into a FeatureCollection
#[async_trait]
pub trait GeoJsonFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection>;
}

/// Fetches over HTTP(S) with a plain `GET`. No auth headers, no retry.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Fetcher backed by the process-wide client
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    /// Fetcher with a caller-configured client (timeouts, proxies, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch_failed(url: &str, cause: impl ToString) -> MapError {
    MapError::FetchFailed {
        url: url.to_string(),
        cause: cause.to_string(),
    }
}

#[async_trait]
impl GeoJsonFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(url, format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| fetch_failed(url, e))?;
        log::debug!("downloaded {} bytes from {}", body.len(), url);

        FeatureCollection::from_json(url, &body)
    }
}

/// Result of one source's fetch, tagged with the source it belongs to
#[derive(Debug)]
pub struct FetchOutcome {
    pub source_id: String,
    pub result: Result<FeatureCollection>,
}

/// Starts one task per source on `handle` and reports each completion on the
/// returned channel in completion order. Inline sources are reported
/// immediately without a task.
///
/// This lets a synchronous UI loop drain outcomes each frame and hand them to
/// [`crate::engine::LayerEngine::ingest`].
#[cfg(feature = "tokio-runtime")]
pub fn spawn_fetches(
    handle: &tokio::runtime::Handle,
    fetcher: Arc<dyn GeoJsonFetcher>,
    sources: &[DataSourceSpec],
) -> crossbeam_channel::Receiver<FetchOutcome> {
    let (tx, rx) = crossbeam_channel::unbounded();

    for source in sources {
        let source_id = source.id.clone();
        match &source.data {
            SourceData::Inline(collection) => {
                let _ = tx.send(FetchOutcome {
                    source_id,
                    result: Ok(collection.clone()),
                });
            }
            SourceData::Url(url) => {
                let url = url.clone();
                let fetcher = Arc::clone(&fetcher);
                let tx = tx.clone();
                handle.spawn(async move {
                    let result = fetcher.fetch(&url).await;
                    // receiver gone means the app shut down
                    let _ = tx.send(FetchOutcome { source_id, result });
                });
            }
        }
    }

    rx
}
