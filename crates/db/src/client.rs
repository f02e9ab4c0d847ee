//! Remote collection client for the REST-fronted store.

use crate::error::{StoreError, StoreResult};
use crate::query::{Cardinality, CollectionQuery};
use async_trait::async_trait;
use history_atlas_telemetry::Metrics;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Executes filtered reads against named collections.
///
/// Implementations hold no per-request state and are shared across
/// concurrent requests.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Run the query and return the raw rows.
    async fn execute(&self, query: &CollectionQuery) -> StoreResult<Vec<Value>>;
}

/// Run a query and decode every row into `T`.
pub async fn fetch_rows<T: DeserializeOwned>(
    client: &dyn CollectionClient,
    query: &CollectionQuery,
) -> StoreResult<Vec<T>> {
    let rows = client.execute(query).await?;
    decode_rows(query.collection(), rows)
}

/// Run a single-row query and decode its only row into `T`.
///
/// Fails with [`StoreError::Cardinality`] on zero or several rows.
pub async fn fetch_single<T: DeserializeOwned>(
    client: &dyn CollectionClient,
    query: &CollectionQuery,
) -> StoreResult<T> {
    let query = query.clone().single();
    let mut rows = client.execute(&query).await?;
    if rows.len() != 1 {
        return Err(StoreError::Cardinality {
            collection: query.collection().to_string(),
            count: rows.len(),
        });
    }
    let row = rows.remove(0);
    serde_json::from_value(row).map_err(|source| StoreError::Decode {
        collection: query.collection().to_string(),
        source,
    })
}

/// Decode raw rows from `collection` into `T`.
pub fn decode_rows<T: DeserializeOwned>(collection: &str, rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| StoreError::Decode {
                collection: collection.to_string(),
                source,
            })
        })
        .collect()
}

/// Client for a PostgREST endpoint such as Supabase's `/rest/v1`.
pub struct RestCollectionClient {
    client: Client,
    base_url: String,
    api_key: String,
    metrics: Metrics,
}

impl RestCollectionClient {
    /// Create a new REST client.
    ///
    /// # Arguments
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`
    /// * `api_key` - Key sent as both `apikey` and bearer token
    /// * `timeout` - Upper bound for a single store request
    /// * `metrics` - Metrics collector
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        metrics: Metrics,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = format!("{}/rest/v1", base_url.trim_end_matches('/'));
        info!("Initialized store client for {}", base_url);

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            metrics,
        })
    }

    async fn send(&self, query: &CollectionQuery) -> StoreResult<Vec<Value>> {
        let collection = query.collection();
        let url = format!("{}/{}", self.base_url, collection);
        let transport = |source| StoreError::Transport {
            collection: collection.to_string(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .query(&query.to_params())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(collection, status = status.as_u16(), "Failed to read error body: {}", e);
                    String::new()
                }
            };
            return Err(StoreError::Status {
                collection: collection.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            collection: collection.to_string(),
            source,
        })
    }
}

#[async_trait]
impl CollectionClient for RestCollectionClient {
    async fn execute(&self, query: &CollectionQuery) -> StoreResult<Vec<Value>> {
        query.validate()?;

        let start = Instant::now();
        self.metrics.inc_store_queries();
        let result = self.send(query).await;
        self.metrics
            .observe_store_latency(query.collection(), start.elapsed().as_secs_f64());

        match &result {
            Ok(rows) => debug!(
                collection = query.collection(),
                rows = rows.len(),
                single = query.cardinality() == Cardinality::Single,
                "Store query completed"
            ),
            Err(_) => self.metrics.inc_store_errors(),
        }
        result
    }
}
