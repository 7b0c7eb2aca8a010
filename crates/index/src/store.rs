//! Namespaced vector index upserts.

use std::time::Duration;

use counterlens_shared::{CounterlensError, Result, join_path, truncate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// User-Agent string for vector store requests.
const USER_AGENT: &str = concat!("Counterlens/", env!("CARGO_PKG_VERSION"));

/// Per-call timeout for upsert requests.
const REQUEST_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// VectorRecord
// ---------------------------------------------------------------------------

/// One vector ready for upsert: chunk id, embedding values, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// Outbound vector upsert into a namespaced index.
///
/// Upserting an empty batch is an explicit error; failures are wrapped
/// with context and surfaced as `CounterlensError::VectorStore`.
pub trait VectorStore {
    fn upsert(
        &self,
        records: &[VectorRecord],
        namespace: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// HttpVectorStore
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

/// Production [`VectorStore`] over a Pinecone-style
/// `POST {base}/vectors/upsert` endpoint.
#[derive(Debug, Clone)]
pub struct HttpVectorStore {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpVectorStore {
    /// Build a client for the given index base URL.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            CounterlensError::config(format!("invalid vector store base URL '{base_url}': {e}"))
        })?;
        let endpoint = join_path(&base, "vectors/upsert")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CounterlensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }
}

impl VectorStore for HttpVectorStore {
    async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> Result<()> {
        if records.is_empty() {
            return Err(CounterlensError::validation(
                "vector batch cannot be empty",
            ));
        }

        let body = UpsertRequest {
            vectors: records,
            namespace,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CounterlensError::VectorStore(format!("upsert transport failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CounterlensError::VectorStore(format!(
                "upsert failed: HTTP {status}: {}",
                truncate(&text, 200)
            )));
        }

        info!(
            count = records.len(),
            namespace, "vectors stored in index"
        );
        Ok(())
    }
}
