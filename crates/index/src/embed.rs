//! Batch embedding of chunk texts.

use std::time::Duration;

use counterlens_shared::{Chunk, CounterlensError, Result, join_path, truncate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::store::VectorRecord;

/// User-Agent string for embedding requests.
const USER_AGENT: &str = concat!("Counterlens/", env!("CARGO_PKG_VERSION"));

/// Per-call timeout for embedding requests.
const REQUEST_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// Outbound batch-embedding call: one vector per input text, in order.
pub trait EmbeddingService {
    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Embed every chunk text in one batch call and pair each vector with
/// its chunk id and metadata.
///
/// An empty chunk list is an explicit error — storing zero vectors is
/// never silently accepted. Every chunk must carry non-empty text.
pub async fn embed_chunks<E: EmbeddingService>(
    embedder: &E,
    chunks: &[Chunk],
) -> Result<Vec<VectorRecord>> {
    if chunks.is_empty() {
        return Err(CounterlensError::validation("chunk list cannot be empty"));
    }

    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.text.trim().is_empty() {
            return Err(CounterlensError::validation(format!(
                "invalid chunk at index {i}: empty text"
            )));
        }
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed(&texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(CounterlensError::Embedding(format!(
            "expected {} embeddings, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    debug!(count = embeddings.len(), "embedding batch complete");

    Ok(chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, values)| VectorRecord {
            id: chunk.id.clone(),
            values,
            metadata: chunk.metadata.clone(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// HttpEmbeddingClient
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Production [`EmbeddingService`] over an OpenAI-compatible
/// `POST {base}/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl HttpEmbeddingClient {
    /// Build a client for the given base URL and model.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            CounterlensError::config(format!("invalid embedding base URL '{base_url}': {e}"))
        })?;
        let endpoint = join_path(&base, "embeddings")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CounterlensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

impl EmbeddingService for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CounterlensError::Embedding(format!("transport: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CounterlensError::Embedding(format!(
                "HTTP {status}: {}",
                truncate(&text, 200)
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| CounterlensError::Embedding(format!("malformed response: {e}")))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.into(),
            text: text.into(),
            metadata: serde_json::json!({ "type": "fact" }),
        }
    }

    struct FixedEmbedder {
        dims: usize,
    }

    impl EmbeddingService for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; self.dims]).collect())
        }
    }

    #[tokio::test]
    async fn embeds_chunks_into_records() {
        let embedder = FixedEmbedder { dims: 4 };
        let chunks = vec![chunk("a-perspective", "view"), chunk("a-fact-0", "claim")];

        let records = embed_chunks(&embedder, &chunks).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a-perspective");
        assert_eq!(records[0].values.len(), 4);
        assert_eq!(records[1].metadata["type"], "fact");
    }

    #[tokio::test]
    async fn empty_chunk_list_is_error() {
        let embedder = FixedEmbedder { dims: 4 };
        let err = embed_chunks(&embedder, &[]).await.unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[tokio::test]
    async fn chunk_without_text_is_error() {
        let embedder = FixedEmbedder { dims: 4 };
        let chunks = vec![chunk("a-fact-0", "  ")];
        let err = embed_chunks(&embedder, &chunks).await.unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[tokio::test]
    async fn http_client_parses_embeddings() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "data": [
                { "embedding": [0.1, 0.2, 0.3] },
                { "embedding": [0.4, 0.5, 0.6] }
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(
                serde_json::json!({ "model": "all-MiniLM-L6-v2" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = HttpEmbeddingClient::new(
            &format!("{}/v1", server.uri()),
            "key",
            "all-MiniLM-L6-v2",
        )
        .unwrap();

        let vectors = client
            .embed(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn http_client_maps_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = HttpEmbeddingClient::new(&server.uri(), "key", "m").unwrap();
        let err = client.embed(&["text".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn multibyte_error_body_is_truncated_not_panicked() {
        let server = MockServer::start().await;

        let body = format!("{}über capacity", "a".repeat(199));
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string(body))
            .mount(&server)
            .await;

        let client = HttpEmbeddingClient::new(&server.uri(), "key", "m").unwrap();
        let err = client.embed(&["text".to_string()]).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HTTP 503"));
        assert!(msg.ends_with('ü'));
    }
}
