//! Web evidence search seam and its custom-search HTTP client.

use std::time::Duration;

use counterlens_shared::{CounterlensError, Result, truncate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Counterlens/", env!("CARGO_PKG_VERSION"));

/// Per-call timeout for search requests.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// SearchHit
// ---------------------------------------------------------------------------

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// Outbound evidence-search call.
///
/// An empty result list is valid, not an error.
pub trait EvidenceSearch {
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>>> + Send;
}

// ---------------------------------------------------------------------------
// HttpSearchClient
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

/// Production [`EvidenceSearch`] over a Google Custom Search-style
/// REST endpoint (`GET {base}?key=..&cx=..&q=..&num=..`).
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    engine_id: String,
}

impl HttpSearchClient {
    /// Build a client for the given search endpoint.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = Url::parse(base_url).map_err(|e| {
            CounterlensError::config(format!("invalid search base URL '{base_url}': {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CounterlensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        })
    }
}

impl EvidenceSearch for HttpSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        debug!(%query, limit, "evidence search");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| CounterlensError::Search(format!("transport: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CounterlensError::Search(format!(
                "HTTP {status}: {}",
                truncate(&body, 200)
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CounterlensError::Search(format!("malformed response: {e}")))?;

        Ok(parsed.items.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_returns_hits() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {
                    "title": "Company X annual report",
                    "link": "https://example.com/report",
                    "snippet": "Profits doubled in fiscal 2024..."
                },
                {
                    "title": "Unrelated page",
                    "link": "https://example.com/other",
                    "snippet": "..."
                }
            ]
        });

        Mock::given(method("GET"))
            .and(query_param("q", "Company X doubled profits"))
            .and(query_param("cx", "engine-1"))
            .and(query_param("num", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&server.uri(), "key", "engine-1").unwrap();
        let hits = client.search("Company X doubled profits", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Company X annual report");
        assert_eq!(hits[0].link, "https://example.com/report");
    }

    #[tokio::test]
    async fn missing_items_is_empty_not_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "searchInformation": { "totalResults": "0" }
            })))
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&server.uri(), "key", "engine-1").unwrap();
        let hits = client.search("nothing matches this", 1).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exhausted"))
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&server.uri(), "key", "engine-1").unwrap();
        let err = client.search("anything", 1).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 403"));
    }

    #[tokio::test]
    async fn multibyte_error_body_is_truncated_not_panicked() {
        let server = MockServer::start().await;

        // Character 200 is multibyte; truncation must respect char
        // boundaries instead of slicing mid-character.
        let body = format!("{}é quota exhaustée", "a".repeat(199));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string(body))
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&server.uri(), "key", "engine-1").unwrap();
        let err = client.search("anything", 1).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HTTP 403"));
        assert!(msg.ends_with('é'));
    }
}
