//! OpenAI-compatible chat completions client.

use std::time::Duration;

use counterlens_shared::{CounterlensError, Result, join_path, truncate};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{ChatRequest, GenerationService};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("Counterlens/", env!("CARGO_PKG_VERSION"));

/// Per-call timeout; generation calls can be slow on large models.
const REQUEST_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Response wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// HttpGenerationClient
// ---------------------------------------------------------------------------

/// Production [`GenerationService`] over an OpenAI-compatible
/// `POST {base}/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpGenerationClient {
    /// Build a client for the given base URL (e.g. `https://api.groq.com/openai/v1`).
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            CounterlensError::config(format!("invalid generation base URL '{base_url}': {e}"))
        })?;
        let endpoint = join_path(&base, "chat/completions")?;

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

impl GenerationService for HttpGenerationClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!(model = %request.model, messages = request.messages.len(), "generation request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CounterlensError::Generation(format!("transport: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(CounterlensError::Generation(
                "quota exceeded (HTTP 429)".into(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CounterlensError::Generation(format!(
                "HTTP {status}: {}",
                truncate(&body, 200)
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CounterlensError::Generation(format!("malformed response: {e}")))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| CounterlensError::Generation("response contained no choices".into()))?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({ "model": "gemma2-9b-it" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  Positive  ")))
            .mount(&server)
            .await;

        let client =
            HttpGenerationClient::new(&format!("{}/v1", server.uri()), "test-key").unwrap();
        let request = ChatRequest::new("gemma2-9b-it", vec![ChatMessage::user("classify")]);
        let content = client.complete(&request).await.unwrap();
        assert_eq!(content, "Positive");
    }

    #[tokio::test]
    async fn complete_maps_quota_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = HttpGenerationClient::new(&server.uri(), "test-key").unwrap();
        let request = ChatRequest::new("gemma2-9b-it", vec![ChatMessage::user("hi")]);
        let err = client.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn complete_maps_server_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = HttpGenerationClient::new(&server.uri(), "test-key").unwrap();
        let request = ChatRequest::new("gemma2-9b-it", vec![ChatMessage::user("hi")]);
        let err = client.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn complete_rejects_empty_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = HttpGenerationClient::new(&server.uri(), "test-key").unwrap();
        let request = ChatRequest::new("gemma2-9b-it", vec![ChatMessage::user("hi")]);
        let err = client.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
