//! Generation-service seam for Counterlens.
//!
//! Every pipeline stage that talks to a language model does so through
//! the [`GenerationService`] trait, constructed once at startup and
//! passed in by reference. Tests substitute scripted fakes; production
//! uses [`HttpGenerationClient`] against an OpenAI-compatible
//! `/chat/completions` endpoint.

mod client;

use counterlens_shared::Result;
use serde::{Deserialize, Serialize};

pub use client::HttpGenerationClient;

// ---------------------------------------------------------------------------
// Chat request types
// ---------------------------------------------------------------------------

/// Role tag for a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// One role-tagged message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A complete chat completion request: ordered messages, model
/// identifier, temperature, and a max-token bound.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Build a request for the given model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.3,
            max_tokens: 512,
        }
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the max-token bound.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// Outbound language-generation call.
///
/// Returns the completion text of the first choice. Transport errors,
/// quota errors, and empty completions surface as
/// `CounterlensError::Generation`.
pub trait GenerationService {
    fn complete(&self, request: &ChatRequest) -> impl Future<Output = Result<String>> + Send;
}
