//! Error types for Counterlens.
//!
//! Library crates use [`CounterlensError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.
//! Pipeline stages never let these escape a stage boundary — each stage
//! converts its own failures into an error-status state.

/// Top-level error type for all Counterlens operations.
#[derive(Debug, thiserror::Error)]
pub enum CounterlensError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed structured output (bad JSON, unmatched bullet format,
    /// no integer score).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Generation-service error (transport, quota, or empty completion).
    #[error("generation error: {0}")]
    Generation(String),

    /// Evidence-search service error.
    #[error("search error: {0}")]
    Search(String),

    /// Embedding-service error.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector index upsert error.
    #[error("vector store error: {0}")]
    VectorStore(String),

    /// Data validation error (required field missing/empty, aggregate
    /// failure of a per-item loop).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CounterlensError>;

impl CounterlensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// The human-readable message without the variant prefix.
    ///
    /// Stage error reports carry this bare message; the variant prefix
    /// is log/diagnostic detail, not part of the response contract.
    pub fn stage_message(&self) -> &str {
        match self {
            Self::Config { message } | Self::Parse { message } | Self::Validation { message } => {
                message
            }
            Self::Network(m)
            | Self::Generation(m)
            | Self::Search(m)
            | Self::Embedding(m)
            | Self::VectorStore(m) => m,
        }
    }
}
