//! Shared types, error model, and configuration for Counterlens.
//!
//! This crate is the foundation depended on by all other Counterlens crates.
//! It provides:
//! - [`CounterlensError`] — the unified error type
//! - Domain types ([`PipelineState`], [`Verification`], [`Chunk`], [`Stage`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod http;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, EmbeddingConfig, GenerationConfig, SearchConfig,
    VectorStoreConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, require_api_key, validate_api_keys,
};
pub use error::{CounterlensError, Result};
pub use http::{join_path, truncate};
pub use types::{
    Chunk, PerspectiveResult, PipelineOutcome, PipelineState, RunId, Stage, StageError,
    Status, StoppedReport, Verdict, Verification,
};
