//! Application configuration for Counterlens.
//!
//! User config lives at `~/.counterlens/counterlens.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file — only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CounterlensError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "counterlens.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".counterlens";

// ---------------------------------------------------------------------------
// Config structs (matching counterlens.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation-service settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Evidence-search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Embedding-service settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index settings.
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Judge score below which perspective generation is retried.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: u8,

    /// Maximum perspective-generation attempts before accepting the
    /// current result regardless of score.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_score_threshold() -> u8 {
    70
}
fn default_max_attempts() -> u32 {
    3
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible chat completions API.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Fast model for sentiment, claim extraction, verification, judging.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Larger model for perspective generation.
    #[serde(default = "default_perspective_model")]
    pub perspective_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_generation_key_env(),
            base_url: default_generation_base_url(),
            fast_model: default_fast_model(),
            perspective_model: default_perspective_model(),
        }
    }
}

fn default_generation_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_generation_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_fast_model() -> String {
    "gemma2-9b-it".into()
}
fn default_perspective_model() -> String {
    "llama-3.3-70b-versatile".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Base URL of the custom-search endpoint.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Search engine identifier passed with each query.
    #[serde(default)]
    pub engine_id: String,

    /// Minimum ms between per-claim search calls (third-party quota).
    #[serde(default = "default_search_rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: default_search_base_url(),
            engine_id: String::new(),
            rate_limit_ms: default_search_rate_limit(),
        }
    }
}

fn default_search_key_env() -> String {
    "SEARCH_KEY".into()
}
fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}
fn default_search_rate_limit() -> u64 {
    1000
}

/// `[embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Name of the env var holding the embedding API key.
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible embeddings API.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_embedding_key_env(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
        }
    }
}

fn default_embedding_key_env() -> String {
    "EMBEDDING_API_KEY".into()
}
fn default_embedding_base_url() -> String {
    "http://localhost:8080/v1".into()
}
fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".into()
}

/// `[vector_store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Name of the env var holding the vector index API key.
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,

    /// Base URL of the vector index.
    #[serde(default = "default_store_base_url")]
    pub base_url: String,

    /// Namespace vectors are upserted into.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_store_key_env(),
            base_url: default_store_base_url(),
            namespace: default_namespace(),
        }
    }
}

fn default_store_key_env() -> String {
    "PINECONE_API_KEY".into()
}
fn default_store_base_url() -> String {
    "http://localhost:5080".into()
}
fn default_namespace() -> String {
    "default".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.counterlens/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CounterlensError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.counterlens/counterlens.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CounterlensError::config(format!("cannot read {}: {e}", path.display())))?;

    toml::from_str(&content).map_err(|e| {
        CounterlensError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| CounterlensError::config(format!("cannot create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CounterlensError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| CounterlensError::config(format!("cannot write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key named by `var_name`, failing with a pointed message.
pub fn require_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(CounterlensError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that every configured API key env var is set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    require_api_key(&config.generation.api_key_env)?;
    require_api_key(&config.search.api_key_env)?;
    require_api_key(&config.embedding.api_key_env)?;
    require_api_key(&config.vector_store.api_key_env)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("score_threshold"));
        assert!(toml_str.contains("GROQ_API_KEY"));
        assert!(toml_str.contains("customsearch"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.score_threshold, 70);
        assert_eq!(parsed.defaults.max_attempts, 3);
        assert_eq!(parsed.generation.fast_model, "gemma2-9b-it");
        assert_eq!(parsed.vector_store.namespace, "default");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
score_threshold = 80

[search]
engine_id = "abc123"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.score_threshold, 80);
        assert_eq!(config.defaults.max_attempts, 3);
        assert_eq!(config.search.engine_id, "abc123");
        assert_eq!(config.search.rate_limit_ms, 1000);
    }

    #[test]
    fn api_key_validation() {
        // Use a unique env var name to avoid interfering with other tests
        let result = require_api_key("CL_TEST_NONEXISTENT_KEY_12345");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
