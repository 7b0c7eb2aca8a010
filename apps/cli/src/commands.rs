//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use counterlens_factcheck::HttpSearchClient;
use counterlens_index::{HttpEmbeddingClient, HttpVectorStore};
use counterlens_llm::HttpGenerationClient;
use counterlens_pipeline::{Pipeline, PipelineConfig};
use counterlens_shared::{
    AppConfig, PipelineOutcome, PipelineState, init_config, load_config, require_api_key,
    validate_api_keys,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Counterlens — fact-checked counter-perspectives for web articles.
#[derive(Parser)]
#[command(
    name = "counterlens",
    version,
    about = "Analyze an article: sentiment, fact-checked claims, and an indexed counter-perspective.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full analysis pipeline over an article.
    Analyze {
        /// File containing the cleaned article text. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Comma-separated keywords from upstream extraction.
        #[arg(short, long)]
        keywords: Option<String>,

        /// Vector index namespace (overrides config).
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "counterlens=info",
        1 => "counterlens=debug",
        _ => "counterlens=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            file,
            keywords,
            namespace,
        } => cmd_analyze(file.as_deref(), keywords.as_deref(), namespace).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_analyze(
    file: Option<&std::path::Path>,
    keywords: Option<&str>,
    namespace: Option<String>,
) -> Result<()> {
    // Validate API keys before doing any work
    let config = load_config()?;
    validate_api_keys(&config)?;

    let article_text = read_article(file)?;
    if article_text.trim().is_empty() {
        return Err(eyre!("article text is empty"));
    }

    let keywords: Vec<String> = keywords
        .map(|k| {
            k.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut pipeline_config = PipelineConfig::from(&config);
    if let Some(ns) = namespace {
        pipeline_config.namespace = ns;
    }

    let state = PipelineState::new(article_text).with_keywords(keywords);
    info!(
        run_id = %state.run_id,
        article_len = state.article_text.len(),
        namespace = %pipeline_config.namespace,
        "starting analysis"
    );

    let pipeline = build_pipeline(&config, pipeline_config)?;
    let outcome = pipeline.run(state).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let PipelineOutcome::Stopped(report) = &outcome {
        return Err(eyre!(
            "pipeline stopped at {}: {}",
            report.from.join(", "),
            report.error.join("; ")
        ));
    }
    Ok(())
}

/// Assemble the production pipeline from the resolved config.
fn build_pipeline(
    config: &AppConfig,
    pipeline_config: PipelineConfig,
) -> Result<Pipeline<HttpGenerationClient, HttpSearchClient, HttpEmbeddingClient, HttpVectorStore>>
{
    let generation = HttpGenerationClient::new(
        &config.generation.base_url,
        require_api_key(&config.generation.api_key_env)?,
    )?;
    let search = HttpSearchClient::new(
        &config.search.base_url,
        require_api_key(&config.search.api_key_env)?,
        &config.search.engine_id,
    )?;
    let embedder = HttpEmbeddingClient::new(
        &config.embedding.base_url,
        require_api_key(&config.embedding.api_key_env)?,
        &config.embedding.model,
    )?;
    let store = HttpVectorStore::new(
        &config.vector_store.base_url,
        require_api_key(&config.vector_store.api_key_env)?,
    )?;

    Ok(Pipeline::new(
        generation,
        search,
        embedder,
        store,
        pipeline_config,
    ))
}

/// Read the article text from a file or stdin.
fn read_article(file: Option<&std::path::Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| eyre!("cannot read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
