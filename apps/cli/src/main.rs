//! Counterlens CLI — fact-checked counter-perspectives for web articles.
//!
//! Runs the analysis pipeline over an article: sentiment, claim
//! fact-checking with web evidence, counter-perspective generation with
//! quality judging, and vector indexing of the results.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
