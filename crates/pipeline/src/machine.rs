//! The pipeline state machine: stage routing and the run loop.

use counterlens_factcheck::{EvidenceSearch, FactCheckOptions};
use counterlens_index::{EmbeddingService, VectorStore};
use counterlens_llm::GenerationService;
use counterlens_shared::config::AppConfig;
use counterlens_shared::{PipelineOutcome, PipelineState, Stage, Status};
use tracing::{debug, info, instrument};

use crate::error_handler::handle_error;
use crate::fact_check::run_fact_check_stage;
use crate::judge::run_judge;
use crate::perspective::run_generate_perspective;
use crate::sentiment::run_sentiment;
use crate::store::run_store_and_send;

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Bounds on the generate/judge retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum perspective-generation attempts per run.
    pub max_attempts: u32,
    /// Scores below this re-enter the generation loop.
    pub score_threshold: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            score_threshold: 70,
        }
    }
}

/// Where the run goes after a stage returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Continue at the given stage.
    Goto(Stage),
    /// The terminal stage succeeded.
    Done,
    /// Route to the error handler.
    Fail,
}

/// Pure routing function: the whole control-flow graph in one place.
///
/// An error status from any stage routes to the error handler before
/// anything else is considered. The judge re-enters generation only
/// while the score is below threshold and attempts remain.
pub fn next_stage(current: Stage, state: &PipelineState, policy: &RetryPolicy) -> Transition {
    if state.status == Status::Error {
        return Transition::Fail;
    }

    match current {
        Stage::SentimentAnalysis => Transition::Goto(Stage::FactChecking),
        Stage::FactChecking => Transition::Goto(Stage::GeneratePerspective),
        Stage::GeneratePerspective => Transition::Goto(Stage::JudgePerspective),
        Stage::JudgePerspective => {
            let score = state.score.unwrap_or(0);
            if score < policy.score_threshold && state.retries < policy.max_attempts {
                Transition::Goto(Stage::GeneratePerspective)
            } else {
                Transition::Goto(Stage::StoreAndSend)
            }
        }
        Stage::StoreAndSend => Transition::Done,
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Runtime knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model for sentiment, claim extraction, verification, and judging.
    pub fast_model: String,
    /// Model for perspective generation.
    pub perspective_model: String,
    /// Vector index namespace written by the terminal stage.
    pub namespace: String,
    /// Minimum ms between per-claim evidence searches.
    pub search_rate_limit_ms: u64,
    /// Retry loop bounds.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fast_model: "gemma2-9b-it".into(),
            perspective_model: "llama-3.3-70b-versatile".into(),
            namespace: "default".into(),
            search_rate_limit_ms: 1000,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            fast_model: config.generation.fast_model.clone(),
            perspective_model: config.generation.perspective_model.clone(),
            namespace: config.vector_store.namespace.clone(),
            search_rate_limit_ms: config.search.rate_limit_ms,
            retry: RetryPolicy {
                max_attempts: config.defaults.max_attempts,
                score_threshold: config.defaults.score_threshold,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The assembled pipeline, generic over its four outbound services.
pub struct Pipeline<G, S, E, V> {
    generation: G,
    search: S,
    embedder: E,
    store: V,
    config: PipelineConfig,
}

impl<G, S, E, V> Pipeline<G, S, E, V>
where
    G: GenerationService,
    S: EvidenceSearch,
    E: EmbeddingService,
    V: VectorStore,
{
    pub fn new(generation: G, search: S, embedder: E, store: V, config: PipelineConfig) -> Self {
        Self {
            generation,
            search,
            embedder,
            store,
            config,
        }
    }

    /// Drive the state machine from sentiment analysis to a terminal
    /// outcome. Never returns an error; every failure becomes a
    /// [`PipelineOutcome::Stopped`] report.
    #[instrument(skip_all, fields(run_id = %state.run_id))]
    pub async fn run(&self, mut state: PipelineState) -> PipelineOutcome {
        let mut node = Stage::SentimentAnalysis;

        loop {
            debug!(stage = %node, retries = state.retries, "entering stage");
            state = self.step(node, state).await;

            match next_stage(node, &state, &self.config.retry) {
                Transition::Goto(next) => node = next,
                Transition::Done => {
                    info!(score = state.score, retries = state.retries, "pipeline complete");
                    return PipelineOutcome::Success(Box::new(state));
                }
                Transition::Fail => return PipelineOutcome::Stopped(handle_error(&state)),
            }
        }
    }

    /// Run one stage against the current state.
    async fn step(&self, node: Stage, state: PipelineState) -> PipelineState {
        match node {
            Stage::SentimentAnalysis => {
                run_sentiment(&self.generation, &self.config.fast_model, state).await
            }
            Stage::FactChecking => {
                let options = FactCheckOptions {
                    model: self.config.fast_model.clone(),
                    rate_limit_ms: self.config.search_rate_limit_ms,
                };
                run_fact_check_stage(&self.generation, &self.search, &options, state).await
            }
            Stage::GeneratePerspective => {
                run_generate_perspective(&self.generation, &self.config.perspective_model, state)
                    .await
            }
            Stage::JudgePerspective => {
                run_judge(&self.generation, &self.config.fast_model, state).await
            }
            Stage::StoreAndSend => {
                run_store_and_send(&self.embedder, &self.store, &self.config.namespace, state).await
            }
        }
    }
}
