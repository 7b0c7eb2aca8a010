//! Fact-checking stage adapter: coordinator result onto the state.

use counterlens_factcheck::{EvidenceSearch, FactCheckOptions, run_fact_check};
use counterlens_llm::GenerationService;
use counterlens_shared::{PipelineState, Stage, Status};
use tracing::{info, instrument, warn};

/// Run the fact-check coordinator and fold the result into the state.
///
/// Any coordinator failure becomes an error-status state attributed to
/// `fact_checking`; nothing propagates past the stage boundary.
#[instrument(skip_all, fields(run_id = %state.run_id))]
pub async fn run_fact_check_stage<G, S>(
    generation: &G,
    search: &S,
    options: &FactCheckOptions,
    mut state: PipelineState,
) -> PipelineState
where
    G: GenerationService,
    S: EvidenceSearch,
{
    if state.article_text.trim().is_empty() {
        return state.fail(Stage::FactChecking, "missing or empty article text in state");
    }

    match run_fact_check(generation, search, options, &state.article_text).await {
        Ok(facts) => {
            info!(facts = facts.len(), "fact check complete");
            state.facts = facts;
            state.status = Status::Success;
            state
        }
        Err(e) => {
            warn!(error = %e, "fact check failed");
            let message = e.stage_message().to_string();
            state.fail(Stage::FactChecking, message)
        }
    }
}
