//! Judge stage: score the generated perspective 0..=100.

use std::sync::LazyLock;

use counterlens_llm::{ChatMessage, ChatRequest, GenerationService};
use counterlens_shared::{PipelineState, Stage, Status};
use regex::Regex;
use tracing::{info, instrument, warn};

/// First run of up to three digits anywhere in the reply.
static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})\b").expect("valid score regex"));

const JUDGE_SYSTEM_PROMPT: &str = "You are an expert evaluator. Score the given counter-perspective \
     for coherence, factual grounding, and persuasiveness. Respond with ONLY a single integer \
     score from 0 to 100.";

/// Score the perspective against the article and verified facts.
///
/// The reply is scanned for the first integer; anything above 100 is
/// clamped. A reply with no integer at all is a stage error.
#[instrument(skip_all, fields(run_id = %state.run_id))]
pub async fn run_judge<G: GenerationService>(
    generation: &G,
    model: &str,
    mut state: PipelineState,
) -> PipelineState {
    let Some(perspective) = state.perspective.clone() else {
        return state.fail(
            Stage::JudgePerspective,
            "missing or empty perspective for scoring",
        );
    };
    if perspective.perspective.trim().is_empty() {
        return state.fail(
            Stage::JudgePerspective,
            "missing or empty perspective for scoring",
        );
    }

    let request = ChatRequest::new(
        model,
        vec![
            ChatMessage::system(JUDGE_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Article:\n{}\n\nCounter-perspective:\n{}",
                state.article_text, perspective.perspective
            )),
        ],
    )
    .with_temperature(0.0)
    .with_max_tokens(10);

    match generation.complete(&request).await {
        Ok(reply) => match parse_score(&reply) {
            Some(score) => {
                info!(score, retries = state.retries, "perspective scored");
                state.score = Some(score);
                state.status = Status::Success;
                state
            }
            None => {
                warn!(reply = %reply, "no integer score in judge reply");
                state.fail(
                    Stage::JudgePerspective,
                    format!("could not parse a score from '{reply}'"),
                )
            }
        },
        Err(e) => {
            warn!(error = %e, "judge call failed");
            let message = e.stage_message().to_string();
            state.fail(Stage::JudgePerspective, message)
        }
    }
}

/// Extract the first integer from the reply, clamped to 100.
fn parse_score(reply: &str) -> Option<u8> {
    let captures = SCORE_RE.captures(reply)?;
    let raw: u32 = captures[1].parse().ok()?;
    Some(raw.min(100) as u8)
}
