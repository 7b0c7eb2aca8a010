//! Counter-perspective generation stage.

use counterlens_factcheck::strip_code_fences;
use counterlens_llm::{ChatMessage, ChatRequest, GenerationService};
use counterlens_shared::{PerspectiveResult, PipelineState, Stage, Status, Verification};
use tracing::{info, instrument, warn};

const PERSPECTIVE_SYSTEM_PROMPT: &str = "You are a thoughtful analyst. Given an article, its \
     sentiment, and a list of fact-checked claims, write a well-reasoned opposite perspective \
     that challenges the article's framing while staying consistent with the verified facts.";

/// Generate the opposite perspective for the article.
///
/// The attempt counter is incremented before the service call, so a
/// failed attempt still counts toward the retry cap.
#[instrument(skip_all, fields(run_id = %state.run_id, attempt = state.retries + 1))]
pub async fn run_generate_perspective<G: GenerationService>(
    generation: &G,
    model: &str,
    mut state: PipelineState,
) -> PipelineState {
    state.retries += 1;

    if state.article_text.trim().is_empty() {
        return state.fail(
            Stage::GeneratePerspective,
            "missing or empty article text in state",
        );
    }
    if state.facts.is_empty() {
        return state.fail(
            Stage::GeneratePerspective,
            "no fact-check results available for perspective generation",
        );
    }

    let request = ChatRequest::new(model, perspective_messages(&state))
        .with_temperature(0.7)
        .with_max_tokens(1024);

    match generation.complete(&request).await {
        Ok(reply) => match parse_perspective(&reply) {
            Ok(result) => {
                info!(attempt = state.retries, "perspective generated");
                state.perspective = Some(result);
                state.status = Status::Success;
                state
            }
            Err(message) => {
                warn!(attempt = state.retries, %message, "unusable perspective reply");
                state.fail(Stage::GeneratePerspective, message)
            }
        },
        Err(e) => {
            warn!(attempt = state.retries, error = %e, "perspective generation failed");
            let message = e.stage_message().to_string();
            state.fail(Stage::GeneratePerspective, message)
        }
    }
}

/// Build the generation prompt from the accumulated state.
fn perspective_messages(state: &PipelineState) -> Vec<ChatMessage> {
    let sentiment = state.sentiment.as_deref().unwrap_or("neutral");
    let facts = state
        .facts
        .iter()
        .map(fact_line)
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(PERSPECTIVE_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Article:\n{}\n\n\
             Article sentiment: {sentiment}\n\n\
             Fact-checked claims:\n{facts}\n\n\
             Write the opposite perspective. Respond only in this JSON format:\n\n\
             {{\n  \"reasoning\": \"step-by-step reasoning\",\n  \
             \"perspective\": \"the opposite perspective\"\n}}",
            state.article_text
        )),
    ]
}

fn fact_line(fact: &Verification) -> String {
    format!(
        "Claim: {}\nVerdict: {}\nExplanation: {}",
        fact.original_claim, fact.verdict, fact.explanation
    )
}

/// Parse the strict-JSON reply, rejecting empty fields.
fn parse_perspective(reply: &str) -> std::result::Result<PerspectiveResult, String> {
    let stripped = strip_code_fences(reply);
    let result: PerspectiveResult = serde_json::from_str(stripped)
        .map_err(|e| format!("could not parse perspective reply as JSON: {e}"))?;

    if result.reasoning.trim().is_empty() || result.perspective.trim().is_empty() {
        return Err("perspective reply is missing reasoning or perspective text".into());
    }
    Ok(result)
}
