//! Sentiment analysis stage: one label for the whole article.

use counterlens_llm::{ChatMessage, ChatRequest, GenerationService};
use counterlens_shared::{PipelineState, Stage, Status};
use tracing::{info, instrument, warn};

const SENTIMENT_SYSTEM_PROMPT: &str = "You are a sentiment analysis assistant. Classify the \
     overall sentiment of the given article as exactly one of: Positive, Negative, or Neutral. \
     Respond with only the single label.";

/// Classify the article sentiment and record the label on the state.
///
/// Only the first line of the reply is kept; a chatty model that
/// appends an explanation does not corrupt the label.
#[instrument(skip_all, fields(run_id = %state.run_id))]
pub async fn run_sentiment<G: GenerationService>(
    generation: &G,
    model: &str,
    mut state: PipelineState,
) -> PipelineState {
    if state.article_text.trim().is_empty() {
        return state.fail(
            Stage::SentimentAnalysis,
            "missing or empty article text in state",
        );
    }

    let request = ChatRequest::new(
        model,
        vec![
            ChatMessage::system(SENTIMENT_SYSTEM_PROMPT),
            ChatMessage::user(format!("Article:\n{}", state.article_text)),
        ],
    )
    .with_temperature(0.3)
    .with_max_tokens(16);

    match generation.complete(&request).await {
        Ok(reply) => {
            let label = reply.lines().next().unwrap_or("").trim().to_string();
            if label.is_empty() {
                return state.fail(
                    Stage::SentimentAnalysis,
                    "empty sentiment reply from generation service",
                );
            }
            info!(sentiment = %label, "sentiment classified");
            state.sentiment = Some(label);
            state.status = Status::Success;
            state
        }
        Err(e) => {
            warn!(error = %e, "sentiment analysis failed");
            let message = e.stage_message().to_string();
            state.fail(Stage::SentimentAnalysis, message)
        }
    }
}
