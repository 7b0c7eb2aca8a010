//! Claim extraction: ask the generation service for bullet-point
//! claims and parse them out of the reply.

use std::sync::LazyLock;

use counterlens_llm::{ChatMessage, ChatRequest, GenerationService};
use counterlens_shared::Result;
use regex::Regex;
use tracing::info;

/// Line-anchored bullet marker pattern (`*`, `-`, `•`).
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[*\-•]\s+(.*)").expect("valid bullet regex"));

const EXTRACTOR_SYSTEM_PROMPT: &str = "You are an assistant that extracts verifiable factual \
     claims from articles. Each claim must be short, fact-based, and independently verifiable \
     through internet search. Only return a list of 3 clear bullet-point claims.";

/// A short factual assertion extracted from article text, intended to
/// be independently verifiable. Transient — never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub text: String,
}

/// Extract verifiable claims from the article text.
///
/// An empty claim list after parsing is a non-fatal empty result, not
/// an error — the coordinator decides how to surface it.
pub async fn extract_claims<G: GenerationService>(
    generation: &G,
    model: &str,
    article_text: &str,
) -> Result<Vec<Claim>> {
    let request = ChatRequest::new(
        model,
        vec![
            ChatMessage::system(EXTRACTOR_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Extract verifiable claims from the following article:\n\n{article_text}"
            )),
        ],
    )
    .with_temperature(0.3)
    .with_max_tokens(512);

    let reply = generation.complete(&request).await?;
    let claims = parse_bullet_claims(&reply);

    info!(count = claims.len(), "extracted claims");
    Ok(claims)
}

/// Parse bullet-marked lines out of a model reply.
fn parse_bullet_claims(reply: &str) -> Vec<Claim> {
    BULLET_RE
        .captures_iter(reply)
        .filter_map(|cap| {
            let text = cap[1].trim();
            (!text.is_empty()).then(|| Claim {
                text: text.to_string(),
            })
        })
        .collect()
}
