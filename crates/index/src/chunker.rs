//! Chunking of validated pipeline output into ID-stable records.
//!
//! Chunk identifiers are a deterministic function of the article text,
//! so re-indexing the same article overwrites rather than duplicates.
//! Validation fails closed: a partial chunk set is never emitted.

use counterlens_shared::{Chunk, CounterlensError, PipelineState, Result};
use sha2::{Digest, Sha256};

/// Compute the stable article identifier for a text:
/// `"article-"` + first 15 hex characters of SHA-256(text).
pub fn generate_id(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(CounterlensError::validation(
            "cannot generate id for empty text",
        ));
    }
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    Ok(format!("article-{}", &digest[..15]))
}

/// Split a successful pipeline state into one counter-perspective chunk
/// plus one chunk per fact.
pub fn chunk_pipeline_output(state: &PipelineState) -> Result<Vec<Chunk>> {
    if state.article_text.trim().is_empty() {
        return Err(CounterlensError::validation(
            "missing required field: article_text",
        ));
    }

    let perspective = state.perspective.as_ref().ok_or_else(|| {
        CounterlensError::validation("missing required field: perspective")
    })?;

    if perspective.perspective.trim().is_empty() || perspective.reasoning.trim().is_empty() {
        return Err(CounterlensError::validation(
            "perspective is missing reasoning or perspective text",
        ));
    }

    let article_id = generate_id(&state.article_text)?;
    let mut chunks = Vec::with_capacity(state.facts.len() + 1);

    chunks.push(Chunk {
        id: format!("{article_id}-perspective"),
        text: perspective.perspective.clone(),
        metadata: serde_json::json!({
            "type": "counter-perspective",
            "reasoning": perspective.reasoning,
            "article_id": article_id,
        }),
    });

    for (i, fact) in state.facts.iter().enumerate() {
        if !fact.is_complete() {
            return Err(CounterlensError::validation(format!(
                "missing required fact field in fact index {i}"
            )));
        }

        chunks.push(Chunk {
            id: format!("{article_id}-fact-{i}"),
            text: fact.original_claim.clone(),
            metadata: serde_json::json!({
                "type": "fact",
                "verdict": fact.verdict,
                "explanation": fact.explanation,
                "source_link": fact.source_link,
                "article_id": article_id,
            }),
        });
    }

    Ok(chunks)
}
