//! Fact-check coordinator: claims → evidence search → verification.

use std::time::Duration;

use counterlens_llm::GenerationService;
use counterlens_shared::{CounterlensError, Result, Verification};
use tracing::{info, instrument, warn};

use crate::claims::extract_claims;
use crate::search::EvidenceSearch;
use crate::verifier::{ClaimEvidence, verify_claims};

/// Coordinator knobs; the generation model and the pacing of per-claim
/// search calls.
#[derive(Debug, Clone)]
pub struct FactCheckOptions {
    /// Model used for both claim extraction and verification.
    pub model: String,
    /// Minimum ms between per-claim search calls (third-party quota).
    /// Zero disables the delay; only throughput is affected.
    pub rate_limit_ms: u64,
}

impl Default for FactCheckOptions {
    fn default() -> Self {
        Self {
            model: "gemma2-9b-it".into(),
            rate_limit_ms: 1000,
        }
    }
}

/// Run the full fact-check stage over the article text.
///
/// Failure conditions, in order:
/// - no claims parsed from the extractor reply,
/// - every claim search failed or returned no results,
/// - no verification reply parsed.
///
/// Per-claim ordering of the output follows the claim extraction order.
#[instrument(skip_all, fields(article_len = article_text.len()))]
pub async fn run_fact_check<G, S>(
    generation: &G,
    search: &S,
    options: &FactCheckOptions,
    article_text: &str,
) -> Result<Vec<Verification>>
where
    G: GenerationService,
    S: EvidenceSearch,
{
    // Step 1: extract claims.
    let claims = extract_claims(generation, &options.model, article_text).await?;
    if claims.is_empty() {
        return Err(CounterlensError::validation("No verifiable claims found."));
    }

    // Step 2: search each claim sequentially, keeping only the top hit.
    // Claims with no evidence are skipped, not fatal.
    let mut evidence = Vec::with_capacity(claims.len());
    for (i, claim) in claims.iter().enumerate() {
        if i > 0 && options.rate_limit_ms > 0 {
            tokio::time::sleep(Duration::from_millis(options.rate_limit_ms)).await;
        }

        match search.search(&claim.text, 1).await {
            Ok(hits) => match hits.into_iter().next() {
                Some(hit) => {
                    info!(claim = %claim.text, title = %hit.title, "evidence found");
                    evidence.push(ClaimEvidence {
                        claim: claim.text.clone(),
                        hit,
                    });
                }
                None => warn!(claim = %claim.text, "no search result, skipping claim"),
            },
            Err(e) => warn!(claim = %claim.text, error = %e, "search failed, skipping claim"),
        }
    }

    if evidence.is_empty() {
        return Err(CounterlensError::Search(
            "All claim searches failed or returned no results.".into(),
        ));
    }

    // Step 3: verify each claim against its evidence.
    verify_claims(generation, &options.model, &evidence).await
}
