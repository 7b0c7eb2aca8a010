//! LLM fact verification: one strict-JSON verdict per (claim, evidence)
//! pair, with tolerant per-item parsing.

use std::sync::LazyLock;

use counterlens_llm::{ChatMessage, ChatRequest, GenerationService};
use counterlens_shared::{CounterlensError, Result, Verification};
use regex::Regex;
use tracing::{debug, warn};

use crate::search::SearchHit;

/// Leading/trailing markdown code fences around a JSON reply.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json)?|```$").expect("valid fence regex"));

const VERIFIER_SYSTEM_PROMPT: &str = "You are a fact-checking assistant. Your job is to \
     determine whether the given claim is True or False based on the provided web search \
     evidence. Keep it concise and structured.";

/// A claim paired with its top search evidence, ready for verification.
#[derive(Debug, Clone)]
pub struct ClaimEvidence {
    pub claim: String,
    pub hit: SearchHit,
}

/// Verify each claim against its evidence.
///
/// A JSON parse failure on one item drops that item with a warning;
/// the call fails only when no item parses successfully.
pub async fn verify_claims<G: GenerationService>(
    generation: &G,
    model: &str,
    evidence: &[ClaimEvidence],
) -> Result<Vec<Verification>> {
    let mut verifications = Vec::with_capacity(evidence.len());

    for item in evidence {
        let request = ChatRequest::new(model, verification_messages(item))
            .with_temperature(0.3)
            .with_max_tokens(256);

        let reply = generation.complete(&request).await?;
        let stripped = strip_code_fences(&reply);

        match serde_json::from_str::<Verification>(stripped) {
            Ok(verification) => {
                debug!(claim = %item.claim, verdict = %verification.verdict, "claim verified");
                verifications.push(verification);
            }
            Err(e) => {
                warn!(claim = %item.claim, error = %e, "dropping unparseable verdict");
            }
        }
    }

    if verifications.is_empty() {
        return Err(CounterlensError::parse(
            "no verification responses could be parsed",
        ));
    }

    Ok(verifications)
}

/// Build the verification prompt for one claim/evidence pair.
fn verification_messages(item: &ClaimEvidence) -> Vec<ChatMessage> {
    let evidence = format!(
        "{}\n{}\nLink: {}",
        item.hit.title, item.hit.snippet, item.hit.link
    );

    vec![
        ChatMessage::system(VERIFIER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Claim: {}\n\n\
             Web Evidence:\n{}\n\n\
             Based on this evidence, is the claim true?\n\
             Respond only in this JSON format:\n\n\
             {{\n  \"verdict\": \"True\" | \"False\",\n  \"explanation\": \"...\",\n  \
             \"original_claim\": \"{}\",\n  \"source_link\": \"{}\"\n}}",
            item.claim, evidence, item.claim, item.hit.link
        )),
    ]
}

/// Strip a leading/trailing markdown code fence from a model reply.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let start = FENCE_RE
        .find(trimmed)
        .filter(|m| m.start() == 0)
        .map_or(0, |m| m.end());
    let rest = &trimmed[start..];
    let end = rest.strip_suffix("```").unwrap_or(rest);
    end.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterlens_shared::Verdict;
    use std::sync::Mutex;

    /// Generation fake that replays a scripted list of replies.
    struct ScriptedGeneration {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedGeneration {
        fn new(replies: &[&str]) -> Self {
            let mut replies: Vec<String> = replies.iter().map(|s| s.to_string()).collect();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    impl GenerationService for ScriptedGeneration {
        async fn complete(&self, _request: &ChatRequest) -> Result<String> {
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop()
                .expect("scripted replies exhausted"))
        }
    }

    fn evidence(claim: &str) -> ClaimEvidence {
        ClaimEvidence {
            claim: claim.into(),
            hit: SearchHit {
                title: "Evidence title".into(),
                link: "https://example.com/a".into(),
                snippet: "Evidence snippet".into(),
            },
        }
    }

    const GOOD_JSON: &str = r#"{"verdict": "True", "explanation": "Matches the report.",
        "original_claim": "Company X doubled profits", "source_link": "https://example.com/a"}"#;

    #[test]
    fn strips_json_fences() {
        let fenced = "```json\n{\"verdict\": \"True\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"verdict\": \"True\"}");

        let bare_fence = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(bare_fence), "{\"a\": 1}");

        let unfenced = "{\"a\": 1}";
        assert_eq!(strip_code_fences(unfenced), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn parses_fenced_verdicts() {
        let generation = ScriptedGeneration::new(&[&format!("```json\n{GOOD_JSON}\n```")]);
        let items = vec![evidence("Company X doubled profits")];

        let verifications = verify_claims(&generation, "gemma2-9b-it", &items)
            .await
            .unwrap();
        assert_eq!(verifications.len(), 1);
        assert_eq!(verifications[0].verdict, Verdict::True);
        assert_eq!(verifications[0].original_claim, "Company X doubled profits");
    }

    #[tokio::test]
    async fn drops_unparseable_items_keeps_rest() {
        let generation = ScriptedGeneration::new(&["not json at all", GOOD_JSON]);
        let items = vec![evidence("bad one"), evidence("good one")];

        let verifications = verify_claims(&generation, "gemma2-9b-it", &items)
            .await
            .unwrap();
        assert_eq!(verifications.len(), 1);
        assert_eq!(verifications[0].explanation, "Matches the report.");
    }

    #[tokio::test]
    async fn fails_when_nothing_parses() {
        let generation = ScriptedGeneration::new(&["garbage", "more garbage"]);
        let items = vec![evidence("a"), evidence("b")];

        let err = verify_claims(&generation, "gemma2-9b-it", &items)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no verification responses"));
    }
}
