//! Core domain types for the Counterlens analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One discrete, independently failable step of the pipeline.
///
/// The snake_case names appear verbatim in `error_from` fields of the
/// serialized outcome, so they are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SentimentAnalysis,
    FactChecking,
    GeneratePerspective,
    JudgePerspective,
    StoreAndSend,
}

impl Stage {
    /// The stage name as it appears in error reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentimentAnalysis => "sentiment_analysis",
            Self::FactChecking => "fact_checking",
            Self::GeneratePerspective => "generate_perspective",
            Self::JudgePerspective => "judge_perspective",
            Self::StoreAndSend => "store_and_send",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Pipeline state status, set by the most recent stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Success,
    Error,
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// The True/False judgment attached to a claim after evidence review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => f.write_str("True"),
            Self::False => f.write_str("False"),
        }
    }
}

/// A verified claim with its verdict, explanation, and evidence source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// The claim as originally extracted from the article.
    pub original_claim: String,
    /// True/False judgment.
    pub verdict: Verdict,
    /// Short explanation of the judgment.
    pub explanation: String,
    /// Link to the web evidence the judgment is based on.
    pub source_link: String,
}

impl Verification {
    /// Whether every text field is populated. The chunker requires this
    /// before a verification may be indexed.
    pub fn is_complete(&self) -> bool {
        !self.original_claim.trim().is_empty()
            && !self.explanation.trim().is_empty()
            && !self.source_link.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// PerspectiveResult
// ---------------------------------------------------------------------------

/// Structured counter-perspective output from the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveResult {
    /// Chain-of-thought reasoning steps.
    pub reasoning: String,
    /// The generated opposite perspective.
    pub perspective: String,
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// The stage that reported a failure, plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    /// Stage that produced the error.
    pub source: Stage,
    /// Human-readable description (no stack traces).
    pub message: String,
}

/// Mutable record threaded through every pipeline stage.
///
/// Stages take the state by value and return a new one; no stage
/// mutates a field it does not own. The only exception spelled out in
/// the contract is `retries`, which only the perspective generator
/// increments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Identifier for this run, used for log correlation.
    pub run_id: RunId,
    /// Cleaned article text, immutable after ingestion.
    pub article_text: String,
    /// Keywords from the upstream extraction collaborator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Per-claim verification results from the fact-check stage.
    #[serde(default)]
    pub facts: Vec<Verification>,
    /// Article sentiment label, populated once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    /// Generated counter-perspective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<PerspectiveResult>,
    /// Judge score in 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    /// Perspective-generation attempts made so far.
    #[serde(default)]
    pub retries: u32,
    /// Status set by the most recent stage.
    #[serde(default)]
    pub status: Status,
    /// Failure details when `status == Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
    /// When the run was created.
    pub started_at: DateTime<Utc>,
}

impl PipelineState {
    /// Create a fresh pending state for the given article text.
    pub fn new(article_text: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            article_text: article_text.into(),
            keywords: Vec::new(),
            facts: Vec::new(),
            sentiment: None,
            perspective: None,
            score: None,
            retries: 0,
            status: Status::Pending,
            error: None,
            started_at: Utc::now(),
        }
    }

    /// Attach keywords from the upstream extraction step.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Mark the state as failed at the given stage.
    pub fn fail(mut self, source: Stage, message: impl Into<String>) -> Self {
        self.status = Status::Error;
        self.error = Some(StageError {
            source,
            message: message.into(),
        });
        self
    }
}

// ---------------------------------------------------------------------------
// PipelineOutcome
// ---------------------------------------------------------------------------

/// Terminal report produced by the error handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppedReport {
    /// Always `"stopped_due_to_error"`.
    pub status: String,
    /// Name of the failing stage.
    pub from: Vec<String>,
    /// Human-readable failure message.
    pub error: Vec<String>,
}

/// Final result of a pipeline run, serialized as the response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineOutcome {
    /// The run reached `store_and_send` and the chunks were persisted.
    Success(Box<PipelineState>),
    /// Some stage reported an error and the run was terminated.
    Stopped(StoppedReport),
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// An atomic unit of text + metadata prepared for vector indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier derived from the article text.
    pub id: String,
    /// The text to embed.
    pub text: String,
    /// Metadata stored alongside the vector.
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn stage_names_are_wire_contract() {
        assert_eq!(Stage::SentimentAnalysis.as_str(), "sentiment_analysis");
        assert_eq!(Stage::FactChecking.as_str(), "fact_checking");
        assert_eq!(Stage::GeneratePerspective.as_str(), "generate_perspective");
        assert_eq!(Stage::JudgePerspective.as_str(), "judge_perspective");
        assert_eq!(Stage::StoreAndSend.as_str(), "store_and_send");

        let json = serde_json::to_string(&Stage::FactChecking).unwrap();
        assert_eq!(json, r#""fact_checking""#);
    }

    #[test]
    fn verdict_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Verdict::True).unwrap(), r#""True""#);
        assert_eq!(serde_json::to_string(&Verdict::False).unwrap(), r#""False""#);

        let parsed: Verdict = serde_json::from_str(r#""True""#).unwrap();
        assert_eq!(parsed, Verdict::True);
    }

    #[test]
    fn fresh_state_is_pending() {
        let state = PipelineState::new("Some article text.");
        assert_eq!(state.status, Status::Pending);
        assert_eq!(state.retries, 0);
        assert!(state.facts.is_empty());
        assert!(state.sentiment.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn fail_records_stage_and_message() {
        let state = PipelineState::new("text").fail(Stage::JudgePerspective, "no score");
        assert_eq!(state.status, Status::Error);
        let err = state.error.expect("error set");
        assert_eq!(err.source, Stage::JudgePerspective);
        assert_eq!(err.message, "no score");
    }

    #[test]
    fn verification_completeness() {
        let v = Verification {
            original_claim: "Company X doubled profits".into(),
            verdict: Verdict::True,
            explanation: "Confirmed by the quarterly report.".into(),
            source_link: "https://example.com/report".into(),
        };
        assert!(v.is_complete());

        let incomplete = Verification {
            explanation: " ".into(),
            ..v
        };
        assert!(!incomplete.is_complete());
    }

    #[test]
    fn stopped_report_serializes_as_arrays() {
        let report = StoppedReport {
            status: "stopped_due_to_error".into(),
            from: vec!["fact_checking".into()],
            error: vec!["No verifiable claims found.".into()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "stopped_due_to_error");
        assert_eq!(json["from"][0], "fact_checking");
        assert_eq!(json["error"][0], "No verifiable claims found.");
    }

    #[test]
    fn outcome_roundtrip() {
        let outcome = PipelineOutcome::Stopped(StoppedReport {
            status: "stopped_due_to_error".into(),
            from: vec!["sentiment_analysis".into()],
            error: vec!["missing or empty article text".into()],
        });
        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: PipelineOutcome = serde_json::from_str(&json).unwrap();
        match parsed {
            PipelineOutcome::Stopped(r) => assert_eq!(r.from, vec!["sentiment_analysis"]),
            PipelineOutcome::Success(_) => panic!("expected Stopped"),
        }
    }
}
