//! Fact-checking for Counterlens: claim extraction, web evidence
//! search, and LLM verification, composed by the coordinator.
//!
//! Each sub-step is independently failable. Per-item failures inside
//! the search and verification loops are logged and tolerated; only a
//! total failure of a loop becomes a stage-level error.

mod claims;
mod coordinator;
mod search;
mod verifier;

pub use claims::{Claim, extract_claims};
pub use coordinator::{FactCheckOptions, run_fact_check};
pub use search::{EvidenceSearch, HttpSearchClient, SearchHit};
pub use verifier::{ClaimEvidence, strip_code_fences, verify_claims};
