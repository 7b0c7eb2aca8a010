//! The Counterlens analysis pipeline: a finite-state workflow that runs
//! sentiment analysis, fact checking, perspective generation, quality
//! judging with a bounded retry loop, and chunk storage, with
//! centralized error termination.
//!
//! Each stage receives the full current [`PipelineState`] and returns a
//! new one; no stage error ever crosses a stage boundary — failures are
//! recorded on the state and the orchestrator routes them to the
//! terminal error handler.

mod error_handler;
mod fact_check;
mod judge;
mod machine;
mod perspective;
mod sentiment;
mod store;

pub use error_handler::handle_error;
pub use fact_check::run_fact_check_stage;
pub use judge::run_judge;
pub use machine::{Pipeline, PipelineConfig, RetryPolicy, Transition, next_stage};
pub use perspective::run_generate_perspective;
pub use sentiment::run_sentiment;
pub use store::run_store_and_send;
