//! Terminal error handler: one stopped report, never a panic.

use counterlens_shared::{PipelineState, StoppedReport};
use tracing::error;

/// Convert a failed state into the terminal stopped report.
///
/// Tolerates a missing error field (a stage that set error status
/// without details) by reporting "unknown" rather than failing the
/// failure path itself.
pub fn handle_error(state: &PipelineState) -> StoppedReport {
    let (from, message) = match &state.error {
        Some(err) => (err.source.as_str().to_string(), err.message.clone()),
        None => ("unknown".to_string(), "unknown error".to_string()),
    };

    error!(run_id = %state.run_id, stage = %from, %message, "pipeline stopped");

    StoppedReport {
        status: "stopped_due_to_error".into(),
        from: vec![from],
        error: vec![message],
    }
}
