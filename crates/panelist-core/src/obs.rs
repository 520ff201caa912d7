//! Structured observability hooks for board and session lifecycle events.
//!
//! This module provides:
//! - Evaluator-scoped tracing spans via the `SessionSpan` RAII guard
//! - Emission functions for key events: saves, creations, deletions,
//!   leaderboard recomputes, rollbacks and rubric replacement
//!
//! Events are emitted at `info!` level, failures at `warn!`. Filter with
//! `RUST_LOG`; pass `--log-json` to the CLI for JSON lines.

use tracing::{info, warn};

/// RAII guard that enters an evaluator-scoped span for the life of a session.
///
/// ```ignore
/// let _span = SessionSpan::enter("interviewer_1700000000000_abc123def");
/// // every event below is tagged with evaluator_id
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    /// Create and enter a span tagged with the evaluator id.
    pub fn enter(evaluator_id: &str) -> Self {
        let span = tracing::info_span!("panelist.session", evaluator_id = %evaluator_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: an evaluation was upserted.
pub fn emit_evaluation_saved(candidate_id: &str, evaluator_id: &str, total: u32) {
    info!(
        event = "evaluation.saved",
        candidate_id = %candidate_id,
        evaluator_id = %evaluator_id,
        total = total,
    );
}

/// Emit event: a candidate got a durable identity.
pub fn emit_candidate_created(candidate_id: &str, name: &str) {
    info!(event = "candidate.created", candidate_id = %candidate_id, name = %name);
}

/// Emit event: a candidate and its evaluations were deleted.
pub fn emit_candidate_deleted(candidate_id: &str, evaluations_removed: usize) {
    info!(
        event = "candidate.deleted",
        candidate_id = %candidate_id,
        evaluations_removed = evaluations_removed,
    );
}

/// Emit event: a single evaluation was deleted.
pub fn emit_evaluation_deleted(evaluation_id: &str, candidate_id: &str) {
    info!(
        event = "evaluation.deleted",
        evaluation_id = %evaluation_id,
        candidate_id = %candidate_id,
    );
}

/// Emit event: the leaderboard was recomputed.
pub fn emit_leaderboard_recomputed(candidates: usize, evaluations: usize) {
    info!(
        event = "leaderboard.recomputed",
        candidates = candidates,
        evaluations = evaluations,
    );
}

/// Emit event: a session save failed (warning level).
pub fn emit_save_failed(candidate: &str, error: &dyn std::fmt::Display) {
    warn!(event = "save.failed", candidate = %candidate, error = %error);
}

/// Emit event: an optimistic local change was reverted (warning level).
pub fn emit_rollback_applied(operation: &str, target_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "rollback.applied",
        operation = %operation,
        target_id = %target_id,
        error = %error,
    );
}

/// Emit event: the active rubric was replaced.
pub fn emit_rubric_replaced(items: usize, total_maximum: u32) {
    info!(
        event = "rubric.replaced",
        items = items,
        total_maximum = total_maximum,
    );
}
