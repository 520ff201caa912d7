//! Observability tests for board and session lifecycle tracing.
//!
//! These tests verify that structured tracing events are emitted for key
//! lifecycle events: candidate creation, evaluation saves, deletes,
//! rollbacks and rubric replacement.

use std::sync::Arc;

use panelist_core::obs::{
    emit_candidate_created, emit_evaluation_saved, emit_rollback_applied, emit_save_failed,
    SessionSpan,
};
use panelist_core::{blank_info, Board, EvaluationSession, MemoryRecordStore, Rubric};
use tracing_test::traced_test;

/// Test: emit_evaluation_saved creates an info-level event
#[traced_test]
#[test]
fn test_emit_evaluation_saved_logs_ids_and_total() {
    emit_evaluation_saved("cand-123", "interviewer_1", 31);

    assert!(logs_contain("evaluation.saved"));
    assert!(logs_contain("cand-123"));
    assert!(logs_contain("total=31"));
}

/// Test: emit_candidate_created creates an info-level event
#[traced_test]
#[test]
fn test_emit_candidate_created_logs_name() {
    emit_candidate_created("cand-456", "Kim Minji");

    assert!(logs_contain("candidate.created"));
    assert!(logs_contain("Kim Minji"));
}

/// Test: failures are logged at warn level
#[traced_test]
#[test]
fn test_emit_failures_log_warnings() {
    emit_save_failed("draft_abc", &"store offline");
    emit_rollback_applied("delete_candidate", "cand-789", &"store offline");

    assert!(logs_contain("WARN"));
    assert!(logs_contain("save.failed"));
    assert!(logs_contain("rollback.applied"));
    assert!(logs_contain("cand-789"));
}

/// Test: SessionSpan::enter tags nested events with the evaluator
#[traced_test]
#[test]
fn test_session_span_tags_events() {
    let span = SessionSpan::enter("interviewer_span_test");
    emit_candidate_created("cand-span", "Lee");
    drop(span);

    assert!(logs_contain("interviewer_span_test"));
}

/// Test: a session save emits creation, save and recompute events
#[traced_test]
#[tokio::test]
async fn test_session_save_emits_lifecycle_events() {
    let store = Arc::new(MemoryRecordStore::new());
    let board = Board::open(store).await.unwrap();
    let mut session = EvaluationSession::new("alice", board.rubric().await);
    session.start_new_candidate_draft(&board).await;
    session.set_candidate_name(&board, "Park").await.unwrap();
    session.set_score("logic", 5);
    session.save(&board).await.unwrap();

    assert!(logs_contain("candidate.created"));
    assert!(logs_contain("evaluation.saved"));
    assert!(logs_contain("leaderboard.recomputed"));
}

/// Test: a failed delete logs the rollback
#[traced_test]
#[tokio::test]
async fn test_failed_delete_logs_rollback() {
    let store = Arc::new(MemoryRecordStore::new());
    let board = Board::open(store.clone()).await.unwrap();
    let kim = board.create_candidate("Kim", blank_info()).await.unwrap();

    store.set_offline(true);
    assert!(board.delete_candidate(&kim.candidate_id).await.is_err());

    assert!(logs_contain("rollback.applied"));
    assert!(logs_contain("delete_candidate"));
}

/// Test: replacing the rubric logs the new total
#[traced_test]
#[tokio::test]
async fn test_rubric_reset_logs_replacement() {
    let store = Arc::new(MemoryRecordStore::new());
    let board = Board::open(store).await.unwrap();
    board.reset_rubric().await.unwrap();

    assert!(logs_contain("rubric.replaced"));
    assert!(logs_contain(&format!(
        "total_maximum={}",
        Rubric::default().total_maximum()
    )));
}
