//! Panelist Core Library
//!
//! Rubric scoring, multi-evaluator aggregation and live candidate ranking.
//!
//! ## Layer 1 - Domain
//!
//! - `aggregate` / `ranking`: pure functions from evaluation totals to a
//!   ranked leaderboard
//! - `board`: shared coordinator over a `RecordStore` with an optimistic,
//!   ranked snapshot
//! - `session`: one evaluator's draft and its save state machine
//! - `auth`, `identity`, `intake`, `timer`: the interviewer-facing extras

pub mod aggregate;
pub mod auth;
pub mod board;
pub mod config;
pub mod domain;
pub mod identity;
pub mod intake;
pub mod metrics;
pub mod obs;
pub mod ranking;
pub mod rubric_registry;
pub mod session;
pub mod telemetry;
pub mod timer;

pub use aggregate::{aggregate, aggregate_evaluations, percentage, round1, Aggregate, TRIM_QUORUM};
pub use auth::{login, logout, require_session, sha256_hex, Credentials, LoginSession};
pub use board::{rubric_total, Board, BoardSnapshot, CandidateDetail, EvaluationSubmission};
pub use config::PanelConfig;
pub use domain::{
    parse_tag, score_band, toggle_tag, CategoryScore, PanelError, Result, Rubric, RubricCategory,
    RubricItem, ScoreBand, ValidationError, NEGATIVE_TAGS, POSITIVE_TAGS,
};
pub use identity::{generate_device_token, EvaluatorIdentity};
pub use intake::{blank_info, parse_document, CandidateIntake, INFO_FIELDS};
pub use ranking::{rank_candidates, LeaderboardEntry};
pub use rubric_registry::{RubricRegistry, RUBRIC_SETTING_KEY};
pub use session::{
    ChecklistStep, DraftIdentity, EvaluationDraft, EvaluationSession, SessionState,
};
pub use telemetry::init_tracing;
pub use timer::{InterviewTimer, TimerPhase};

pub use panelist_state::{
    CandidateId, CandidateInfo, CandidatePatch, CandidateRecord, EvaluationId, EvaluationRecord,
    MemoryRecordStore, Polarity, RecordStore, ScoreMap, StorageError, SurrealHandle, Tag,
};
