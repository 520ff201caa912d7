//! Panelist-State: record store for the interview panel
//!
//! This crate owns persistence for candidates, evaluations and settings.
//! The board only ever talks to it through the traits in `storage_traits`,
//! so tests run against `fakes::MemoryRecordStore` and production runs
//! against `SurrealHandle`.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: one evaluation per (candidate, evaluator), cascading deletes,
//! newest-first listings.
//!
//! ## Key Components
//!
//! - `SurrealHandle`: SurrealDB connection implementing every store trait
//! - `MemoryRecordStore`: in-process fake with an offline switch
//! - `migrations::init_schema`: idempotent table and index setup

mod error;
pub mod fakes;
mod handle;
pub mod migrations;
mod schema;
pub mod storage_traits;

pub use error::{RecordKind, StateError, StorageError};
pub use fakes::MemoryRecordStore;
pub use handle::{CloudConfig, SurrealHandle};
pub use storage_traits::{
    CandidateId, CandidateInfo, CandidatePatch, CandidateRecord, CandidateStore, EvaluationId,
    EvaluationPatch, EvaluationRecord, EvaluationStore, EvaluationUpsert, Polarity, RecordStore,
    ScoreMap, SettingStore, StorageResult, Tag,
};

/// Result type for panelist-state setup operations
pub type Result<T> = std::result::Result<T, StateError>;
