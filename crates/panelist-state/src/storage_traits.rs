//! Storage trait definitions for Panelist
//!
//! These traits define the record store the board runs against:
//! - `CandidateStore`: candidate records (create/update/cascading delete)
//! - `EvaluationStore`: evaluation records, upserted per (candidate, evaluator)
//! - `SettingStore`: named JSON settings (the active rubric lives here)
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Free-form candidate details (contact and narrative fields), keyed by field name.
pub type CandidateInfo = BTreeMap<String, String>;

/// Awarded score per rubric field key.
pub type ScoreMap = BTreeMap<String, u32>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Durable candidate identity, assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    /// Generate a new random CandidateId
    pub fn new() -> Self {
        CandidateId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        CandidateId(s.to_string())
    }
}

/// Identity of a single stored evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl EvaluationId {
    /// Generate a new random EvaluationId
    pub fn new() -> Self {
        EvaluationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EvaluationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EvaluationId {
    fn from(s: &str) -> Self {
        EvaluationId(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Whether a qualitative tag counts for or against the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Positive => f.write_str("positive"),
            Polarity::Negative => f.write_str("negative"),
        }
    }
}

/// A qualitative tag attached to an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub text: String,
    pub polarity: Polarity,
}

impl Tag {
    pub fn positive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            polarity: Polarity::Positive,
        }
    }

    pub fn negative(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            polarity: Polarity::Negative,
        }
    }
}

/// A persisted candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_id: CandidateId,
    pub name: String,
    pub info: CandidateInfo,
    pub created_at: DateTime<Utc>,
}

/// Fields to change on an existing candidate. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePatch {
    pub name: Option<String>,
    pub info: Option<CandidateInfo>,
}

/// A persisted evaluation: one evaluator's scores for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub evaluation_id: EvaluationId,
    pub candidate_id: CandidateId,
    /// Opaque evaluator key (device token or display name)
    pub evaluator_id: String,
    pub scores: ScoreMap,
    /// Sum of awarded scores, fixed at save time
    pub total: u32,
    pub tags: Vec<Tag>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `EvaluationStore::upsert_evaluation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationUpsert {
    pub candidate_id: CandidateId,
    pub evaluator_id: String,
    pub scores: ScoreMap,
    pub total: u32,
    pub tags: Vec<Tag>,
    pub note: Option<String>,
}

/// Operator corrections to a stored evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPatch {
    /// Re-key the evaluation to another evaluator
    pub evaluator_id: Option<String>,
    /// Replace the note
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Candidate persistence.
///
/// Guarantees:
/// - `create_candidate` assigns a fresh durable `CandidateId`.
/// - `list_candidates` returns newest first.
/// - `delete_candidate` removes the candidate and all of its evaluations, or
///   nothing at all.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// List every candidate, newest first.
    async fn list_candidates(&self) -> StorageResult<Vec<CandidateRecord>>;

    /// Create a candidate and return it with its durable identity.
    async fn create_candidate(
        &self,
        name: &str,
        info: CandidateInfo,
    ) -> StorageResult<CandidateRecord>;

    /// Apply `patch` to an existing candidate. `NotFound` if absent.
    async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> StorageResult<CandidateRecord>;

    /// Delete a candidate together with its evaluations. `NotFound` if absent.
    async fn delete_candidate(&self, id: &CandidateId) -> StorageResult<()>;
}

/// Evaluation persistence.
///
/// Guarantees:
/// - At most one evaluation exists per `(candidate_id, evaluator_id)`.
/// - `upsert_evaluation` replaces the existing record for that pair, keeping
///   its `evaluation_id` and `created_at`; it never touches another
///   evaluator's record.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// List every evaluation, newest first.
    async fn list_evaluations(&self) -> StorageResult<Vec<EvaluationRecord>>;

    /// Insert or replace the evaluation keyed by `(candidate_id, evaluator_id)`.
    /// `NotFound` if the candidate does not exist.
    async fn upsert_evaluation(&self, upsert: EvaluationUpsert)
        -> StorageResult<EvaluationRecord>;

    /// Apply an operator correction. `Conflict` if re-keying would collide
    /// with another evaluation of the same candidate.
    async fn update_evaluation(
        &self,
        id: &EvaluationId,
        patch: EvaluationPatch,
    ) -> StorageResult<EvaluationRecord>;

    /// Delete a single evaluation. `NotFound` if absent.
    async fn delete_evaluation(&self, id: &EvaluationId) -> StorageResult<()>;
}

/// Named JSON settings.
#[async_trait]
pub trait SettingStore: Send + Sync {
    /// Read a setting, `None` when never written.
    async fn get_setting(&self, key: &str) -> StorageResult<Option<serde_json::Value>>;

    /// Create or overwrite a setting.
    async fn upsert_setting(&self, key: &str, value: serde_json::Value) -> StorageResult<()>;
}

/// Everything the board needs from a backend.
pub trait RecordStore: CandidateStore + EvaluationStore + SettingStore {}

impl<T> RecordStore for T where T: CandidateStore + EvaluationStore + SettingStore {}
