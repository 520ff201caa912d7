//! Error types for panelist-state

use thiserror::Error;

/// Errors raised while connecting to or preparing a backend
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors returned by the record store traits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No record of `kind` with identifier `id`
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// The write would break the one-evaluation-per-evaluator invariant
    #[error("evaluator {evaluator_id} already has an evaluation for candidate {candidate_id}")]
    Conflict {
        candidate_id: String,
        evaluator_id: String,
    },

    /// Backend (network, database) failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A record could not be encoded or decoded
    #[error("record serialization failed: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn candidate_not_found(id: impl Into<String>) -> Self {
        StorageError::NotFound {
            kind: RecordKind::Candidate,
            id: id.into(),
        }
    }

    pub fn evaluation_not_found(id: impl Into<String>) -> Self {
        StorageError::NotFound {
            kind: RecordKind::Evaluation,
            id: id.into(),
        }
    }

    /// Whether this error means the record was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Record families held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Candidate,
    Evaluation,
    Setting,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Candidate => "candidate",
            RecordKind::Evaluation => "evaluation",
            RecordKind::Setting => "setting",
        };
        f.write_str(name)
    }
}
