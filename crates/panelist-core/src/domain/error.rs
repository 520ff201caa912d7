//! Domain-level error taxonomy for Panelist.

use panelist_state::{RecordKind, StorageError};

/// Errors produced by input validation. Surfaced immediately, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("candidate name must not be blank")]
    BlankCandidateName,

    #[error("evaluator identity is missing")]
    MissingEvaluator,

    #[error("rubric must contain at least one item")]
    EmptyRubric,

    #[error("rubric category {index} has a blank label")]
    BlankCategoryLabel { index: usize },

    #[error("rubric item {key} has a blank label")]
    BlankItemLabel { key: String },

    #[error("rubric item {key} must have a positive maximum")]
    NonPositiveMaximum { key: String },

    #[error("rubric maxima exceed {limit} points in total at field {key}")]
    TotalMaximumOverflow { key: String, limit: u32 },

    #[error("rubric field key {key} is used more than once")]
    DuplicateFieldKey { key: String },

    #[error("rubric field key {key} must match [a-z][a-z0-9_]*")]
    InvalidFieldKey { key: String },

    #[error("unknown rubric field: {key}")]
    UnknownField { key: String },

    #[error("score {value} for {key} exceeds its maximum of {max}")]
    ScoreOutOfRange { key: String, value: u32, max: u32 },

    #[error("unknown checklist step: {label}")]
    UnknownChecklistStep { label: String },

    #[error("unsupported document {filename}: only .pdf files are accepted")]
    UnsupportedDocument { filename: String },

    #[error("user and password are required")]
    BlankCredentials,
}

/// Panelist domain errors.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error("no candidate selected")]
    NoCandidateSelected,

    #[error("invalid user or password")]
    InvalidCredentials,

    #[error("not logged in: {0}")]
    Unauthorized(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for PanelError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, id } => PanelError::NotFound { kind, id },
            other => PanelError::Storage(other),
        }
    }
}

impl PanelError {
    pub fn candidate_not_found(id: impl Into<String>) -> Self {
        PanelError::NotFound {
            kind: RecordKind::Candidate,
            id: id.into(),
        }
    }

    pub fn evaluation_not_found(id: impl Into<String>) -> Self {
        PanelError::NotFound {
            kind: RecordKind::Evaluation,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PanelError::NotFound { .. })
    }
}

/// Result type for Panelist domain operations.
pub type Result<T> = std::result::Result<T, PanelError>;
