//! Schema definitions for Panelist SurrealDB tables
//!
//! Tables:
//! - candidates: Candidate identity, name and info fields
//! - evaluations: One row per (candidate, evaluator)
//! - settings: Named JSON values (the active rubric)
//!
//! Each `Db*` struct mirrors a table row and converts into the
//! backend-agnostic record from `storage_traits` at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{
    CandidateId, CandidateInfo, CandidateRecord, EvaluationId, EvaluationRecord, ScoreMap, Tag,
};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Candidate row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbCandidate {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Durable candidate identity (unique)
    pub candidate_id: String,
    pub name: String,
    pub info: CandidateInfo,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl DbCandidate {
    /// Create a new row with a fresh identity
    pub fn new(name: &str, info: CandidateInfo) -> Self {
        DbCandidate {
            id: None,
            candidate_id: CandidateId::new().0,
            name: name.to_string(),
            info,
            created_at: Utc::now(),
        }
    }

    pub fn into_record(self) -> CandidateRecord {
        CandidateRecord {
            candidate_id: CandidateId(self.candidate_id),
            name: self.name,
            info: self.info,
            created_at: self.created_at,
        }
    }
}

/// Evaluation row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbEvaluation {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub evaluation_id: String,
    pub candidate_id: String,
    pub evaluator_id: String,
    pub scores: ScoreMap,
    pub total: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub note: Option<String>,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl DbEvaluation {
    pub fn into_record(self) -> EvaluationRecord {
        EvaluationRecord {
            evaluation_id: EvaluationId(self.evaluation_id),
            candidate_id: CandidateId(self.candidate_id),
            evaluator_id: self.evaluator_id,
            scores: self.scores,
            total: self.total,
            tags: self.tags,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Setting row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbSetting {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub key: String,
    pub value: serde_json::Value,
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_traits::Polarity;

    #[test]
    fn test_db_candidate_new_assigns_identity() {
        let a = DbCandidate::new("Kim", CandidateInfo::new());
        let b = DbCandidate::new("Kim", CandidateInfo::new());

        assert!(a.id.is_none());
        assert_ne!(a.candidate_id, b.candidate_id);
    }

    #[test]
    fn test_db_candidate_into_record() {
        let mut info = CandidateInfo::new();
        info.insert("email".to_string(), "kim@example.com".to_string());
        let row = DbCandidate::new("Kim", info.clone());
        let id = row.candidate_id.clone();

        let record = row.into_record();
        assert_eq!(record.candidate_id.as_str(), id);
        assert_eq!(record.name, "Kim");
        assert_eq!(record.info, info);
    }

    #[test]
    fn test_db_evaluation_skips_missing_id_when_serialized() {
        let now = Utc::now();
        let row = DbEvaluation {
            id: None,
            evaluation_id: "e-1".to_string(),
            candidate_id: "c-1".to_string(),
            evaluator_id: "alice".to_string(),
            scores: ScoreMap::from([("logic".to_string(), 4)]),
            total: 4,
            tags: vec![Tag::positive("confident")],
            note: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&row).expect("serialize");
        assert!(json.get("id").is_none());
        assert_eq!(json["tags"][0]["polarity"], "positive");

        let record = row.into_record();
        assert_eq!(record.tags[0].polarity, Polarity::Positive);
        assert_eq!(record.total, 4);
    }
}
