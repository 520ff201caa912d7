//! SurrealDB Handle - Connection and Operations
//!
//! Manages the connection and implements the record store traits:
//! - `CandidateStore`: candidates table, cascading delete in one transaction
//! - `EvaluationStore`: evaluations table, upserted per (candidate, evaluator)
//! - `SettingStore`: settings table
//!
//! Supports in-memory, local file (`surrealkv://`) and cloud (WebSocket)
//! connections.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument, warn};

use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::{DbCandidate, DbEvaluation, DbSetting};
use crate::storage_traits::*;
use crate::Result;

const DEFAULT_NAMESPACE: &str = "panelist";
const DEFAULT_DATABASE: &str = "main";

/// Configuration for SurrealDB Cloud connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "panelist")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create a new cloud configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - PANELIST_DB_ENDPOINT (required)
    /// - PANELIST_DB_USERNAME (required)
    /// - PANELIST_DB_PASSWORD (required)
    /// - PANELIST_DB_NAMESPACE (optional, default: "panelist")
    /// - PANELIST_DB_DATABASE (optional, default: "main")
    /// - PANELIST_DB_ROOT (optional, default: "false")
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("PANELIST_DB_ENDPOINT").map_err(|_| "PANELIST_DB_ENDPOINT not set")?;
        let username =
            std::env::var("PANELIST_DB_USERNAME").map_err(|_| "PANELIST_DB_USERNAME not set")?;
        let password =
            std::env::var("PANELIST_DB_PASSWORD").map_err(|_| "PANELIST_DB_PASSWORD not set")?;
        let namespace = std::env::var("PANELIST_DB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("PANELIST_DB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("PANELIST_DB_ROOT")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// SurrealDB connection handle for Panelist
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

impl SurrealHandle {
    /// Connect to SurrealDB in-memory and set up schema
    #[instrument(skip_all)]
    pub async fn setup_db() -> Result<Self> {
        info!("Connecting to SurrealDB (in-memory)");
        Self::connect_url("mem://").await
    }

    /// Open (or create) a local database under `path`
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn setup_local(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                path.display(),
                e
            ))
        })?;
        let url = format!("surrealkv://{}", path.display());
        info!("Using local persistence: {}", url);
        Self::connect_url(&url).await
    }

    /// Connect to SurrealDB Cloud
    ///
    /// # Example
    /// ```ignore
    /// let config = CloudConfig::new(
    ///     "wss://xxx.aws-use1.surrealdb.cloud",
    ///     "your_username",
    ///     "your_password",
    /// );
    /// let handle = SurrealHandle::setup_cloud(config).await?;
    /// ```
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn setup_cloud(config: CloudConfig) -> Result<Self> {
        info!("Connecting to SurrealDB Cloud (root={})", config.is_root);

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| {
                StateError::Connection(format!("Database authentication failed: {}", e))
            })?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        migrations::init_schema(&db).await?;

        info!("SurrealDB Cloud connected and schema initialized");
        Ok(SurrealHandle { db })
    }

    /// Connect using environment variables
    ///
    /// If PANELIST_DB_ENDPOINT is set, connects to cloud.
    /// If PANELIST_DB_URL is set, connects to that URL.
    /// Otherwise, persists locally under `<home>/db`.
    #[instrument(skip_all)]
    pub async fn setup_from_env(home: &Path) -> Result<Self> {
        if let Ok(config) = CloudConfig::from_env() {
            info!("Cloud config found, connecting to SurrealDB Cloud");
            return Self::setup_cloud(config).await;
        }

        if let Ok(url) = std::env::var("PANELIST_DB_URL") {
            info!("PANELIST_DB_URL found, connecting to {}", url);
            return Self::connect_url(&url).await;
        }

        Self::setup_local(&home.join("db")).await
    }

    async fn connect_url(url: &str) -> Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(DEFAULT_NAMESPACE)
            .use_db(DEFAULT_DATABASE)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        debug!("SurrealDB connected and schema initialized");
        Ok(SurrealHandle { db })
    }

    // ========== Private Lookups ==========

    async fn fetch_candidate(&self, id: &CandidateId) -> StorageResult<DbCandidate> {
        let mut result = self
            .db
            .query("SELECT * FROM candidates WHERE candidate_id = $id")
            .bind(("id", id.0.clone()))
            .await?;

        let rows: Vec<DbCandidate> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::candidate_not_found(id.as_str()))
    }

    async fn fetch_evaluation(&self, id: &EvaluationId) -> StorageResult<DbEvaluation> {
        let mut result = self
            .db
            .query("SELECT * FROM evaluations WHERE evaluation_id = $id")
            .bind(("id", id.0.clone()))
            .await?;

        let rows: Vec<DbEvaluation> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::evaluation_not_found(id.as_str()))
    }

    async fn find_evaluation_for(
        &self,
        candidate_id: &CandidateId,
        evaluator_id: &str,
    ) -> StorageResult<Option<DbEvaluation>> {
        let mut result = self
            .db
            .query("SELECT * FROM evaluations WHERE candidate_id = $cid AND evaluator_id = $eid")
            .bind(("cid", candidate_id.0.clone()))
            .bind(("eid", evaluator_id.to_string()))
            .await?;

        let rows: Vec<DbEvaluation> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn replace_evaluation(
        &self,
        existing: &DbEvaluation,
        upsert: &EvaluationUpsert,
    ) -> StorageResult<EvaluationRecord> {
        let mut result = self
            .db
            .query(
                "UPDATE evaluations SET scores = $scores, total = $total, tags = $tags, \
                 note = $note, updated_at = $now WHERE evaluation_id = $id",
            )
            .bind(("scores", upsert.scores.clone()))
            .bind(("total", upsert.total))
            .bind(("tags", upsert.tags.clone()))
            .bind(("note", upsert.note.clone()))
            .bind(("now", SurrealDatetime::from(Utc::now())))
            .bind(("id", existing.evaluation_id.clone()))
            .await?;

        let updated: Vec<DbEvaluation> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .map(DbEvaluation::into_record)
            .ok_or_else(|| StorageError::evaluation_not_found(existing.evaluation_id.clone()))
    }
}

// ========== Candidate Operations ==========

#[async_trait]
impl CandidateStore for SurrealHandle {
    #[instrument(skip(self))]
    async fn list_candidates(&self) -> StorageResult<Vec<CandidateRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM candidates ORDER BY created_at DESC")
            .await?;

        let rows: Vec<DbCandidate> = result.take(0)?;
        Ok(rows.into_iter().map(DbCandidate::into_record).collect())
    }

    #[instrument(skip(self, info))]
    async fn create_candidate(
        &self,
        name: &str,
        info: CandidateInfo,
    ) -> StorageResult<CandidateRecord> {
        debug!("Creating candidate");

        let row = DbCandidate::new(name, info);
        let created: Option<DbCandidate> = self.db.create("candidates").content(row).await?;

        created
            .map(DbCandidate::into_record)
            .ok_or_else(|| StorageError::Backend("failed to create candidate".to_string()))
    }

    #[instrument(skip(self, patch), fields(candidate_id = %id))]
    async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> StorageResult<CandidateRecord> {
        let existing = self.fetch_candidate(id).await?;
        let name = patch.name.unwrap_or(existing.name);
        let info = patch.info.unwrap_or(existing.info);

        let mut result = self
            .db
            .query("UPDATE candidates SET name = $name, info = $info WHERE candidate_id = $id")
            .bind(("name", name))
            .bind(("info", info))
            .bind(("id", id.0.clone()))
            .await?;

        let updated: Vec<DbCandidate> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .map(DbCandidate::into_record)
            .ok_or_else(|| StorageError::candidate_not_found(id.as_str()))
    }

    #[instrument(skip(self), fields(candidate_id = %id))]
    async fn delete_candidate(&self, id: &CandidateId) -> StorageResult<()> {
        self.fetch_candidate(id).await?;

        // Evaluations go with their candidate or not at all.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE evaluations WHERE candidate_id = $id; \
                 DELETE candidates WHERE candidate_id = $id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.0.clone()))
            .await?
            .check()?;

        info!("Candidate deleted with its evaluations");
        Ok(())
    }
}

// ========== Evaluation Operations ==========

#[async_trait]
impl EvaluationStore for SurrealHandle {
    #[instrument(skip(self))]
    async fn list_evaluations(&self) -> StorageResult<Vec<EvaluationRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM evaluations ORDER BY created_at DESC")
            .await?;

        let rows: Vec<DbEvaluation> = result.take(0)?;
        Ok(rows.into_iter().map(DbEvaluation::into_record).collect())
    }

    #[instrument(skip(self, upsert), fields(candidate_id = %upsert.candidate_id, evaluator_id = %upsert.evaluator_id))]
    async fn upsert_evaluation(
        &self,
        upsert: EvaluationUpsert,
    ) -> StorageResult<EvaluationRecord> {
        self.fetch_candidate(&upsert.candidate_id).await?;

        if let Some(existing) = self
            .find_evaluation_for(&upsert.candidate_id, &upsert.evaluator_id)
            .await?
        {
            debug!("Replacing existing evaluation");
            return self.replace_evaluation(&existing, &upsert).await;
        }

        let now = Utc::now();
        let row = DbEvaluation {
            id: None,
            evaluation_id: EvaluationId::new().0,
            candidate_id: upsert.candidate_id.0.clone(),
            evaluator_id: upsert.evaluator_id.clone(),
            scores: upsert.scores.clone(),
            total: upsert.total,
            tags: upsert.tags.clone(),
            note: upsert.note.clone(),
            created_at: now,
            updated_at: now,
        };

        let created: std::result::Result<Option<DbEvaluation>, surrealdb::Error> =
            self.db.create("evaluations").content(row).await;
        match created {
            Ok(created) => {
                created
                    .map(DbEvaluation::into_record)
                    .ok_or_else(|| StorageError::Backend("failed to create evaluation".to_string()))
            }
            Err(err) => {
                // A concurrent save for the same pair won the unique index.
                warn!(error = %err, "Evaluation insert rejected, retrying as replace");
                let existing = self
                    .find_evaluation_for(&upsert.candidate_id, &upsert.evaluator_id)
                    .await?
                    .ok_or_else(|| StorageError::Backend(err.to_string()))?;
                self.replace_evaluation(&existing, &upsert).await
            }
        }
    }

    #[instrument(skip(self, patch), fields(evaluation_id = %id))]
    async fn update_evaluation(
        &self,
        id: &EvaluationId,
        patch: EvaluationPatch,
    ) -> StorageResult<EvaluationRecord> {
        let existing = self.fetch_evaluation(id).await?;

        if let Some(evaluator_id) = &patch.evaluator_id {
            let candidate_id = CandidateId(existing.candidate_id.clone());
            if let Some(other) = self.find_evaluation_for(&candidate_id, evaluator_id).await? {
                if other.evaluation_id != existing.evaluation_id {
                    return Err(StorageError::Conflict {
                        candidate_id: candidate_id.0,
                        evaluator_id: evaluator_id.clone(),
                    });
                }
            }
        }

        let evaluator_id = patch.evaluator_id.unwrap_or(existing.evaluator_id);
        let note = patch.note.or(existing.note);

        let mut result = self
            .db
            .query(
                "UPDATE evaluations SET evaluator_id = $evaluator, note = $note, \
                 updated_at = $now WHERE evaluation_id = $id",
            )
            .bind(("evaluator", evaluator_id))
            .bind(("note", note))
            .bind(("now", SurrealDatetime::from(Utc::now())))
            .bind(("id", id.0.clone()))
            .await?;

        let updated: Vec<DbEvaluation> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .map(DbEvaluation::into_record)
            .ok_or_else(|| StorageError::evaluation_not_found(id.as_str()))
    }

    #[instrument(skip(self), fields(evaluation_id = %id))]
    async fn delete_evaluation(&self, id: &EvaluationId) -> StorageResult<()> {
        let mut result = self
            .db
            .query("DELETE FROM evaluations WHERE evaluation_id = $id RETURN BEFORE")
            .bind(("id", id.0.clone()))
            .await?;

        let deleted: Vec<DbEvaluation> = result.take(0)?;
        if deleted.is_empty() {
            return Err(StorageError::evaluation_not_found(id.as_str()));
        }
        Ok(())
    }
}

// ========== Setting Operations ==========

#[async_trait]
impl SettingStore for SurrealHandle {
    #[instrument(skip(self))]
    async fn get_setting(&self, key: &str) -> StorageResult<Option<serde_json::Value>> {
        let mut result = self
            .db
            .query("SELECT * FROM settings WHERE key = $key")
            .bind(("key", key.to_string()))
            .await?;

        let rows: Vec<DbSetting> = result.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.value))
    }

    #[instrument(skip(self, value))]
    async fn upsert_setting(&self, key: &str, value: serde_json::Value) -> StorageResult<()> {
        let mut result = self
            .db
            .query("UPDATE settings SET value = $value, updated_at = $now WHERE key = $key")
            .bind(("value", value.clone()))
            .bind(("now", SurrealDatetime::from(Utc::now())))
            .bind(("key", key.to_string()))
            .await?;

        let updated: Vec<DbSetting> = result.take(0)?;
        if updated.is_empty() {
            let row = DbSetting {
                id: None,
                key: key.to_string(),
                value,
                updated_at: Utc::now(),
            };
            let _created: Option<DbSetting> = self.db.create("settings").content(row).await?;
        }

        debug!("Setting stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn handle_with_candidate() -> (SurrealHandle, CandidateRecord) {
        let handle = SurrealHandle::setup_db().await.unwrap();
        let candidate = handle
            .create_candidate("Kim Minji", CandidateInfo::new())
            .await
            .unwrap();
        (handle, candidate)
    }

    fn upsert(candidate: &CandidateRecord, evaluator: &str, total: u32) -> EvaluationUpsert {
        EvaluationUpsert {
            candidate_id: candidate.candidate_id.clone(),
            evaluator_id: evaluator.to_string(),
            scores: ScoreMap::from([("logic".to_string(), total)]),
            total,
            tags: vec![Tag::positive("confident")],
            note: None,
        }
    }

    #[tokio::test]
    async fn test_surreal_connection_and_schema_creation() {
        let handle = SurrealHandle::setup_db().await;
        assert!(handle.is_ok(), "Failed to connect: {:?}", handle.err());
    }

    #[tokio::test]
    async fn test_schema_init_is_idempotent() {
        let handle = SurrealHandle::setup_db().await.unwrap();
        migrations::init_schema(&handle.db).await.unwrap();
    }

    #[tokio::test]
    async fn test_candidates_list_newest_first() {
        let handle = SurrealHandle::setup_db().await.unwrap();
        handle
            .create_candidate("first", CandidateInfo::new())
            .await
            .unwrap();
        handle
            .create_candidate("second", CandidateInfo::new())
            .await
            .unwrap();

        let names: Vec<String> = handle
            .list_candidates()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_evaluator_only() {
        let (handle, candidate) = handle_with_candidate().await;

        let first = handle
            .upsert_evaluation(upsert(&candidate, "alice", 3))
            .await
            .unwrap();
        handle
            .upsert_evaluation(upsert(&candidate, "bob", 4))
            .await
            .unwrap();
        let replaced = handle
            .upsert_evaluation(upsert(&candidate, "alice", 5))
            .await
            .unwrap();

        assert_eq!(replaced.evaluation_id, first.evaluation_id);
        assert_eq!(replaced.total, 5);

        let all = handle.list_evaluations().await.unwrap();
        assert_eq!(all.len(), 2);
        let bob = all.iter().find(|e| e.evaluator_id == "bob").unwrap();
        assert_eq!(bob.total, 4);
    }

    #[tokio::test]
    async fn test_delete_candidate_cascades() {
        let (handle, candidate) = handle_with_candidate().await;
        handle
            .upsert_evaluation(upsert(&candidate, "alice", 3))
            .await
            .unwrap();

        handle
            .delete_candidate(&candidate.candidate_id)
            .await
            .unwrap();

        assert!(handle.list_candidates().await.unwrap().is_empty());
        assert!(handle.list_evaluations().await.unwrap().is_empty());

        let again = handle.delete_candidate(&candidate.candidate_id).await;
        assert!(again.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_setting_roundtrip_overwrites() {
        let handle = SurrealHandle::setup_db().await.unwrap();
        assert!(handle.get_setting("rubric").await.unwrap().is_none());

        handle
            .upsert_setting("rubric", serde_json::json!({ "v": 1 }))
            .await
            .unwrap();
        handle
            .upsert_setting("rubric", serde_json::json!({ "v": 2 }))
            .await
            .unwrap();

        let value = handle.get_setting("rubric").await.unwrap().unwrap();
        assert_eq!(value["v"], 2);
    }
}
