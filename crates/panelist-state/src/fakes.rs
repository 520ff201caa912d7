//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRecordStore`, which satisfies `CandidateStore`,
//! `EvaluationStore` and `SettingStore` without any external dependencies.
//! `set_offline(true)` makes every call fail with `StorageError::Backend`,
//! which is how tests exercise rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order; listed in reverse
    candidates: Vec<CandidateRecord>,
    /// Insertion order; listed in reverse
    evaluations: Vec<EvaluationRecord>,
    settings: HashMap<String, serde_json::Value>,
}

/// In-memory record store backed by plain vectors behind a `Mutex`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
    calls: AtomicU64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while offline every operation fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of trait calls made so far (including failed ones).
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> StorageResult<MutexGuard<'_, MemoryState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("store offline".to_string()));
        }
        self.state
            .lock()
            .map_err(|_| StorageError::Backend("memory store poisoned".to_string()))
    }
}

// ---------------------------------------------------------------------------
// CandidateStore
// ---------------------------------------------------------------------------

#[async_trait]
impl CandidateStore for MemoryRecordStore {
    async fn list_candidates(&self) -> StorageResult<Vec<CandidateRecord>> {
        let state = self.state()?;
        Ok(state.candidates.iter().rev().cloned().collect())
    }

    async fn create_candidate(
        &self,
        name: &str,
        info: CandidateInfo,
    ) -> StorageResult<CandidateRecord> {
        let record = CandidateRecord {
            candidate_id: CandidateId::new(),
            name: name.to_string(),
            info,
            created_at: Utc::now(),
        };
        let mut state = self.state()?;
        state.candidates.push(record.clone());
        Ok(record)
    }

    async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> StorageResult<CandidateRecord> {
        let mut state = self.state()?;
        let record = state
            .candidates
            .iter_mut()
            .find(|c| c.candidate_id == *id)
            .ok_or_else(|| StorageError::candidate_not_found(id.as_str()))?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(info) = patch.info {
            record.info = info;
        }
        Ok(record.clone())
    }

    async fn delete_candidate(&self, id: &CandidateId) -> StorageResult<()> {
        let mut state = self.state()?;
        let before = state.candidates.len();
        state.candidates.retain(|c| c.candidate_id != *id);
        if state.candidates.len() == before {
            return Err(StorageError::candidate_not_found(id.as_str()));
        }
        state.evaluations.retain(|e| e.candidate_id != *id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EvaluationStore
// ---------------------------------------------------------------------------

#[async_trait]
impl EvaluationStore for MemoryRecordStore {
    async fn list_evaluations(&self) -> StorageResult<Vec<EvaluationRecord>> {
        let state = self.state()?;
        Ok(state.evaluations.iter().rev().cloned().collect())
    }

    async fn upsert_evaluation(
        &self,
        upsert: EvaluationUpsert,
    ) -> StorageResult<EvaluationRecord> {
        let mut state = self.state()?;
        if !state
            .candidates
            .iter()
            .any(|c| c.candidate_id == upsert.candidate_id)
        {
            return Err(StorageError::candidate_not_found(
                upsert.candidate_id.as_str(),
            ));
        }

        let now = Utc::now();
        if let Some(existing) = state.evaluations.iter_mut().find(|e| {
            e.candidate_id == upsert.candidate_id && e.evaluator_id == upsert.evaluator_id
        }) {
            existing.scores = upsert.scores;
            existing.total = upsert.total;
            existing.tags = upsert.tags;
            existing.note = upsert.note;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = EvaluationRecord {
            evaluation_id: EvaluationId::new(),
            candidate_id: upsert.candidate_id,
            evaluator_id: upsert.evaluator_id,
            scores: upsert.scores,
            total: upsert.total,
            tags: upsert.tags,
            note: upsert.note,
            created_at: now,
            updated_at: now,
        };
        state.evaluations.push(record.clone());
        Ok(record)
    }

    async fn update_evaluation(
        &self,
        id: &EvaluationId,
        patch: EvaluationPatch,
    ) -> StorageResult<EvaluationRecord> {
        let mut state = self.state()?;
        let index = state
            .evaluations
            .iter()
            .position(|e| e.evaluation_id == *id)
            .ok_or_else(|| StorageError::evaluation_not_found(id.as_str()))?;

        if let Some(evaluator_id) = &patch.evaluator_id {
            let candidate_id = state.evaluations[index].candidate_id.clone();
            let collides = state.evaluations.iter().any(|e| {
                e.evaluation_id != *id
                    && e.candidate_id == candidate_id
                    && e.evaluator_id == *evaluator_id
            });
            if collides {
                return Err(StorageError::Conflict {
                    candidate_id: candidate_id.0,
                    evaluator_id: evaluator_id.clone(),
                });
            }
        }

        let record = &mut state.evaluations[index];
        if let Some(evaluator_id) = patch.evaluator_id {
            record.evaluator_id = evaluator_id;
        }
        if let Some(note) = patch.note {
            record.note = Some(note);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_evaluation(&self, id: &EvaluationId) -> StorageResult<()> {
        let mut state = self.state()?;
        let before = state.evaluations.len();
        state.evaluations.retain(|e| e.evaluation_id != *id);
        if state.evaluations.len() == before {
            return Err(StorageError::evaluation_not_found(id.as_str()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SettingStore
// ---------------------------------------------------------------------------

#[async_trait]
impl SettingStore for MemoryRecordStore {
    async fn get_setting(&self, key: &str) -> StorageResult<Option<serde_json::Value>> {
        let state = self.state()?;
        Ok(state.settings.get(key).cloned())
    }

    async fn upsert_setting(&self, key: &str, value: serde_json::Value) -> StorageResult<()> {
        let mut state = self.state()?;
        state.settings.insert(key.to_string(), value);
        Ok(())
    }
}
