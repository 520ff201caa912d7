//! Shared board: store handle, active rubric and a cached, ranked snapshot.
//!
//! Reads are served from the snapshot. Writes go to the store first and are
//! then folded into the snapshot, except deletions, which are applied to the
//! snapshot optimistically as commands and reverted from their undo record
//! when the store call fails. Every change re-ranks the leaderboard.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use panelist_state::{
    CandidateId, CandidateInfo, CandidatePatch, CandidateRecord, EvaluationId, EvaluationPatch,
    EvaluationRecord, EvaluationUpsert, RecordStore, ScoreMap, StorageError, StorageResult, Tag,
};

use crate::aggregate::{aggregate_evaluations, mean_scores, percentage, Aggregate};
use crate::domain::{
    score_band, CategoryScore, PanelError, Result, Rubric, ScoreBand, ValidationError,
};
use crate::intake;
use crate::metrics::METRICS;
use crate::obs;
use crate::ranking::{rank_candidates, LeaderboardEntry};
use crate::rubric_registry::RubricRegistry;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Cached store contents plus the ranking derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    /// Newest first.
    pub candidates: Vec<CandidateRecord>,
    /// Newest first.
    pub evaluations: Vec<EvaluationRecord>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl BoardSnapshot {
    pub fn candidate(&self, id: &CandidateId) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|c| c.candidate_id == *id)
    }

    pub fn evaluations_for<'a>(
        &'a self,
        id: &'a CandidateId,
    ) -> impl Iterator<Item = &'a EvaluationRecord> + 'a {
        self.evaluations.iter().filter(move |e| e.candidate_id == *id)
    }

    pub fn evaluation(&self, id: &EvaluationId) -> Option<&EvaluationRecord> {
        self.evaluations.iter().find(|e| e.evaluation_id == *id)
    }

    fn rerank(&mut self, total_maximum: u32) {
        self.leaderboard = rank_candidates(&self.candidates, &self.evaluations, total_maximum);
        METRICS.inc_leaderboard_recomputes();
        obs::emit_leaderboard_recomputed(self.candidates.len(), self.evaluations.len());
    }

    fn put_candidate(&mut self, record: CandidateRecord) {
        match self
            .candidates
            .iter_mut()
            .find(|c| c.candidate_id == record.candidate_id)
        {
            Some(existing) => *existing = record,
            None => self.candidates.insert(0, record),
        }
    }

    fn put_evaluation(&mut self, record: EvaluationRecord) {
        match self
            .evaluations
            .iter_mut()
            .find(|e| e.evaluation_id == record.evaluation_id)
        {
            Some(existing) => *existing = record,
            None => self.evaluations.insert(0, record),
        }
    }
}

// ---------------------------------------------------------------------------
// Optimistic commands
// ---------------------------------------------------------------------------

/// A tentative local change applied before the store confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    RemoveCandidate(CandidateId),
    RemoveEvaluation(EvaluationId),
}

/// What a [`Command`] removed, with original positions.
#[derive(Debug, Default)]
struct Undo {
    candidate: Option<(usize, CandidateRecord)>,
    evaluations: Vec<(usize, EvaluationRecord)>,
}

impl Command {
    /// Apply to the snapshot. `None` when the target is not cached.
    fn apply(&self, snapshot: &mut BoardSnapshot) -> Option<Undo> {
        match self {
            Command::RemoveCandidate(id) => {
                let index = snapshot
                    .candidates
                    .iter()
                    .position(|c| c.candidate_id == *id)?;
                let candidate = snapshot.candidates.remove(index);
                let mut undo = Undo {
                    candidate: Some((index, candidate)),
                    evaluations: Vec::new(),
                };
                let mut position = 0;
                snapshot.evaluations.retain(|e| {
                    let keep = e.candidate_id != *id;
                    if !keep {
                        undo.evaluations.push((position, e.clone()));
                    }
                    position += 1;
                    keep
                });
                Some(undo)
            }
            Command::RemoveEvaluation(id) => {
                let index = snapshot
                    .evaluations
                    .iter()
                    .position(|e| e.evaluation_id == *id)?;
                let evaluation = snapshot.evaluations.remove(index);
                Some(Undo {
                    candidate: None,
                    evaluations: vec![(index, evaluation)],
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Command::RemoveCandidate(_) => "delete_candidate",
            Command::RemoveEvaluation(_) => "delete_evaluation",
        }
    }

    fn target(&self) -> &str {
        match self {
            Command::RemoveCandidate(id) => id.as_str(),
            Command::RemoveEvaluation(id) => id.as_str(),
        }
    }
}

impl Undo {
    /// Reinsert removed records at their original positions.
    fn revert(self, snapshot: &mut BoardSnapshot) {
        if let Some((index, candidate)) = self.candidate {
            let index = index.min(snapshot.candidates.len());
            snapshot.candidates.insert(index, candidate);
        }
        // Ascending order, so each index is valid once earlier ones are back.
        for (index, evaluation) in self.evaluations {
            let index = index.min(snapshot.evaluations.len());
            snapshot.evaluations.insert(index, evaluation);
        }
    }
}

// ---------------------------------------------------------------------------
// Read models and inputs
// ---------------------------------------------------------------------------

/// Everything shown for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetail {
    pub candidate: CandidateRecord,
    /// Newest first.
    pub evaluations: Vec<EvaluationRecord>,
    pub aggregate: Aggregate,
    pub percentage: f64,
    pub band: ScoreBand,
    /// Per-category mean of the evaluators' scores.
    pub breakdown: Vec<CategoryScore>,
}

/// One evaluator's scores for one candidate, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSubmission {
    pub candidate_id: CandidateId,
    pub evaluator_id: String,
    /// May carry keys from an earlier rubric that this evaluator's stored
    /// record already has; they are kept but not totalled.
    pub scores: ScoreMap,
    pub tags: Vec<Tag>,
    pub note: Option<String>,
}

/// Sum of `scores` over the fields of `rubric`, saturating at `u32::MAX`.
pub fn rubric_total(rubric: &Rubric, scores: &ScoreMap) -> u32 {
    rubric
        .items()
        .map(|item| scores.get(&item.key).copied().unwrap_or(0))
        .fold(0, u32::saturating_add)
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Coordinator shared by every session on this process.
pub struct Board<S> {
    store: Arc<S>,
    rubric: RubricRegistry,
    snapshot: RwLock<BoardSnapshot>,
}

impl<S> Board<S>
where
    S: RecordStore,
{
    /// Load the rubric setting and fetch everything.
    #[instrument(skip_all)]
    pub async fn open(store: Arc<S>) -> Result<Self> {
        let rubric = RubricRegistry::load(store.as_ref()).await?;
        let board = Self {
            store,
            rubric,
            snapshot: RwLock::new(BoardSnapshot::default()),
        };
        board.refresh().await?;
        Ok(board)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn rubric(&self) -> Arc<Rubric> {
        self.rubric.current().await
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.snapshot.read().await.leaderboard.clone()
    }

    /// Bulk fetch candidates and evaluations concurrently, then re-rank.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> Result<()> {
        let (candidates, evaluations) = futures::try_join!(
            self.store.list_candidates(),
            self.store.list_evaluations()
        )?;
        debug!(
            candidates = candidates.len(),
            evaluations = evaluations.len(),
            "Fetched board"
        );

        let total = self.rubric().await.total_maximum();
        let mut snapshot = self.snapshot.write().await;
        snapshot.candidates = candidates;
        snapshot.evaluations = evaluations;
        snapshot.rerank(total);
        Ok(())
    }

    /// A cached candidate and, if present, `evaluator_id`'s evaluation of it.
    pub async fn candidate_for_evaluator(
        &self,
        id: &CandidateId,
        evaluator_id: &str,
    ) -> Result<(CandidateRecord, Option<EvaluationRecord>)> {
        let snapshot = self.snapshot.read().await;
        let Some(candidate) = snapshot.candidate(id) else {
            warn!(candidate_id = %id, "Candidate not found");
            return Err(PanelError::candidate_not_found(id.as_str()));
        };
        let evaluation = snapshot
            .evaluations_for(id)
            .find(|e| e.evaluator_id == evaluator_id)
            .cloned();
        Ok((candidate.clone(), evaluation))
    }

    pub async fn candidate_detail(&self, id: &CandidateId) -> Result<CandidateDetail> {
        let rubric = self.rubric().await;
        let snapshot = self.snapshot.read().await;
        let Some(candidate) = snapshot.candidate(id) else {
            warn!(candidate_id = %id, "Candidate not found");
            return Err(PanelError::candidate_not_found(id.as_str()));
        };

        let evaluations: Vec<EvaluationRecord> = snapshot.evaluations_for(id).cloned().collect();
        let aggregate = aggregate_evaluations(&evaluations);
        let total = rubric.total_maximum();
        let means = mean_scores(&evaluations);

        Ok(CandidateDetail {
            candidate: candidate.clone(),
            aggregate,
            percentage: percentage(aggregate.display, total),
            band: score_band(aggregate.display, f64::from(total)),
            breakdown: rubric.category_breakdown(|key| means.get(key).copied().unwrap_or(0.0)),
            evaluations,
        })
    }

    // ----- candidates -----

    #[instrument(skip(self, info))]
    pub async fn create_candidate(
        &self,
        name: &str,
        info: CandidateInfo,
    ) -> Result<CandidateRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankCandidateName.into());
        }

        let record = self.store.create_candidate(name, info).await?;
        obs::emit_candidate_created(record.candidate_id.as_str(), &record.name);

        let total = self.rubric().await.total_maximum();
        let mut snapshot = self.snapshot.write().await;
        snapshot.put_candidate(record.clone());
        snapshot.rerank(total);
        Ok(record)
    }

    /// Create a candidate from the document intake stub.
    pub async fn import_document(&self, filename: &str) -> Result<CandidateRecord> {
        let intake = intake::parse_document(filename)?;
        info!(filename = %filename, "Importing candidate document");
        self.create_candidate(&intake.name, intake.info).await
    }

    #[instrument(skip(self, patch), fields(candidate_id = %id))]
    pub async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> Result<CandidateRecord> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::BlankCandidateName.into());
        }

        let record = self
            .store
            .update_candidate(id, patch)
            .await
            .inspect_err(|e| warn_if_not_found(e, id.as_str()))?;

        let total = self.rubric().await.total_maximum();
        let mut snapshot = self.snapshot.write().await;
        snapshot.put_candidate(record.clone());
        snapshot.rerank(total);
        Ok(record)
    }

    /// Remove a candidate and its evaluations, optimistically.
    #[instrument(skip(self), fields(candidate_id = %id))]
    pub async fn delete_candidate(&self, id: &CandidateId) -> Result<()> {
        let command = Command::RemoveCandidate(id.clone());
        let removed = self
            .execute(&command, self.store.delete_candidate(id))
            .await?;
        obs::emit_candidate_deleted(id.as_str(), removed);
        Ok(())
    }

    // ----- evaluations -----

    /// Validate and upsert one evaluator's scores. The total is computed here
    /// from the fields of the active rubric.
    ///
    /// Keys outside the rubric are rejected unless the evaluator's stored
    /// record for this candidate already carries them.
    #[instrument(skip(self, submission), fields(candidate_id = %submission.candidate_id, evaluator_id = %submission.evaluator_id))]
    pub async fn submit_evaluation(
        &self,
        submission: EvaluationSubmission,
    ) -> Result<EvaluationRecord> {
        if submission.evaluator_id.trim().is_empty() {
            return Err(ValidationError::MissingEvaluator.into());
        }
        let rubric = self.rubric().await;
        for item in rubric.items() {
            if let Some(&value) = submission.scores.get(&item.key) {
                if value > item.max {
                    return Err(ValidationError::ScoreOutOfRange {
                        key: item.key.clone(),
                        value,
                        max: item.max,
                    }
                    .into());
                }
            }
        }
        let legacy: Vec<String> = self
            .snapshot
            .read()
            .await
            .evaluations_for(&submission.candidate_id)
            .find(|e| e.evaluator_id == submission.evaluator_id)
            .map(|e| e.scores.keys().cloned().collect())
            .unwrap_or_default();
        if let Some(key) = submission
            .scores
            .keys()
            .find(|key| rubric.item(key).is_none() && !legacy.contains(*key))
        {
            return Err(ValidationError::UnknownField { key: key.clone() }.into());
        }

        let total = rubric_total(&rubric, &submission.scores);
        let record = self
            .store
            .upsert_evaluation(EvaluationUpsert {
                candidate_id: submission.candidate_id,
                evaluator_id: submission.evaluator_id,
                scores: submission.scores,
                total,
                tags: submission.tags,
                note: submission.note,
            })
            .await
            .inspect_err(|e| warn_if_not_found(e, "evaluation candidate"))?;

        obs::emit_evaluation_saved(record.candidate_id.as_str(), &record.evaluator_id, record.total);

        let mut snapshot = self.snapshot.write().await;
        snapshot.put_evaluation(record.clone());
        snapshot.rerank(rubric.total_maximum());
        Ok(record)
    }

    /// Remove a single evaluation, optimistically.
    #[instrument(skip(self), fields(evaluation_id = %id))]
    pub async fn delete_evaluation(&self, id: &EvaluationId) -> Result<()> {
        let candidate_id = self
            .snapshot
            .read()
            .await
            .evaluation(id)
            .map(|e| e.candidate_id.to_string())
            .unwrap_or_default();

        let command = Command::RemoveEvaluation(id.clone());
        self.execute(&command, self.store.delete_evaluation(id))
            .await?;
        obs::emit_evaluation_deleted(id.as_str(), &candidate_id);
        Ok(())
    }

    /// Re-key an evaluation to another evaluator.
    #[instrument(skip(self), fields(evaluation_id = %id))]
    pub async fn reassign_evaluator(
        &self,
        id: &EvaluationId,
        evaluator_id: &str,
    ) -> Result<EvaluationRecord> {
        let evaluator_id = evaluator_id.trim();
        if evaluator_id.is_empty() {
            return Err(ValidationError::MissingEvaluator.into());
        }

        let record = self
            .store
            .update_evaluation(
                id,
                EvaluationPatch {
                    evaluator_id: Some(evaluator_id.to_string()),
                    note: None,
                },
            )
            .await
            .inspect_err(|e| warn_if_not_found(e, id.as_str()))?;

        let total = self.rubric().await.total_maximum();
        let mut snapshot = self.snapshot.write().await;
        snapshot.put_evaluation(record.clone());
        snapshot.rerank(total);
        Ok(record)
    }

    // ----- rubric -----

    pub async fn replace_rubric(&self, rubric: Rubric) -> Result<Arc<Rubric>> {
        let active = self.rubric.replace(self.store.as_ref(), rubric).await?;
        self.snapshot.write().await.rerank(active.total_maximum());
        Ok(active)
    }

    pub async fn reset_rubric(&self) -> Result<Arc<Rubric>> {
        let active = self.rubric.reset(self.store.as_ref()).await?;
        self.snapshot.write().await.rerank(active.total_maximum());
        Ok(active)
    }

    // ----- command execution -----

    /// Apply `command` locally, await the store call, and revert on failure.
    /// Returns the number of evaluations the command removed locally.
    ///
    /// `call` is lazy: the store is not touched until it is awaited here,
    /// after the local change is in place.
    async fn execute<F>(&self, command: &Command, call: F) -> Result<usize>
    where
        F: Future<Output = StorageResult<()>>,
    {
        let total = self.rubric().await.total_maximum();
        let undo = {
            let mut snapshot = self.snapshot.write().await;
            let undo = command.apply(&mut snapshot);
            if undo.is_some() {
                snapshot.rerank(total);
            }
            undo
        };
        let removed = undo.as_ref().map_or(0, |u| u.evaluations.len());

        match call.await {
            Ok(()) => Ok(removed),
            Err(err) => {
                warn_if_not_found(&err, command.target());
                if let Some(undo) = undo {
                    let mut snapshot = self.snapshot.write().await;
                    undo.revert(&mut snapshot);
                    snapshot.rerank(total);
                    METRICS.inc_rollbacks();
                    obs::emit_rollback_applied(command.name(), command.target(), &err);
                }
                Err(err.into())
            }
        }
    }
}

fn warn_if_not_found(err: &StorageError, target: &str) {
    if err.is_not_found() {
        warn!(target_id = %target, error = %err, "Record not found");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RubricCategory, RubricItem};
    use panelist_state::{EvaluationStore, MemoryRecordStore};

    async fn board() -> Board<MemoryRecordStore> {
        Board::open(Arc::new(MemoryRecordStore::new())).await.unwrap()
    }

    fn submission(candidate_id: &CandidateId, evaluator: &str, logic: u32) -> EvaluationSubmission {
        EvaluationSubmission {
            candidate_id: candidate_id.clone(),
            evaluator_id: evaluator.to_string(),
            scores: ScoreMap::from([("logic".to_string(), logic), ("sincerity".to_string(), 3)]),
            tags: Vec::new(),
            note: None,
        }
    }

    #[test]
    fn test_remove_candidate_command_reverts_in_place() {
        let board_snapshot = |ids: &[&str]| BoardSnapshot {
            candidates: ids
                .iter()
                .map(|id| CandidateRecord {
                    candidate_id: CandidateId::from(*id),
                    name: id.to_string(),
                    info: CandidateInfo::new(),
                    created_at: chrono::Utc::now(),
                })
                .collect(),
            ..BoardSnapshot::default()
        };
        let mut snapshot = board_snapshot(&["a", "b", "c"]);
        let before = snapshot.clone();

        let undo = Command::RemoveCandidate(CandidateId::from("b"))
            .apply(&mut snapshot)
            .unwrap();
        assert_eq!(snapshot.candidates.len(), 2);

        undo.revert(&mut snapshot);
        assert_eq!(snapshot, before);

        assert!(Command::RemoveCandidate(CandidateId::from("zzz"))
            .apply(&mut snapshot)
            .is_none());
    }

    #[tokio::test]
    async fn test_submit_computes_total_from_rubric() {
        let board = board().await;
        let candidate = board
            .create_candidate("Kim", CandidateInfo::new())
            .await
            .unwrap();

        let record = board
            .submit_evaluation(submission(&candidate.candidate_id, "alice", 4))
            .await
            .unwrap();

        assert_eq!(record.total, 7);
        assert_eq!(board.leaderboard().await[0].display_score, 7.0);
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_field() {
        let store = Arc::new(MemoryRecordStore::new());
        let board = Board::open(store.clone()).await.unwrap();
        let candidate = board
            .create_candidate("Kim", CandidateInfo::new())
            .await
            .unwrap();

        let mut sub = submission(&candidate.candidate_id, "alice", 4);
        sub.scores.insert("logc".to_string(), 4000);
        let err = board.submit_evaluation(sub).await.unwrap_err();

        assert!(matches!(
            err,
            PanelError::Validation(ValidationError::UnknownField { ref key }) if key == "logc"
        ));
        assert!(store.list_evaluations().await.unwrap().is_empty());
        assert_eq!(board.leaderboard().await[0].evaluation_count, 0);
    }

    #[tokio::test]
    async fn test_submit_keeps_fields_from_earlier_rubric() {
        let board = board().await;
        let candidate = board
            .create_candidate("Kim", CandidateInfo::new())
            .await
            .unwrap();
        board
            .submit_evaluation(submission(&candidate.candidate_id, "alice", 4))
            .await
            .unwrap();
        board
            .replace_rubric(Rubric::new(vec![RubricCategory::new(
                "Job Fit",
                vec![RubricItem::new("sincerity", "Sincerity", 3)],
            )]))
            .await
            .unwrap();

        // alice still carries `logic`; bob never had it.
        let record = board
            .submit_evaluation(submission(&candidate.candidate_id, "alice", 4))
            .await
            .unwrap();
        assert_eq!(record.total, 3);
        assert_eq!(record.scores.get("logic"), Some(&4));

        let err = board
            .submit_evaluation(submission(&candidate.candidate_id, "bob", 4))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PanelError::Validation(ValidationError::UnknownField { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_rejects_score_above_maximum() {
        let board = board().await;
        let candidate = board
            .create_candidate("Kim", CandidateInfo::new())
            .await
            .unwrap();

        let err = board
            .submit_evaluation(submission(&candidate.candidate_id, "alice", 6))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PanelError::Validation(ValidationError::ScoreOutOfRange { max: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let board = board().await;
        let err = board
            .create_candidate("   ", CandidateInfo::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PanelError::Validation(ValidationError::BlankCandidateName)
        ));
    }

    #[tokio::test]
    async fn test_candidate_detail_breakdown_uses_mean_scores() {
        let board = board().await;
        let candidate = board
            .create_candidate("Kim", CandidateInfo::new())
            .await
            .unwrap();
        board
            .submit_evaluation(submission(&candidate.candidate_id, "alice", 4))
            .await
            .unwrap();
        board
            .submit_evaluation(submission(&candidate.candidate_id, "bob", 2))
            .await
            .unwrap();

        let detail = board.candidate_detail(&candidate.candidate_id).await.unwrap();
        assert_eq!(detail.evaluations.len(), 2);
        assert_eq!(detail.aggregate.display, 6.0);
        assert_eq!(detail.band, ScoreBand::Weak);

        let job_fit = &detail.breakdown[0];
        assert_eq!(job_fit.awarded, 3.0);
        let impromptu = &detail.breakdown[3];
        assert_eq!(impromptu.awarded, 3.0);
    }
}
