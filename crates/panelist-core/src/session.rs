//! Per-evaluator, per-candidate working state.
//!
//! ```text
//! NoCandidateSelected -> CandidateLoaded -> Saving -> CandidateLoaded
//!                                                  \-> SaveFailed (draft kept)
//! ```
//!
//! A session is driven by one caller (`&mut self`) and shares nothing with
//! other sessions except the [`Board`] and the store behind it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use panelist_state::{
    CandidateId, CandidateInfo, CandidatePatch, CandidateRecord, EvaluationRecord, Polarity,
    RecordStore, ScoreMap, Tag,
};

use crate::aggregate::percentage;
use crate::board::{rubric_total, Board, EvaluationSubmission};
use crate::domain::{toggle_tag, PanelError, Result, Rubric, ValidationError};
use crate::intake::blank_info;
use crate::metrics::METRICS;
use crate::obs;

/// Identity of the candidate a draft belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftIdentity {
    /// Not yet saved; replaced by a durable id on first save.
    Temporary(String),
    Durable(CandidateId),
}

impl DraftIdentity {
    pub fn durable(&self) -> Option<&CandidateId> {
        match self {
            DraftIdentity::Durable(id) => Some(id),
            DraftIdentity::Temporary(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DraftIdentity::Temporary(id) => id,
            DraftIdentity::Durable(id) => id.as_str(),
        }
    }
}

/// One rubric category on the interviewer's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistStep {
    pub label: String,
    pub done: bool,
}

/// The evaluator's unsaved view of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDraft {
    pub identity: DraftIdentity,
    pub name: String,
    pub info: CandidateInfo,
    /// Every current rubric field, plus any legacy keys from a loaded record.
    pub scores: ScoreMap,
    pub tags: Vec<Tag>,
    pub note: String,
    pub checklist: Vec<ChecklistStep>,
}

impl EvaluationDraft {
    fn blank(identity: DraftIdentity, rubric: &Rubric) -> Self {
        Self {
            identity,
            name: String::new(),
            info: blank_info(),
            scores: rubric.items().map(|item| (item.key.clone(), 0)).collect(),
            tags: Vec::new(),
            note: String::new(),
            checklist: checklist_for(rubric),
        }
    }

    /// Draft for a stored candidate, seeded from `existing` when present.
    ///
    /// Current fields are clamped to their maximum and zero-filled; keys no
    /// longer in the rubric are carried over untouched.
    fn load(
        candidate: CandidateRecord,
        existing: Option<EvaluationRecord>,
        rubric: &Rubric,
    ) -> Self {
        let mut draft = Self::blank(DraftIdentity::Durable(candidate.candidate_id), rubric);
        draft.name = candidate.name;
        draft.info = candidate.info;

        if let Some(record) = existing {
            for (key, value) in record.scores {
                let value = match rubric.item(&key) {
                    Some(item) => value.min(item.max),
                    None => value,
                };
                draft.scores.insert(key, value);
            }
            draft.tags = record.tags;
            draft.note = record.note.unwrap_or_default();
        }
        draft
    }
}

fn checklist_for(rubric: &Rubric) -> Vec<ChecklistStep> {
    rubric
        .categories
        .iter()
        .map(|c| ChecklistStep {
            label: c.label.clone(),
            done: false,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    NoCandidateSelected,
    CandidateLoaded,
    Saving,
    SaveFailed { reason: String },
}

/// One evaluator's working session.
#[derive(Debug)]
pub struct EvaluationSession {
    evaluator_id: String,
    rubric: Arc<Rubric>,
    state: SessionState,
    draft: Option<EvaluationDraft>,
}

impl EvaluationSession {
    pub fn new(evaluator_id: impl Into<String>, rubric: Arc<Rubric>) -> Self {
        Self {
            evaluator_id: evaluator_id.into(),
            rubric,
            state: SessionState::NoCandidateSelected,
            draft: None,
        }
    }

    pub fn evaluator_id(&self) -> &str {
        &self.evaluator_id
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn draft(&self) -> Option<&EvaluationDraft> {
        self.draft.as_ref()
    }

    /// Load `candidate_id` for this evaluator, discarding unsaved edits.
    ///
    /// Unknown ids leave the session as it was.
    pub async fn select_candidate<S: RecordStore>(
        &mut self,
        board: &Board<S>,
        candidate_id: &CandidateId,
    ) -> Result<()> {
        let rubric = board.rubric().await;
        let (candidate, existing) = board
            .candidate_for_evaluator(candidate_id, &self.evaluator_id)
            .await?;

        debug!(
            candidate_id = %candidate_id,
            has_evaluation = existing.is_some(),
            "Candidate selected"
        );
        self.draft = Some(EvaluationDraft::load(candidate, existing, &rubric));
        self.rubric = rubric;
        self.state = SessionState::CandidateLoaded;
        Ok(())
    }

    /// Begin a new candidate that exists only in this session until saved.
    ///
    /// The board's active rubric is reloaded first, like `select_candidate`.
    pub async fn start_new_candidate_draft<S: RecordStore>(
        &mut self,
        board: &Board<S>,
    ) -> &EvaluationDraft {
        self.rubric = board.rubric().await;
        let temporary = format!("draft_{}", uuid::Uuid::new_v4().simple());
        self.state = SessionState::CandidateLoaded;
        self.draft.insert(EvaluationDraft::blank(
            DraftIdentity::Temporary(temporary),
            &self.rubric,
        ))
    }

    /// Set a score, clamped to `[0, max]`. Returns `false` (and changes
    /// nothing) for keys outside the current rubric or with no draft.
    pub fn set_score(&mut self, key: &str, value: i64) -> bool {
        let Some(item) = self.rubric.item(key) else {
            return false;
        };
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        let clamped = value.clamp(0, i64::from(item.max)) as u32;
        draft.scores.insert(key.to_string(), clamped);
        true
    }

    /// Add the tag, or remove any tag with the same text.
    pub fn toggle_tag(&mut self, text: &str, polarity: Polarity) -> Result<bool> {
        let draft = self.draft.as_mut().ok_or(PanelError::NoCandidateSelected)?;
        Ok(toggle_tag(&mut draft.tags, text, polarity))
    }

    pub fn set_note(&mut self, text: &str) -> Result<()> {
        let draft = self.draft.as_mut().ok_or(PanelError::NoCandidateSelected)?;
        draft.note = text.to_string();
        Ok(())
    }

    /// Flip a checklist step. Returns its new state.
    pub fn toggle_checklist(&mut self, label: &str) -> Result<bool> {
        let draft = self.draft.as_mut().ok_or(PanelError::NoCandidateSelected)?;
        let step = draft
            .checklist
            .iter_mut()
            .find(|s| s.label == label)
            .ok_or_else(|| ValidationError::UnknownChecklistStep {
                label: label.to_string(),
            })?;
        step.done = !step.done;
        Ok(step.done)
    }

    /// `(done, total)` checklist steps.
    pub fn checklist_progress(&self) -> (usize, usize) {
        match &self.draft {
            Some(draft) => (
                draft.checklist.iter().filter(|s| s.done).count(),
                draft.checklist.len(),
            ),
            None => (0, self.rubric.categories.len()),
        }
    }

    /// Rename the candidate. Stored candidates are updated right away and
    /// the draft reverts if the store rejects it.
    pub async fn set_candidate_name<S: RecordStore>(
        &mut self,
        board: &Board<S>,
        name: &str,
    ) -> Result<()> {
        let draft = self.draft.as_mut().ok_or(PanelError::NoCandidateSelected)?;
        let previous = std::mem::replace(&mut draft.name, name.to_string());

        if let Some(id) = draft.identity.durable() {
            let patch = CandidatePatch {
                name: Some(name.to_string()),
                info: None,
            };
            if let Err(err) = board.update_candidate(id, patch).await {
                obs::emit_rollback_applied("set_candidate_name", id.as_str(), &err);
                METRICS.inc_rollbacks();
                draft.name = previous;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Set one info field, with the same write-through as the name.
    pub async fn set_candidate_field<S: RecordStore>(
        &mut self,
        board: &Board<S>,
        field: &str,
        value: &str,
    ) -> Result<()> {
        let draft = self.draft.as_mut().ok_or(PanelError::NoCandidateSelected)?;
        let previous = draft.info.insert(field.to_string(), value.to_string());

        if let Some(id) = draft.identity.durable() {
            let patch = CandidatePatch {
                name: None,
                info: Some(draft.info.clone()),
            };
            if let Err(err) = board.update_candidate(id, patch).await {
                obs::emit_rollback_applied("set_candidate_field", id.as_str(), &err);
                METRICS.inc_rollbacks();
                match previous {
                    Some(old) => draft.info.insert(field.to_string(), old),
                    None => draft.info.remove(field),
                };
                return Err(err);
            }
        }
        Ok(())
    }

    /// Sum of the draft's current-rubric scores.
    pub fn draft_total(&self) -> u32 {
        self.draft
            .as_ref()
            .map_or(0, |d| rubric_total(&self.rubric, &d.scores))
    }

    pub fn draft_percentage(&self) -> f64 {
        percentage(f64::from(self.draft_total()), self.rubric.total_maximum())
    }

    /// Persist the draft: create the candidate if it is still temporary,
    /// then upsert this evaluator's evaluation.
    ///
    /// On failure the session moves to `SaveFailed` with the draft intact, so
    /// calling `save` again retries. A temporary candidate that was created
    /// before the failure keeps its durable id and is not created twice.
    pub async fn save<S: RecordStore>(&mut self, board: &Board<S>) -> Result<EvaluationRecord> {
        if self.state == SessionState::Saving {
            return Err(PanelError::SaveInProgress);
        }
        let Some(draft) = self.draft.as_ref() else {
            return Err(PanelError::NoCandidateSelected);
        };

        let invalid = if draft.name.trim().is_empty() {
            Some(ValidationError::BlankCandidateName)
        } else if self.evaluator_id.trim().is_empty() {
            Some(ValidationError::MissingEvaluator)
        } else {
            None
        };
        if let Some(err) = invalid {
            let err = PanelError::from(err);
            self.fail(&err);
            return Err(err);
        }

        self.state = SessionState::Saving;
        match self.persist(board).await {
            Ok(record) => {
                self.state = SessionState::CandidateLoaded;
                METRICS.inc_saves();
                Ok(record)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn persist<S: RecordStore>(&mut self, board: &Board<S>) -> Result<EvaluationRecord> {
        let draft = self.draft.as_mut().ok_or(PanelError::NoCandidateSelected)?;

        if let DraftIdentity::Temporary(_) = draft.identity {
            let created = board
                .create_candidate(&draft.name, draft.info.clone())
                .await?;
            draft.identity = DraftIdentity::Durable(created.candidate_id);
        }
        let Some(candidate_id) = draft.identity.durable().cloned() else {
            return Err(PanelError::NoCandidateSelected);
        };

        let note = Some(draft.note.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        board
            .submit_evaluation(EvaluationSubmission {
                candidate_id,
                evaluator_id: self.evaluator_id.clone(),
                scores: draft.scores.clone(),
                tags: draft.tags.clone(),
                note,
            })
            .await
    }

    fn fail(&mut self, err: &PanelError) {
        let candidate = self
            .draft
            .as_ref()
            .map(|d| d.identity.as_str().to_string())
            .unwrap_or_default();
        obs::emit_save_failed(&candidate, err);
        METRICS.inc_save_failures();
        self.state = SessionState::SaveFailed {
            reason: err.to_string(),
        };
    }

    /// Drop the draft and deselect.
    pub fn reset(&mut self) {
        self.draft = None;
        self.state = SessionState::NoCandidateSelected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RubricCategory, RubricItem};
    use panelist_state::MemoryRecordStore;

    fn session() -> EvaluationSession {
        EvaluationSession::new("alice", Arc::new(Rubric::default()))
    }

    async fn board() -> Board<MemoryRecordStore> {
        Board::open(Arc::new(MemoryRecordStore::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_score_clamps_to_item_range() {
        let board = board().await;
        let mut session = session();
        session.start_new_candidate_draft(&board).await;

        assert!(session.set_score("sincerity", 99));
        assert_eq!(session.draft().unwrap().scores["sincerity"], 3);
        assert!(session.set_score("sincerity", -5));
        assert_eq!(session.draft().unwrap().scores["sincerity"], 0);
    }

    #[tokio::test]
    async fn test_set_score_ignores_unknown_keys() {
        let board = board().await;
        let mut session = session();
        session.start_new_candidate_draft(&board).await;
        let before = session.draft().unwrap().clone();

        assert!(!session.set_score("charisma", 2));
        assert_eq!(session.draft().unwrap(), &before);
    }

    #[tokio::test]
    async fn test_new_draft_has_zero_for_every_field() {
        let board = board().await;
        let mut session = session();
        let draft = session.start_new_candidate_draft(&board).await;

        assert_eq!(draft.scores.len(), 12);
        assert!(draft.scores.values().all(|&v| v == 0));
        assert!(matches!(draft.identity, DraftIdentity::Temporary(_)));
        assert_eq!(session.checklist_progress(), (0, 4));
    }

    #[tokio::test]
    async fn test_checklist_toggles_and_rejects_unknown() {
        let board = board().await;
        let mut session = session();
        session.start_new_candidate_draft(&board).await;

        assert!(session.toggle_checklist("Character").unwrap());
        assert_eq!(session.checklist_progress(), (1, 4));
        assert!(!session.toggle_checklist("Character").unwrap());
        assert!(matches!(
            session.toggle_checklist("Hobbies"),
            Err(PanelError::Validation(
                ValidationError::UnknownChecklistStep { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_draft_total_and_percentage() {
        let board = board().await;
        let mut session = session();
        session.start_new_candidate_draft(&board).await;
        session.set_score("q1", 5);
        session.set_score("logic", 4);
        session.set_score("planning", 3);

        assert_eq!(session.draft_total(), 12);
        assert_eq!(session.draft_percentage(), 26.1);
    }

    #[test]
    fn test_load_clamps_current_fields_and_keeps_legacy_keys() {
        let rubric = Rubric::default();
        let candidate = CandidateRecord {
            candidate_id: CandidateId::from("c-1"),
            name: "Kim".to_string(),
            info: CandidateInfo::new(),
            created_at: chrono::Utc::now(),
        };
        let record = EvaluationRecord {
            evaluation_id: panelist_state::EvaluationId::from("e-1"),
            candidate_id: candidate.candidate_id.clone(),
            evaluator_id: "alice".to_string(),
            scores: ScoreMap::from([
                ("sincerity".to_string(), 7),
                ("retired".to_string(), 4),
            ]),
            total: 11,
            tags: vec![Tag::negative("nervous")],
            note: Some("good eye contact".to_string()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let draft = EvaluationDraft::load(candidate, Some(record), &rubric);
        assert_eq!(draft.scores["sincerity"], 3);
        assert_eq!(draft.scores["retired"], 4);
        assert_eq!(draft.scores["logic"], 0);
        assert_eq!(draft.note, "good eye contact");
        assert_eq!(rubric_total(&rubric, &draft.scores), 3);
    }

    #[tokio::test]
    async fn test_save_without_candidate_leaves_state() {
        let board = board().await;
        let mut session = session();

        let err = session.save(&board).await.unwrap_err();
        assert!(matches!(err, PanelError::NoCandidateSelected));
        assert_eq!(session.state(), &SessionState::NoCandidateSelected);
    }

    #[tokio::test]
    async fn test_reset_clears_draft() {
        let board = board().await;
        let mut session = session();
        session.start_new_candidate_draft(&board).await;
        session.reset();

        assert!(session.draft().is_none());
        assert_eq!(session.state(), &SessionState::NoCandidateSelected);
    }

    #[tokio::test]
    async fn test_save_while_saving_is_rejected_without_store_calls() {
        let store = Arc::new(MemoryRecordStore::new());
        let board = Board::open(store.clone()).await.unwrap();
        let mut session = session();
        session.start_new_candidate_draft(&board).await;
        session.set_candidate_name(&board, "Kim").await.unwrap();
        session.state = SessionState::Saving;
        let calls = store.call_count();

        let err = session.save(&board).await.unwrap_err();
        assert!(matches!(err, PanelError::SaveInProgress));
        assert_eq!(session.state(), &SessionState::Saving);
        assert_eq!(store.call_count(), calls);
        assert!(matches!(
            session.draft().unwrap().identity,
            DraftIdentity::Temporary(_)
        ));
    }

    #[tokio::test]
    async fn test_new_draft_uses_board_rubric() {
        let board = board().await;
        let mut session = session();
        board
            .replace_rubric(Rubric::new(vec![RubricCategory::new(
                "Reasoning",
                vec![RubricItem::new("logic", "Logic", 10)],
            )]))
            .await
            .unwrap();

        let draft = session.start_new_candidate_draft(&board).await;
        assert_eq!(draft.scores.keys().collect::<Vec<_>>(), ["logic"]);
        assert!(session.set_score("logic", 8));
        assert!(!session.set_score("sincerity", 1));
        assert_eq!(session.rubric().total_maximum(), 10);
        assert_eq!(session.checklist_progress(), (0, 1));
    }
}
