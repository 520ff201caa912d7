//! Candidate ranking engine.
//!
//! Pure read-side projection: candidates (in fetch order) plus evaluations in,
//! leaderboard out. Sorting is stable on display score descending, so equal
//! scores keep fetch order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use panelist_state::{CandidateId, CandidateRecord, EvaluationRecord};

use crate::aggregate::{aggregate, percentage, Aggregate};

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub candidate_id: CandidateId,
    pub name: String,
    pub display_score: f64,
    pub trimmed: bool,
    pub evaluation_count: usize,
    /// Display score against the given total maximum.
    pub percentage: f64,
}

/// Rank `candidates` by their aggregated evaluation totals.
///
/// Evaluations whose candidate is not in `candidates` are ignored.
pub fn rank_candidates(
    candidates: &[CandidateRecord],
    evaluations: &[EvaluationRecord],
    total_maximum: u32,
) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&CandidateId, Vec<u32>> = HashMap::new();
    for evaluation in evaluations {
        totals
            .entry(&evaluation.candidate_id)
            .or_default()
            .push(evaluation.total);
    }

    let mut scored: Vec<(&CandidateRecord, Aggregate)> = candidates
        .iter()
        .map(|candidate| {
            let agg = totals
                .get(&candidate.candidate_id)
                .map(|t| aggregate(t))
                .unwrap_or(Aggregate::EMPTY);
            (candidate, agg)
        })
        .collect();

    scored.sort_by(|a, b| b.1.display.total_cmp(&a.1.display));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (candidate, agg))| LeaderboardEntry {
            rank: index + 1,
            candidate_id: candidate.candidate_id.clone(),
            name: candidate.name.clone(),
            display_score: agg.display,
            trimmed: agg.trimmed,
            evaluation_count: agg.count,
            percentage: percentage(agg.display, total_maximum),
        })
        .collect()
}
