//! Score aggregation.
//!
//! Reduces one candidate's evaluation totals to a single display score.
//! Below [`TRIM_QUORUM`] evaluations the display score is the plain mean;
//! from the quorum on, exactly one highest and one lowest total are dropped
//! before averaging ("Olympic" scoring). Results are rounded to one decimal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use panelist_state::EvaluationRecord;

/// Evaluation count from which outlier trimming applies.
pub const TRIM_QUORUM: usize = 5;

/// Aggregated view of one candidate's evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Display score, rounded to one decimal.
    pub display: f64,
    /// Whether one max and one min were dropped.
    pub trimmed: bool,
    /// Number of evaluations aggregated.
    pub count: usize,
}

impl Aggregate {
    pub const EMPTY: Aggregate = Aggregate {
        display: 0.0,
        trimmed: false,
        count: 0,
    };
}

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `value` as a percentage of `maximum`, rounded to one decimal. Zero when
/// the maximum is zero.
pub fn percentage(value: f64, maximum: u32) -> f64 {
    if maximum == 0 {
        return 0.0;
    }
    round1(value / f64::from(maximum) * 100.0)
}

/// Aggregate a list of evaluation totals.
pub fn aggregate(totals: &[u32]) -> Aggregate {
    let count = totals.len();
    if count == 0 {
        return Aggregate::EMPTY;
    }

    let sum: u64 = totals.iter().map(|&t| u64::from(t)).sum();
    if count < TRIM_QUORUM {
        return Aggregate {
            display: round1(sum as f64 / count as f64),
            trimmed: false,
            count,
        };
    }

    // count >= TRIM_QUORUM, so max/min exist
    let max = totals.iter().copied().max().map(u64::from).unwrap_or(0);
    let min = totals.iter().copied().min().map(u64::from).unwrap_or(0);
    let kept = sum - max - min;
    Aggregate {
        display: round1(kept as f64 / (count - 2) as f64),
        trimmed: true,
        count,
    }
}

/// Aggregate the stored totals of a candidate's evaluations.
pub fn aggregate_evaluations<'a>(
    evaluations: impl IntoIterator<Item = &'a EvaluationRecord>,
) -> Aggregate {
    let totals: Vec<u32> = evaluations.into_iter().map(|e| e.total).collect();
    aggregate(&totals)
}

/// Mean awarded score per field key across evaluations. A field missing from
/// an evaluation counts as zero for it.
pub fn mean_scores<'a>(
    evaluations: impl IntoIterator<Item = &'a EvaluationRecord>,
) -> BTreeMap<String, f64> {
    let evaluations: Vec<&EvaluationRecord> = evaluations.into_iter().collect();
    if evaluations.is_empty() {
        return BTreeMap::new();
    }

    let mut sums: BTreeMap<String, u64> = BTreeMap::new();
    for evaluation in &evaluations {
        for (key, score) in &evaluation.scores {
            *sums.entry(key.clone()).or_default() += u64::from(*score);
        }
    }
    let n = evaluations.len() as f64;
    sums.into_iter()
        .map(|(key, sum)| (key, sum as f64 / n))
        .collect()
}
