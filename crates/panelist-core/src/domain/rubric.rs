//! Rubric: the scoring schema evaluations are captured against.
//!
//! A rubric is an ordered list of categories, each an ordered list of items.
//! Every item has a field key that is unique across the whole rubric and a
//! positive integer maximum. Score maps are keyed by these field keys.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// A single scored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricItem {
    /// Field key used in score maps.
    pub key: String,
    pub label: String,
    /// Highest awardable score, at least 1.
    pub max: u32,
}

impl RubricItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>, max: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            max,
        }
    }
}

/// A labelled group of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricCategory {
    pub label: String,
    pub items: Vec<RubricItem>,
}

impl RubricCategory {
    pub fn new(label: impl Into<String>, items: Vec<RubricItem>) -> Self {
        Self {
            label: label.into(),
            items,
        }
    }

    /// Sum of item maxima, saturating at `u32::MAX`.
    pub fn maximum(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.max)
            .fold(0, u32::saturating_add)
    }
}

/// Awarded points against the maximum for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub label: String,
    pub awarded: f64,
    pub maximum: u32,
    pub percentage: f64,
}

/// Coarse rating of a score relative to its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// At least 80 %
    Strong,
    /// At least 50 %
    Fair,
    Weak,
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreBand::Strong => f.write_str("strong"),
            ScoreBand::Fair => f.write_str("fair"),
            ScoreBand::Weak => f.write_str("weak"),
        }
    }
}

/// Band `value` against `max`. A zero maximum is always `Weak`.
pub fn score_band(value: f64, max: f64) -> ScoreBand {
    if max <= 0.0 {
        return ScoreBand::Weak;
    }
    let ratio = value / max;
    if ratio >= 0.8 {
        ScoreBand::Strong
    } else if ratio >= 0.5 {
        ScoreBand::Fair
    } else {
        ScoreBand::Weak
    }
}

fn field_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static pattern compiles"))
}

/// The scoring schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub categories: Vec<RubricCategory>,
}

impl Default for Rubric {
    /// Four categories, total maximum 46.
    fn default() -> Self {
        Self {
            categories: vec![
                RubricCategory::new(
                    "Job Fit",
                    vec![
                        RubricItem::new("sincerity", "Sincerity", 3),
                        RubricItem::new("cooperation", "Cooperation", 3),
                        RubricItem::new("planning", "Planning", 3),
                    ],
                ),
                RubricCategory::new(
                    "Communication",
                    vec![
                        RubricItem::new("expression", "Expression", 3),
                        RubricItem::new("commonsense", "Common sense", 3),
                    ],
                ),
                RubricCategory::new(
                    "Character",
                    vec![
                        RubricItem::new("proactivity", "Proactivity", 3),
                        RubricItem::new("personality", "Personality", 3),
                    ],
                ),
                RubricCategory::new(
                    "Impromptu Questions",
                    vec![
                        RubricItem::new("q1", "Impromptu question 1", 5),
                        RubricItem::new("q2", "Impromptu question 2", 5),
                        RubricItem::new("comprehension", "Comprehension", 5),
                        RubricItem::new("logic", "Logic", 5),
                        RubricItem::new("creativity", "Creativity", 5),
                    ],
                ),
            ],
        }
    }
}

impl Rubric {
    pub fn new(categories: Vec<RubricCategory>) -> Self {
        Self { categories }
    }

    /// Check structural rules. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items().next().is_none() {
            return Err(ValidationError::EmptyRubric);
        }

        let mut seen = HashSet::new();
        let mut total: u32 = 0;
        for (index, category) in self.categories.iter().enumerate() {
            if category.label.trim().is_empty() {
                return Err(ValidationError::BlankCategoryLabel { index });
            }
            for item in &category.items {
                if !field_key_pattern().is_match(&item.key) {
                    return Err(ValidationError::InvalidFieldKey {
                        key: item.key.clone(),
                    });
                }
                if !seen.insert(item.key.as_str()) {
                    return Err(ValidationError::DuplicateFieldKey {
                        key: item.key.clone(),
                    });
                }
                if item.label.trim().is_empty() {
                    return Err(ValidationError::BlankItemLabel {
                        key: item.key.clone(),
                    });
                }
                if item.max == 0 {
                    return Err(ValidationError::NonPositiveMaximum {
                        key: item.key.clone(),
                    });
                }
                total = total.checked_add(item.max).ok_or_else(|| {
                    ValidationError::TotalMaximumOverflow {
                        key: item.key.clone(),
                        limit: u32::MAX,
                    }
                })?;
            }
        }
        Ok(())
    }

    /// All items in rubric order.
    pub fn items(&self) -> impl Iterator<Item = &RubricItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    pub fn item(&self, key: &str) -> Option<&RubricItem> {
        self.items().find(|item| item.key == key)
    }

    pub fn category(&self, label: &str) -> Option<&RubricCategory> {
        self.categories.iter().find(|c| c.label == label)
    }

    /// Sum of every item maximum, saturating at `u32::MAX`. Validated
    /// rubrics never saturate.
    pub fn total_maximum(&self) -> u32 {
        self.categories
            .iter()
            .map(RubricCategory::maximum)
            .fold(0, u32::saturating_add)
    }

    /// Per-category awarded points, where `score_of` yields the points for a
    /// field key. Keys outside this rubric are never asked for.
    pub fn category_breakdown(&self, score_of: impl Fn(&str) -> f64) -> Vec<CategoryScore> {
        self.categories
            .iter()
            .map(|category| {
                let awarded: f64 = category.items.iter().map(|item| score_of(&item.key)).sum();
                let maximum = category.maximum();
                CategoryScore {
                    label: category.label.clone(),
                    awarded: crate::aggregate::round1(awarded),
                    maximum,
                    percentage: crate::aggregate::percentage(awarded, maximum),
                }
            })
            .collect()
    }
}
