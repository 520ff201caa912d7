//! Domain models for Panelist.
//!
//! Canonical definitions for the core entities:
//! - `Rubric`: Scoring schema (categories, items, maxima)
//! - `Tag` helpers: suggested palettes and toggle semantics
//! - `PanelError` / `ValidationError`: error taxonomy

pub mod error;
pub mod rubric;
pub mod tags;

// Re-export main types and errors
pub use error::{PanelError, Result, ValidationError};
pub use rubric::{score_band, CategoryScore, Rubric, RubricCategory, RubricItem, ScoreBand};
pub use tags::{parse_tag, toggle_tag, NEGATIVE_TAGS, POSITIVE_TAGS};
