//! Active rubric, persisted as the `rubric` setting.
//!
//! Replacement is validate, persist, then swap. A validation or store failure
//! leaves the active rubric untouched. Stored evaluations are never rewritten.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use panelist_state::SettingStore;

use crate::domain::{Result, Rubric};
use crate::obs;

/// Setting key under which the active rubric is stored.
pub const RUBRIC_SETTING_KEY: &str = "rubric";

/// Holds the current rubric snapshot.
#[derive(Debug)]
pub struct RubricRegistry {
    current: RwLock<Arc<Rubric>>,
}

impl Default for RubricRegistry {
    fn default() -> Self {
        Self::new(Rubric::default())
    }
}

impl RubricRegistry {
    pub fn new(rubric: Rubric) -> Self {
        Self {
            current: RwLock::new(Arc::new(rubric)),
        }
    }

    /// Load the stored rubric, or the default when none is stored.
    ///
    /// A stored value that no longer parses or validates is logged and
    /// replaced by the default in memory; the store is not touched.
    pub async fn load<S: SettingStore + ?Sized>(store: &S) -> Result<Self> {
        let Some(value) = store.get_setting(RUBRIC_SETTING_KEY).await? else {
            debug!("No stored rubric, using default");
            return Ok(Self::default());
        };

        let rubric = match serde_json::from_value::<Rubric>(value) {
            Ok(rubric) => rubric,
            Err(err) => {
                warn!(error = %err, "Stored rubric is unreadable, using default");
                return Ok(Self::default());
            }
        };
        if let Err(err) = rubric.validate() {
            warn!(error = %err, "Stored rubric is invalid, using default");
            return Ok(Self::default());
        }
        Ok(Self::new(rubric))
    }

    /// The active rubric.
    pub async fn current(&self) -> Arc<Rubric> {
        self.current.read().await.clone()
    }

    /// Validate, persist and activate `rubric`.
    pub async fn replace<S: SettingStore + ?Sized>(
        &self,
        store: &S,
        rubric: Rubric,
    ) -> Result<Arc<Rubric>> {
        rubric.validate()?;
        let value = serde_json::to_value(&rubric)?;

        // Held across the write so concurrent replacements serialize.
        let mut guard = self.current.write().await;
        store.upsert_setting(RUBRIC_SETTING_KEY, value).await?;

        let rubric = Arc::new(rubric);
        *guard = rubric.clone();
        obs::emit_rubric_replaced(rubric.items().count(), rubric.total_maximum());
        Ok(rubric)
    }

    /// Persist and activate the default rubric.
    pub async fn reset<S: SettingStore + ?Sized>(&self, store: &S) -> Result<Arc<Rubric>> {
        self.replace(store, Rubric::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PanelError, RubricCategory, RubricItem, ValidationError};
    use panelist_state::MemoryRecordStore;

    fn small_rubric() -> Rubric {
        Rubric::new(vec![RubricCategory::new(
            "Basics",
            vec![
                RubricItem::new("logic", "Logic", 10),
                RubricItem::new("clarity", "Clarity", 5),
            ],
        )])
    }

    #[tokio::test]
    async fn test_load_without_setting_uses_default() {
        let store = MemoryRecordStore::new();
        let registry = RubricRegistry::load(&store).await.unwrap();
        assert_eq!(registry.current().await.total_maximum(), 46);
    }

    #[tokio::test]
    async fn test_replace_persists_then_swaps() {
        let store = MemoryRecordStore::new();
        let registry = RubricRegistry::load(&store).await.unwrap();

        registry.replace(&store, small_rubric()).await.unwrap();
        assert_eq!(registry.current().await.total_maximum(), 15);

        let reloaded = RubricRegistry::load(&store).await.unwrap();
        assert_eq!(*reloaded.current().await, small_rubric());
    }

    #[tokio::test]
    async fn test_invalid_rubric_is_rejected_without_mutation() {
        let store = MemoryRecordStore::new();
        let registry = RubricRegistry::default();
        let mut bad = small_rubric();
        bad.categories[0].items[1].key = "logic".to_string();

        let err = registry.replace(&store, bad).await.unwrap_err();
        assert!(matches!(
            err,
            PanelError::Validation(ValidationError::DuplicateFieldKey { .. })
        ));
        assert_eq!(registry.current().await.total_maximum(), 46);
        assert_eq!(store.get_setting(RUBRIC_SETTING_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_rubric_untouched() {
        let store = MemoryRecordStore::new();
        let registry = RubricRegistry::default();
        store.set_offline(true);

        let err = registry.replace(&store, small_rubric()).await.unwrap_err();
        assert!(matches!(err, PanelError::Storage(_)));
        assert_eq!(registry.current().await.total_maximum(), 46);
    }

    #[tokio::test]
    async fn test_corrupt_setting_falls_back_to_default() {
        let store = MemoryRecordStore::new();
        store
            .upsert_setting(RUBRIC_SETTING_KEY, serde_json::json!("not a rubric"))
            .await
            .unwrap();

        let registry = RubricRegistry::load(&store).await.unwrap();
        assert_eq!(*registry.current().await, Rubric::default());
    }
}
