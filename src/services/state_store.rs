//! Experiment state store.
//!
//! Typed access to the key-value storage used by the engine:
//! - `experiments.<id>` holds one [`ExperimentStorageState`] per experiment
//! - `allExperiments` holds the ids of every enabled experiment seen in the
//!   latest configuration, used to prune stale records
//!
//! Ids are lowercased before they become part of a key.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::errors::{DomainResult, StorageError};
use crate::domain::models::{parse_registry, ExperimentState, ExperimentStorageState};
use crate::domain::ports::{StateStorage, StorageScope};

/// Prefix of per-experiment keys.
pub const EXPERIMENT_KEY_PREFIX: &str = "experiments.";

/// Key of the known-id registry.
pub const ALL_EXPERIMENTS_KEY: &str = "allExperiments";

/// Storage key for an experiment id.
pub fn storage_key(id: &str) -> String {
    format!("{EXPERIMENT_KEY_PREFIX}{}", id.to_lowercase())
}

pub struct ExperimentStateStore {
    storage: Arc<dyn StateStorage>,
}

impl ExperimentStateStore {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self { storage }
    }

    /// Load persisted state; absent or unreadable records load as empty.
    pub fn load(&self, id: &str) -> ExperimentStorageState {
        ExperimentStorageState::parse(
            self.storage
                .get(&storage_key(id), StorageScope::Global)
                .as_deref(),
        )
    }

    pub fn save(&self, id: &str, state: &ExperimentStorageState) -> Result<(), StorageError> {
        let value = serde_json::to_string(state)?;
        self.storage
            .store(&storage_key(id), &value, StorageScope::Global)
    }

    pub fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.storage.remove(&storage_key(id), StorageScope::Global)
    }

    /// Ids recorded by the previous refresh.
    pub fn load_registry(&self) -> Vec<String> {
        parse_registry(
            self.storage
                .get(ALL_EXPERIMENTS_KEY, StorageScope::Global)
                .as_deref(),
        )
    }

    pub fn save_registry(&self, ids: &BTreeSet<String>) -> Result<(), StorageError> {
        let value = serde_json::to_string(ids)?;
        self.storage
            .store(ALL_EXPERIMENTS_KEY, &value, StorageScope::Global)
    }

    /// Replace the registry with `enabled_ids`, first removing the records of
    /// previously registered ids that are no longer enabled.
    ///
    /// The registry is rewritten even when some removals fail; the first
    /// removal error is returned afterwards.
    ///
    /// # Returns
    /// The ids whose records were removed.
    pub fn refresh_registry(
        &self,
        enabled_ids: &BTreeSet<String>,
    ) -> Result<Vec<String>, StorageError> {
        let mut removed = Vec::new();
        let mut first_error = None;

        for id in self.load_registry() {
            if enabled_ids.contains(&id) {
                continue;
            }
            match self.remove(&id) {
                Ok(()) => {
                    debug!(experiment_id = %id, "pruned stale experiment state");
                    removed.push(id);
                }
                Err(err) => {
                    warn!(experiment_id = %id, error = %err, "failed to prune experiment state");
                    first_error.get_or_insert(err);
                }
            }
        }

        self.save_registry(enabled_ids)?;

        match first_error {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    /// Force the persisted state to `Complete`, creating the record if needed.
    pub fn mark_completed(&self, id: &str) -> DomainResult<ExperimentStorageState> {
        let mut state = self.load(id);
        state.state = Some(ExperimentState::Complete);
        self.save(id, &state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStateStorage;

    fn setup() -> (Arc<InMemoryStateStorage>, ExperimentStateStore) {
        let storage = Arc::new(InMemoryStateStorage::new());
        let store = ExperimentStateStore::new(storage.clone());
        (storage, store)
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn test_keys_are_lowercased() {
        assert_eq!(storage_key("Exp.Tips"), "experiments.exp.tips");
    }

    #[test]
    fn test_save_then_load() {
        let (storage, store) = setup();
        let state = ExperimentStorageState {
            enabled: Some(true),
            state: Some(ExperimentState::Evaluating),
            edit_count: Some(1),
            last_edited_date: Some("Thu Oct 15 2026".to_string()),
        };

        store.save("Exp", &state).unwrap();

        assert_eq!(store.load("exp"), state);
        assert!(storage.get("experiments.exp", StorageScope::Global).is_some());
    }

    #[test]
    fn test_refresh_registry_prunes_disappeared_ids() {
        let (storage, store) = setup();
        store.save_registry(&ids(&["a", "b", "c"])).unwrap();
        for id in ["a", "b", "c"] {
            store.mark_completed(id).unwrap();
        }

        let removed = store.refresh_registry(&ids(&["a", "d"])).unwrap();

        assert_eq!(removed, vec!["b".to_string(), "c".to_string()]);
        assert!(storage.get("experiments.a", StorageScope::Global).is_some());
        assert!(storage.get("experiments.b", StorageScope::Global).is_none());
        assert!(storage.get("experiments.c", StorageScope::Global).is_none());
        assert_eq!(store.load_registry(), vec!["a".to_string(), "d".to_string()]);
    }

    /// Storage whose removals always fail.
    struct StickyStorage(InMemoryStateStorage);

    impl StateStorage for StickyStorage {
        fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
            self.0.get(key, scope)
        }

        fn store(&self, key: &str, value: &str, scope: StorageScope) -> Result<(), StorageError> {
            self.0.store(key, value, scope)
        }

        fn remove(&self, _key: &str, _scope: StorageScope) -> Result<(), StorageError> {
            Err(StorageError::LockPoisoned)
        }
    }

    #[test]
    fn test_refresh_registry_rewrites_registry_when_removal_fails() {
        let storage = Arc::new(StickyStorage(InMemoryStateStorage::new()));
        let store = ExperimentStateStore::new(storage.clone());
        store.save_registry(&ids(&["a", "b", "c"])).unwrap();
        for id in ["a", "b", "c"] {
            store.mark_completed(id).unwrap();
        }

        let result = store.refresh_registry(&ids(&["a", "d"]));

        assert!(matches!(result, Err(StorageError::LockPoisoned)));
        assert_eq!(store.load_registry(), vec!["a".to_string(), "d".to_string()]);
        assert!(storage.get("experiments.b", StorageScope::Global).is_some());
        assert!(storage.get("experiments.c", StorageScope::Global).is_some());
    }

    #[test]
    fn test_mark_completed_without_prior_state() {
        let (_, store) = setup();

        let state = store.mark_completed("never-seen").unwrap();

        assert_eq!(state.state, Some(ExperimentState::Complete));
        assert_eq!(store.load("never-seen").state, Some(ExperimentState::Complete));
    }

    #[test]
    fn test_mark_completed_keeps_other_fields() {
        let (_, store) = setup();
        store
            .save(
                "exp",
                &ExperimentStorageState {
                    enabled: Some(true),
                    state: Some(ExperimentState::Run),
                    edit_count: Some(3),
                    last_edited_date: None,
                },
            )
            .unwrap();

        store.mark_completed("exp").unwrap();
        store.mark_completed("exp").unwrap();

        let state = store.load("exp");
        assert_eq!(state.state, Some(ExperimentState::Complete));
        assert_eq!(state.edit_count, Some(3));
        assert_eq!(state.enabled, Some(true));
    }
}
