//! In-memory adapters.
//!
//! Deterministic implementations of every port, used by tests and by
//! embedders that keep state in their own process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::errors::StorageError;
use crate::domain::models::RawExperiment;
use crate::domain::ports::{
    Clock, ExperimentSource, ExtensionCatalog, InstalledExtension, RandomSource, StateStorage,
    StorageScope, TelemetrySink, WorkspaceTagProvider,
};

/// Key-value storage held in a map.
#[derive(Debug, Default)]
pub struct InMemoryStateStorage {
    values: RwLock<HashMap<(StorageScope, String), String>>,
}

impl InMemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys in `scope`.
    pub fn len(&self, scope: StorageScope) -> usize {
        self.values
            .read()
            .map(|values| values.keys().filter(|(s, _)| *s == scope).count())
            .unwrap_or(0)
    }

    /// All keys in `scope`, sorted.
    pub fn keys(&self, scope: StorageScope) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .read()
            .map(|values| {
                values
                    .keys()
                    .filter(|(s, _)| *s == scope)
                    .map(|(_, key)| key.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl StateStorage for InMemoryStateStorage {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
        self.values
            .read()
            .ok()?
            .get(&(scope, key.to_string()))
            .cloned()
    }

    fn store(&self, key: &str, value: &str, scope: StorageScope) -> Result<(), StorageError> {
        self.values
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str, scope: StorageScope) -> Result<(), StorageError> {
        self.values
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(&(scope, key.to_string()));
        Ok(())
    }
}

/// Experiment source returning a fixed answer.
///
/// `None` models an unavailable configuration service.
#[derive(Debug, Clone, Default)]
pub struct StaticExperimentSource {
    experiments: Option<Vec<RawExperiment>>,
}

impl StaticExperimentSource {
    pub fn new(experiments: Vec<RawExperiment>) -> Self {
        Self {
            experiments: Some(experiments),
        }
    }

    pub fn unavailable() -> Self {
        Self { experiments: None }
    }
}

#[async_trait]
impl ExperimentSource for StaticExperimentSource {
    async fn fetch_experiments(&self) -> Option<Vec<RawExperiment>> {
        self.experiments.clone()
    }
}

/// Clock whose day is set by hand.
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<String>,
}

impl ManualClock {
    pub fn new(today: impl Into<String>) -> Self {
        Self {
            today: Mutex::new(today.into()),
        }
    }

    pub fn set_today(&self, today: impl Into<String>) {
        if let Ok(mut current) = self.today.lock() {
            *current = today.into();
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> String {
        self.today
            .lock()
            .map(|today| today.clone())
            .unwrap_or_default()
    }
}

/// Random source that always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(f64);

impl FixedRandom {
    pub fn new(value: f64) -> Self {
        Self(value)
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Extension catalog over a fixed list of ids.
#[derive(Debug, Clone, Default)]
pub struct StaticExtensionCatalog {
    extensions: Vec<InstalledExtension>,
}

impl StaticExtensionCatalog {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: ids.into_iter().map(InstalledExtension::new).collect(),
        }
    }
}

#[async_trait]
impl ExtensionCatalog for StaticExtensionCatalog {
    async fn installed_extensions(&self) -> Vec<InstalledExtension> {
        self.extensions.clone()
    }
}

/// Workspace tag provider over a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticWorkspaceTags {
    tags: HashMap<String, bool>,
}

impl StaticWorkspaceTags {
    pub fn new<I, S>(present: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: present.into_iter().map(|tag| (tag.into(), true)).collect(),
        }
    }
}

#[async_trait]
impl WorkspaceTagProvider for StaticWorkspaceTags {
    async fn tags(&self) -> HashMap<String, bool> {
        self.tags.clone()
    }
}

/// A telemetry record captured by [`RecordingTelemetry`].
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub event_name: String,
    pub payload: serde_json::Value,
}

/// Telemetry sink that keeps every record for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn public_log(&self, event_name: &str, payload: serde_json::Value) {
        if let Ok(mut records) = self.records.lock() {
            records.push(TelemetryRecord {
                event_name: event_name.to_string(),
                payload,
            });
        }
    }
}
