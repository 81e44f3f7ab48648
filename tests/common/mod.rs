//! Common test utilities for integration tests
//!
//! Builds `ExperimentService` instances over in-memory adapters that share
//! one storage map, so a test can "restart" the process by building a
//! second service.

#![allow(dead_code)]

use std::sync::Arc;

use experiments::adapters::{
    FixedRandom, InMemoryStateStorage, ManualClock, RecordingTelemetry, SaveEventHub,
    StaticExperimentSource, StaticExtensionCatalog, StaticWorkspaceTags,
};
use experiments::domain::models::{
    ExperimentStorageState, ProductQuality, RawExperiment, RuntimeEnvironment,
};
use experiments::domain::ports::{StateStorage, StorageScope};
use experiments::services::ExperimentService;

pub const DAY_ONE: &str = "Mon Mar 02 2026";
pub const DAY_TWO: &str = "Tue Mar 03 2026";

pub struct Harness {
    pub storage: Arc<InMemoryStateStorage>,
    pub clock: Arc<ManualClock>,
    pub hub: SaveEventHub,
    pub telemetry: RecordingTelemetry,
    pub environment: RuntimeEnvironment,
    pub roll: f64,
    pub extensions: Vec<String>,
    pub tags: Vec<String>,
}

impl Harness {
    /// Stable channel, English UI, rolls of 0.5, day one.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(InMemoryStateStorage::new()),
            clock: Arc::new(ManualClock::new(DAY_ONE)),
            hub: SaveEventHub::new(),
            telemetry: RecordingTelemetry::new(),
            environment: RuntimeEnvironment::new(ProductQuality::Stable, "en"),
            roll: 0.5,
            extensions: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_environment(mut self, quality: ProductQuality, language: &str) -> Self {
        self.environment = RuntimeEnvironment::new(quality, language);
        self
    }

    pub fn with_roll(mut self, roll: f64) -> Self {
        self.roll = roll;
        self
    }

    pub fn with_extensions(mut self, ids: &[&str]) -> Self {
        self.extensions = ids.iter().map(|id| (*id).to_string()).collect();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| (*tag).to_string()).collect();
        self
    }

    fn build(&self, source: StaticExperimentSource) -> ExperimentService {
        ExperimentService::new(
            Arc::new(source),
            self.storage.clone(),
            self.environment.clone(),
        )
        .with_extensions(Arc::new(StaticExtensionCatalog::new(self.extensions.clone())))
        .with_workspace_tags(Arc::new(StaticWorkspaceTags::new(self.tags.clone())))
        .with_save_events(Arc::new(self.hub.clone()))
        .with_telemetry(Arc::new(self.telemetry.clone()))
        .with_clock(self.clock.clone())
        .with_random(Arc::new(FixedRandom::new(self.roll)))
    }

    /// Service whose configuration source returns `experiments`.
    pub fn service(&self, experiments: Vec<RawExperiment>) -> ExperimentService {
        self.build(StaticExperimentSource::new(experiments))
    }

    /// Service whose configuration source is unavailable.
    pub fn offline_service(&self) -> ExperimentService {
        self.build(StaticExperimentSource::unavailable())
    }

    pub fn persisted(&self, id: &str) -> ExperimentStorageState {
        ExperimentStorageState::parse(
            self.storage
                .get(&format!("experiments.{id}"), StorageScope::Global)
                .as_deref(),
        )
    }

    pub fn has_record(&self, id: &str) -> bool {
        self.storage
            .get(&format!("experiments.{id}"), StorageScope::Global)
            .is_some()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.storage
            .store(key, value, StorageScope::Global)
            .expect("seed storage");
    }
}

/// Build and wait for an initialized service.
pub async fn ready(service: &ExperimentService) {
    service.initialize(async {}).await;
}

/// Parse a raw experiment from its configuration JSON.
pub fn raw(value: serde_json::Value) -> RawExperiment {
    serde_json::from_value(value).expect("valid raw experiment")
}

/// Prompt action JSON with one curated-list command.
pub fn prompt_action(curated_key: Option<&str>, curated: &[&str]) -> serde_json::Value {
    let mut command = serde_json::json!({ "text": "Install" });
    if let Some(key) = curated_key {
        command["curatedExtensionsKey"] = serde_json::json!(key);
        command["curatedExtensionsList"] = serde_json::json!(curated);
    }
    serde_json::json!({
        "type": "Prompt",
        "properties": {
            "promptText": "Would you like to try this?",
            "commands": [command]
        }
    })
}

/// Poll `predicate` every 10ms until it holds or `timeout_ms` elapses.
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    predicate()
}
