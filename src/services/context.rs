//! Shared evaluation context.
//!
//! Everything the engine and its trackers touch lives here behind `Arc`s so
//! a tracker task can own a cheap clone.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::event_bus::EventBus;
use super::state_store::ExperimentStateStore;
use super::subscriptions::SubscriptionSet;
use crate::domain::models::{
    CuratedExtensions, Experiment, ExperimentState, ExperimentStorageState, RuntimeEnvironment,
};
use crate::domain::ports::{
    Clock, ExtensionCatalog, RandomSource, SaveEventSource, TelemetrySink, WorkspaceTagProvider,
};

#[derive(Clone)]
pub struct EvaluationContext {
    pub store: Arc<ExperimentStateStore>,
    pub experiments: Arc<RwLock<Vec<Experiment>>>,
    pub curated: Arc<RwLock<HashMap<String, CuratedExtensions>>>,
    pub events: Arc<EventBus>,
    pub subscriptions: Arc<SubscriptionSet>,
    pub environment: RuntimeEnvironment,
    pub extensions: Arc<dyn ExtensionCatalog>,
    pub workspace_tags: Arc<dyn WorkspaceTagProvider>,
    pub save_events: Option<Arc<dyn SaveEventSource>>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
}

impl EvaluationContext {
    /// Persist `state` for `id`. Failures are logged and otherwise ignored;
    /// the in-memory decision stands.
    pub fn persist(&self, id: &str, state: &ExperimentStorageState) {
        if let Err(err) = self.store.save(id, state) {
            warn!(experiment_id = %id, error = %err, "failed to persist experiment state");
        }
    }

    /// Append a freshly evaluated experiment to the in-memory list.
    pub async fn insert(&self, experiment: Experiment) {
        self.experiments.write().await.push(experiment);
    }

    /// Move the in-memory entry for `id` to `next`.
    ///
    /// # Returns
    /// The updated experiment, or `None` when there is no entry or the move
    /// would reverse a decision.
    pub async fn update_state(&self, id: &str, next: ExperimentState) -> Option<Experiment> {
        let mut experiments = self.experiments.write().await;
        let experiment = experiments.iter_mut().find(|experiment| experiment.matches_id(id))?;

        match experiment.transition_to(next) {
            Ok(()) => Some(experiment.clone()),
            Err(err) => {
                warn!(error = %err, "ignored in-memory state change");
                None
            }
        }
    }

    /// Publish `experiment` when it is running with a prompt action.
    pub fn notify_if_enabled(&self, experiment: &Experiment) {
        if experiment.is_running()
            && experiment.has_prompt_action()
            && self.events.publish_enabled(experiment)
        {
            debug!(experiment_id = %experiment.id, "prompt experiment enabled");
        }
    }
}

#[cfg(test)]
impl EvaluationContext {
    /// Context over in-memory adapters: stable channel, English UI, no
    /// extensions or tags, clock at `Mon Mar 02 2026` and rolls of 0.5.
    pub(crate) fn in_memory(storage: Arc<crate::adapters::InMemoryStateStorage>) -> Self {
        use crate::adapters::{
            FixedRandom, ManualClock, StaticExtensionCatalog, StaticWorkspaceTags,
        };
        use crate::domain::ports::NullTelemetry;

        Self {
            store: Arc::new(ExperimentStateStore::new(storage)),
            experiments: Arc::new(RwLock::new(Vec::new())),
            curated: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(EventBus::default()),
            subscriptions: Arc::new(SubscriptionSet::new()),
            environment: RuntimeEnvironment::default(),
            extensions: Arc::new(StaticExtensionCatalog::default()),
            workspace_tags: Arc::new(StaticWorkspaceTags::default()),
            save_events: None,
            telemetry: Arc::new(NullTelemetry::new()),
            clock: Arc::new(ManualClock::new("Mon Mar 02 2026")),
            random: Arc::new(FixedRandom::new(0.5)),
        }
    }
}
