//! Experiment service.
//!
//! Consumer-facing registry over the evaluated experiment list. The list is
//! built once, after the startup signal passed to [`ExperimentService::initialize`]
//! resolves; queries wait for that build to finish.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, OnceCell, RwLock};
use tracing::debug;

use super::context::EvaluationContext;
use super::evaluation_engine::EvaluationEngine;
use super::event_bus::{EventBus, ExperimentEvent};
use super::state_store::ExperimentStateStore;
use super::subscriptions::SubscriptionSet;
use crate::adapters::{StaticExtensionCatalog, StaticWorkspaceTags, SystemClock, ThreadRandom};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Experiment, ExperimentActionType, ExperimentState, RuntimeEnvironment,
};
use crate::domain::ports::{
    Clock, ExperimentSource, ExtensionCatalog, NullTelemetry, RandomSource, SaveEventSource,
    StateStorage, TelemetrySink, WorkspaceTagProvider,
};

pub struct ExperimentService {
    ctx: EvaluationContext,
    source: Arc<dyn ExperimentSource>,
    built: OnceCell<()>,
    ready: watch::Sender<bool>,
}

impl ExperimentService {
    /// Create a service with system clock, thread RNG, no telemetry, no
    /// installed extensions, no workspace tags and no save events.
    pub fn new(
        source: Arc<dyn ExperimentSource>,
        storage: Arc<dyn StateStorage>,
        environment: RuntimeEnvironment,
    ) -> Self {
        let ctx = EvaluationContext {
            store: Arc::new(ExperimentStateStore::new(storage)),
            experiments: Arc::new(RwLock::new(Vec::new())),
            curated: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(EventBus::default()),
            subscriptions: Arc::new(SubscriptionSet::new()),
            environment,
            extensions: Arc::new(StaticExtensionCatalog::default()),
            workspace_tags: Arc::new(StaticWorkspaceTags::default()),
            save_events: None,
            telemetry: Arc::new(NullTelemetry::new()),
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
        };
        let (ready, _) = watch::channel(false);

        Self {
            ctx,
            source,
            built: OnceCell::new(),
            ready,
        }
    }

    pub fn with_extensions(mut self, extensions: Arc<dyn ExtensionCatalog>) -> Self {
        self.ctx.extensions = extensions;
        self
    }

    pub fn with_workspace_tags(mut self, tags: Arc<dyn WorkspaceTagProvider>) -> Self {
        self.ctx.workspace_tags = tags;
        self
    }

    pub fn with_save_events(mut self, save_events: Arc<dyn SaveEventSource>) -> Self {
        self.ctx.save_events = Some(save_events);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.ctx.telemetry = telemetry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ctx.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.ctx.random = random;
        self
    }

    /// Wait for `startup`, then build the experiment list.
    ///
    /// The build runs once; later or concurrent calls wait for the same
    /// build and their `startup` futures are dropped unpolled.
    pub async fn initialize<F>(&self, startup: F)
    where
        F: Future<Output = ()>,
    {
        self.built
            .get_or_init(move || async move {
                startup.await;
                EvaluationEngine::new(self.ctx.clone(), self.source.clone())
                    .build()
                    .await;
                self.ready.send_replace(true);
            })
            .await;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    async fn wait_ready(&self) {
        let mut ready = self.ready.subscribe();
        // The sender lives as long as `self`, so this only returns once ready.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Snapshot of every processed experiment.
    pub async fn experiments(&self) -> Vec<Experiment> {
        self.wait_ready().await;
        self.ctx.experiments.read().await.clone()
    }

    /// Experiment with the given id, compared case-insensitively.
    pub async fn get_experiment_by_id(&self, id: &str) -> Option<Experiment> {
        self.wait_ready().await;
        self.ctx
            .experiments
            .read()
            .await
            .iter()
            .find(|experiment| experiment.matches_id(id))
            .cloned()
    }

    /// Running experiments with the given action type.
    ///
    /// `Custom` also matches experiments that declare no action at all.
    pub async fn get_eligible_experiments_by_type(
        &self,
        action_type: ExperimentActionType,
    ) -> Vec<Experiment> {
        self.wait_ready().await;
        self.ctx
            .experiments
            .read()
            .await
            .iter()
            .filter(|experiment| experiment.is_running())
            .filter(|experiment| match (&experiment.action, action_type) {
                (None, ExperimentActionType::Custom) => true,
                (Some(action), wanted) => action.action_type() == wanted,
                (None, _) => false,
            })
            .cloned()
            .collect()
    }

    /// Extensions curated under `key` by the first running experiment that
    /// declares it; empty when none does.
    pub async fn get_curated_extensions_list(&self, key: &str) -> Vec<String> {
        self.wait_ready().await;
        let experiments = self.ctx.experiments.read().await;
        let curated = self.ctx.curated.read().await;

        experiments
            .iter()
            .filter(|experiment| experiment.is_running())
            .filter_map(|experiment| curated.get(&experiment.id.to_lowercase()))
            .find(|list| list.key == key)
            .map(|list| list.extensions.clone())
            .unwrap_or_default()
    }

    /// Mark an experiment as done. Works for unknown ids and is idempotent.
    pub async fn mark_as_completed(&self, id: &str) -> DomainResult<()> {
        self.ctx.store.mark_completed(id)?;
        if self
            .ctx
            .update_state(id, ExperimentState::Complete)
            .await
            .is_some()
        {
            debug!(experiment_id = %id, "experiment completed");
        }
        Ok(())
    }

    /// Stream of experiments that newly reach `Run` with a prompt action.
    pub fn subscribe(&self) -> broadcast::Receiver<ExperimentEvent> {
        self.ctx.events.subscribe()
    }

    /// Number of file-edit trackers still running.
    pub fn active_trackers(&self) -> usize {
        self.ctx.subscriptions.active()
    }

    /// Stop every file-edit tracker.
    pub fn dispose(&self) {
        self.ctx.subscriptions.dispose();
    }
}

impl Drop for ExperimentService {
    fn drop(&mut self) {
        // Tracker tasks hold context clones, so the set is not dropped with us.
        self.dispose();
    }
}
