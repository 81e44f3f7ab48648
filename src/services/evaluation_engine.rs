//! Evaluation engine.
//!
//! Builds the processed experiment list once per process:
//! 1. Fetch raw configuration; fall back to persisted state when unavailable
//! 2. Refresh the id registry, pruning records of experiments no longer enabled
//! 3. Merge each experiment with its persisted state
//! 4. Decide undecided experiments through the condition gates, handing off
//!    to a [`FileEditTracker`] when a file-edit threshold is still pending
//! 5. Report the processed list to telemetry

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::conditions::{
    extension_gate, language_gate, needs_installed_extensions, probability_gate, quality_gate,
};
use super::context::EvaluationContext;
use super::file_edit_tracker::FileEditTracker;
use crate::domain::models::{
    Experiment, ExperimentCondition, ExperimentState, ExperimentStorageState, RawExperiment,
};
use crate::domain::ports::ExperimentSource;

/// Telemetry event carrying the processed experiment list.
pub const EXPERIMENTS_TELEMETRY_EVENT: &str = "experiments";

/// Result of running the condition gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Decided(ExperimentState),
    /// File-edit threshold not met yet; resolved by a tracker
    AwaitEdits,
}

pub struct EvaluationEngine {
    ctx: EvaluationContext,
    source: Arc<dyn ExperimentSource>,
}

impl EvaluationEngine {
    pub fn new(ctx: EvaluationContext, source: Arc<dyn ExperimentSource>) -> Self {
        Self { ctx, source }
    }

    /// Build the in-memory experiment list.
    pub async fn build(&self) {
        match self.source.fetch_experiments().await {
            Some(raw) => self.build_from_config(&raw).await,
            None => {
                warn!("experiment configuration unavailable, using persisted state");
                self.rebuild_from_storage().await;
            }
        }
    }

    async fn build_from_config(&self, raw: &[RawExperiment]) {
        let enabled_ids: BTreeSet<String> = raw
            .iter()
            .filter(|experiment| experiment.enabled)
            .map(|experiment| experiment.id.to_lowercase())
            .collect();

        match self.ctx.store.refresh_registry(&enabled_ids) {
            Ok(removed) if !removed.is_empty() => {
                debug!(count = removed.len(), "pruned experiments no longer enabled");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to refresh experiment registry"),
        }

        let mut seen = HashSet::new();
        for experiment in raw {
            if !seen.insert(experiment.id.to_lowercase()) {
                warn!(experiment_id = %experiment.id, "ignoring duplicate experiment id");
                continue;
            }
            self.process(experiment).await;
        }

        let snapshot = self.ctx.experiments.read().await.clone();
        match serde_json::to_value(&snapshot) {
            Ok(payload) => self
                .ctx
                .telemetry
                .public_log(EXPERIMENTS_TELEMETRY_EVENT, payload),
            Err(err) => warn!(error = %err, "failed to serialize experiments for telemetry"),
        }

        log_summary(&snapshot, "experiments evaluated");
    }

    async fn rebuild_from_storage(&self) {
        for id in self.ctx.store.load_registry() {
            let persisted = self.ctx.store.load(&id);
            let Some(state) = persisted.state else {
                debug!(experiment_id = %id, "no persisted state, dropping");
                continue;
            };

            self.ctx
                .insert(Experiment {
                    id,
                    enabled: persisted.enabled.unwrap_or(true),
                    state,
                    action: None,
                })
                .await;
        }

        let snapshot = self.ctx.experiments.read().await.clone();
        log_summary(&snapshot, "experiments rebuilt from persisted state");
    }

    async fn process(&self, raw: &RawExperiment) {
        let mut experiment = Experiment::from_raw(raw);

        if let Some(curated) = experiment.curated_extensions() {
            self.ctx
                .curated
                .write()
                .await
                .insert(experiment.id.to_lowercase(), curated);
        }

        let mut persisted = self.ctx.store.load(&experiment.id);

        if !experiment.enabled {
            // Completion is terminal; anything else is NoRun while disabled.
            persisted.enabled.get_or_insert(false);
            if persisted.state != Some(ExperimentState::Complete) {
                persisted.state = Some(ExperimentState::NoRun);
            }
            experiment.state = persisted.state.unwrap_or(ExperimentState::NoRun);
            self.ctx.persist(&experiment.id, &persisted);
            debug!(experiment_id = %experiment.id, state = %experiment.state, "disabled");
            self.ctx.insert(experiment).await;
            return;
        }

        let resumed = persisted.is_evaluating();
        persisted.enabled.get_or_insert(experiment.enabled);
        experiment.state = *persisted.state.get_or_insert(experiment.state);

        if experiment.state.is_decided() {
            self.ctx.persist(&experiment.id, &persisted);
            debug!(experiment_id = %experiment.id, state = %experiment.state, "already decided");
            self.ctx.insert(experiment).await;
            return;
        }

        let outcome = self
            .run_gates(raw.condition.as_ref(), &persisted, resumed)
            .await;

        match outcome {
            GateOutcome::Decided(state) => {
                experiment.state = state;
                persisted.state = Some(state);
                self.ctx.persist(&experiment.id, &persisted);
                debug!(experiment_id = %experiment.id, state = %state, "experiment decided");

                self.ctx.insert(experiment.clone()).await;
                self.ctx.notify_if_enabled(&experiment);
            }
            GateOutcome::AwaitEdits => {
                self.ctx.persist(&experiment.id, &persisted);
                debug!(
                    experiment_id = %experiment.id,
                    edit_count = persisted.edit_count(),
                    "experiment awaiting file edits"
                );

                let id = experiment.id.clone();
                self.ctx.insert(experiment).await;
                if let Some(condition) = raw.condition.as_ref() {
                    self.start_tracker(&id, condition);
                }
            }
        }
    }

    /// Run the gates in order: quality, language, extensions, then either
    /// the file-edit hand-off or the probability roll.
    ///
    /// When `resumed` and the condition asks to be evaluated only once, the
    /// environment gates already passed in an earlier process and are skipped.
    pub async fn run_gates(
        &self,
        condition: Option<&ExperimentCondition>,
        persisted: &ExperimentStorageState,
        resumed: bool,
    ) -> GateOutcome {
        let Some(condition) = condition else {
            return GateOutcome::Decided(ExperimentState::Run);
        };

        if !(resumed && condition.evaluates_only_once()) {
            let environment = &self.ctx.environment;
            if !quality_gate(condition, environment) {
                return GateOutcome::Decided(ExperimentState::NoRun);
            }
            if !language_gate(
                condition.display_language.as_deref(),
                &environment.display_language,
            ) {
                return GateOutcome::Decided(ExperimentState::NoRun);
            }
            if needs_installed_extensions(condition.installed_extensions.as_ref()) {
                let installed = self.ctx.extensions.installed_extensions().await;
                if !extension_gate(condition.installed_extensions.as_ref(), &installed) {
                    return GateOutcome::Decided(ExperimentState::NoRun);
                }
            }
        }

        if let Some((_, min_edit_count)) = condition.edit_threshold() {
            if persisted.edit_count() < min_edit_count {
                return GateOutcome::AwaitEdits;
            }
        }

        if probability_gate(condition.probability(), self.ctx.random.as_ref()) {
            GateOutcome::Decided(ExperimentState::Run)
        } else {
            GateOutcome::Decided(ExperimentState::NoRun)
        }
    }

    fn start_tracker(&self, id: &str, condition: &ExperimentCondition) {
        let Some(source) = self.ctx.save_events.as_ref() else {
            debug!(experiment_id = %id, "no save event source, experiment stays evaluating");
            return;
        };
        if self.ctx.subscriptions.is_disposed() {
            return;
        }
        let Some(tracker) = FileEditTracker::new(self.ctx.clone(), id, condition) else {
            return;
        };

        let handle = tracker.spawn(source.subscribe(), self.ctx.subscriptions.child_token());
        self.ctx.subscriptions.track(handle);
    }
}

fn log_summary(experiments: &[Experiment], message: &str) {
    let count = |state: ExperimentState| {
        experiments
            .iter()
            .filter(|experiment| experiment.state == state)
            .count()
    };

    info!(
        total = experiments.len(),
        run = count(ExperimentState::Run),
        no_run = count(ExperimentState::NoRun),
        evaluating = count(ExperimentState::Evaluating),
        complete = count(ExperimentState::Complete),
        "{message}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        FixedRandom, InMemoryStateStorage, StaticExperimentSource, StaticExtensionCatalog,
    };
    use crate::domain::models::{ExtensionsCondition, FileEditsCondition, ProductQuality};

    fn engine(ctx: EvaluationContext) -> EvaluationEngine {
        EvaluationEngine::new(ctx, Arc::new(StaticExperimentSource::new(Vec::new())))
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::in_memory(Arc::new(InMemoryStateStorage::new()))
    }

    #[tokio::test]
    async fn test_no_condition_runs() {
        let outcome = engine(ctx())
            .run_gates(None, &ExperimentStorageState::default(), false)
            .await;
        assert_eq!(outcome, GateOutcome::Decided(ExperimentState::Run));
    }

    #[tokio::test]
    async fn test_gates_short_circuit_before_roll() {
        let mut ctx = ctx();
        ctx.random = Arc::new(FixedRandom::new(0.0));
        ctx.environment.quality = ProductQuality::Stable;
        let condition = ExperimentCondition {
            insiders_only: Some(true),
            user_probability: Some(1.0),
            ..Default::default()
        };

        let outcome = engine(ctx)
            .run_gates(Some(&condition), &ExperimentStorageState::default(), false)
            .await;
        assert_eq!(outcome, GateOutcome::Decided(ExperimentState::NoRun));
    }

    #[tokio::test]
    async fn test_threshold_already_met_rolls_immediately() {
        let condition = ExperimentCondition {
            file_edits: Some(FileEditsCondition {
                min_edit_count: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let engine = engine(ctx());

        let pending = ExperimentStorageState {
            edit_count: Some(1),
            ..Default::default()
        };
        let met = ExperimentStorageState {
            edit_count: Some(2),
            ..Default::default()
        };

        assert_eq!(
            engine.run_gates(Some(&condition), &pending, false).await,
            GateOutcome::AwaitEdits
        );
        assert_eq!(
            engine.run_gates(Some(&condition), &met, false).await,
            GateOutcome::Decided(ExperimentState::Run)
        );
    }

    #[tokio::test]
    async fn test_evaluate_only_once_skips_environment_gates_on_resume() {
        let mut ctx = ctx();
        ctx.extensions = Arc::new(StaticExtensionCatalog::new(["blocked.ext"]));
        let condition = ExperimentCondition {
            installed_extensions: Some(ExtensionsCondition {
                includes: None,
                excludes: Some(vec!["blocked.ext".to_string()]),
            }),
            evaluate_only_once: Some(true),
            ..Default::default()
        };
        let engine = engine(ctx);
        let persisted = ExperimentStorageState::default();

        assert_eq!(
            engine.run_gates(Some(&condition), &persisted, false).await,
            GateOutcome::Decided(ExperimentState::NoRun)
        );
        assert_eq!(
            engine.run_gates(Some(&condition), &persisted, true).await,
            GateOutcome::Decided(ExperimentState::Run)
        );
    }
}
