//! File-edit tracker.
//!
//! Resolves an `Evaluating` experiment by counting qualifying file saves,
//! at most one per calendar day. Progress lives only in persisted state,
//! which is re-read for every batch; the tracker itself holds nothing but
//! the experiment's immutable condition data.

use std::collections::HashMap;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::conditions::{path_filter, probability_gate, workspace_filter};
use super::context::EvaluationContext;
use crate::domain::models::{
    ExperimentCondition, ExperimentState, ExperimentStorageState, FileEditsCondition,
};
use crate::domain::ports::{FileSaveEvent, SaveEventKind};

/// Outcome of processing one batch of save events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    /// Threshold not reached yet
    Pending,
    /// Persisted state is no longer `Evaluating`; nothing left to do
    Stopped,
    /// Threshold reached and the probability roll decided the outcome
    Decided(ExperimentState),
}

impl TrackerStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

pub struct FileEditTracker {
    ctx: EvaluationContext,
    id: String,
    condition: FileEditsCondition,
    min_edit_count: u32,
    probability: f64,
}

impl FileEditTracker {
    /// Build a tracker for `id`; `None` unless the condition carries a file
    /// edit threshold.
    pub fn new(
        ctx: EvaluationContext,
        id: impl Into<String>,
        condition: &ExperimentCondition,
    ) -> Option<Self> {
        let (edits, min_edit_count) = condition.edit_threshold()?;
        Some(Self {
            ctx,
            id: id.into(),
            condition: edits.clone(),
            min_edit_count,
            probability: condition.probability(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the tracker on its own task until it finishes or `cancel` fires.
    pub fn spawn(
        self,
        receiver: Receiver<Vec<FileSaveEvent>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(receiver, cancel).await })
    }

    async fn run(self, mut receiver: Receiver<Vec<FileSaveEvent>>, cancel: CancellationToken) {
        debug!(experiment_id = %self.id, "file edit tracker started");

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(experiment_id = %self.id, "file edit tracker cancelled");
                    return;
                }
                received = receiver.recv() => received,
            };

            let mut batch = match received {
                Ok(batch) => batch,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(experiment_id = %self.id, skipped, "tracker lagged behind save events");
                    continue;
                }
                Err(RecvError::Closed) => {
                    debug!(experiment_id = %self.id, "save event stream closed");
                    return;
                }
            };

            // Fold in batches that queued up meanwhile.
            loop {
                match receiver.try_recv() {
                    Ok(more) => batch.extend(more),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(
                            experiment_id = %self.id,
                            skipped,
                            "tracker lagged behind save events"
                        );
                    }
                    Err(_) => break,
                }
            }

            if self.process_batch(&batch).await.is_finished() {
                return;
            }
        }
    }

    /// Apply one batch of save events to the persisted progress.
    pub async fn process_batch(&self, batch: &[FileSaveEvent]) -> TrackerStatus {
        let mut state = self.ctx.store.load(&self.id);
        if !state.is_evaluating() {
            debug!(experiment_id = %self.id, state = ?state.state, "no longer evaluating");
            return TrackerStatus::Stopped;
        }

        let today = self.ctx.clock.today();
        let mut tags: Option<HashMap<String, bool>> = None;

        for event in batch {
            if event.kind != SaveEventKind::Saved {
                continue;
            }
            if state.last_edited_date.as_deref() == Some(today.as_str()) {
                continue;
            }
            if state.edit_count() >= self.min_edit_count {
                continue;
            }
            if !path_filter(self.condition.file_path_pattern.as_deref(), &event.path) {
                continue;
            }
            if self.condition.has_workspace_filters() {
                if tags.is_none() {
                    tags = Some(self.ctx.workspace_tags.tags().await);
                }
                let present = tags.as_ref().is_some_and(|tags| {
                    workspace_filter(
                        self.condition.workspace_includes.as_deref(),
                        self.condition.workspace_excludes.as_deref(),
                        tags,
                    )
                });
                if !present {
                    continue;
                }
            }

            state.edit_count = Some(state.edit_count() + 1);
            state.last_edited_date = Some(today.clone());
            self.ctx.persist(&self.id, &state);
            debug!(
                experiment_id = %self.id,
                edit_count = state.edit_count(),
                min_edit_count = self.min_edit_count,
                "counted file edit"
            );

            if state.edit_count() >= self.min_edit_count {
                return self.finalize(state).await;
            }
        }

        TrackerStatus::Pending
    }

    async fn finalize(&self, mut state: ExperimentStorageState) -> TrackerStatus {
        let decision = if probability_gate(self.probability, self.ctx.random.as_ref()) {
            ExperimentState::Run
        } else {
            ExperimentState::NoRun
        };

        state.state = Some(decision);
        self.ctx.persist(&self.id, &state);

        if let Some(experiment) = self.ctx.update_state(&self.id, decision).await {
            self.ctx.notify_if_enabled(&experiment);
        }

        debug!(experiment_id = %self.id, state = %decision, "file edit threshold reached");
        TrackerStatus::Decided(decision)
    }
}
