//! Save-event replay for pending file-edit evaluations.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use super::CommandContext;
use crate::cli::output::{output, CommandOutput, ExperimentListOutput};
use crate::domain::ports::FileSaveEvent;

#[derive(Debug, Serialize)]
pub struct RecordSaveOutput {
    pub saves: usize,
    pub trackers: usize,
    #[serde(flatten)]
    pub experiments: ExperimentListOutput,
}

impl CommandOutput for RecordSaveOutput {
    fn to_human(&self) -> String {
        format!(
            "Recorded {} save(s) for {} pending evaluation(s).\n{}",
            self.saves,
            self.trackers,
            self.experiments.to_human()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    ctx: &CommandContext,
    paths: Vec<PathBuf>,
    settle_ms: u64,
    json_mode: bool,
) -> Result<()> {
    ctx.evaluate().await;

    let saves = paths.len();
    let batch = paths.into_iter().map(FileSaveEvent::saved).collect();
    let trackers = ctx.save_events.publish(batch);

    if trackers > 0 {
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;
    }

    let experiments = ctx.service.experiments().await;
    output(
        &RecordSaveOutput {
            saves,
            trackers,
            experiments: ExperimentListOutput::new(&experiments),
        },
        json_mode,
    );
    Ok(())
}
