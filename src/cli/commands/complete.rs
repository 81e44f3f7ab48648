//! Completion marking.

use anyhow::{Context, Result};

use super::CommandContext;
use crate::cli::output::{output, ActionOutput};

pub async fn execute(ctx: &CommandContext, id: &str, json_mode: bool) -> Result<()> {
    ctx.service
        .mark_as_completed(id)
        .await
        .with_context(|| format!("Failed to mark experiment {id} as completed"))?;

    output(
        &ActionOutput {
            success: true,
            message: format!("Experiment {id} marked as completed"),
        },
        json_mode,
    );
    Ok(())
}
