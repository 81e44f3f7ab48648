//! Read-only experiment queries.

use anyhow::{anyhow, Result};
use serde::Serialize;

use super::CommandContext;
use crate::cli::output::{output, CommandOutput, ExperimentListOutput, ExperimentOutput};
use crate::domain::models::{Experiment, ExperimentAction, ExperimentActionType};

#[derive(Debug, Serialize)]
pub struct ExperimentDetailOutput {
    #[serde(flatten)]
    pub summary: ExperimentOutput,
    pub action: Option<ExperimentAction>,
    /// Prompt text resolved for the configured display language
    pub prompt_text: Option<String>,
}

impl ExperimentDetailOutput {
    fn new(experiment: &Experiment, display_language: &str) -> Self {
        let prompt_text = experiment
            .action
            .as_ref()
            .and_then(ExperimentAction::as_prompt)
            .and_then(|prompt| prompt.prompt_text.localized(display_language))
            .map(str::to_string);

        Self {
            summary: ExperimentOutput::from(experiment),
            action: experiment.action.clone(),
            prompt_text,
        }
    }
}

impl CommandOutput for ExperimentDetailOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Experiment: {}", self.summary.id),
            format!("Enabled:    {}", self.summary.enabled),
            format!("State:      {}", self.summary.state),
        ];
        if let Some(action_type) = &self.summary.action_type {
            lines.push(format!("Action:     {action_type}"));
        }
        if let Some(text) = &self.prompt_text {
            lines.push(format!("Prompt:     {text}"));
        }
        if let Some(ExperimentAction::AddToRecommendations(properties)) = &self.action {
            lines.push(format!(
                "Recommends: {}",
                properties.recommendations.join(", ")
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct CuratedOutput {
    pub key: String,
    pub extensions: Vec<String>,
}

impl CommandOutput for CuratedOutput {
    fn to_human(&self) -> String {
        if self.extensions.is_empty() {
            return format!("No extensions curated under '{}'.", self.key);
        }
        self.extensions.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn evaluate(ctx: &CommandContext, json_mode: bool) -> Result<()> {
    ctx.evaluate().await;
    let experiments = ctx.service.experiments().await;
    output(&ExperimentListOutput::new(&experiments), json_mode);
    Ok(())
}

pub async fn show(ctx: &CommandContext, id: &str, json_mode: bool) -> Result<()> {
    ctx.evaluate().await;
    let experiment = ctx
        .service
        .get_experiment_by_id(id)
        .await
        .ok_or_else(|| anyhow!("Experiment not found: {id}"))?;

    output(
        &ExperimentDetailOutput::new(&experiment, &ctx.display_language),
        json_mode,
    );
    Ok(())
}

pub async fn eligible(
    ctx: &CommandContext,
    action_type: ExperimentActionType,
    json_mode: bool,
) -> Result<()> {
    ctx.evaluate().await;
    let experiments = ctx
        .service
        .get_eligible_experiments_by_type(action_type)
        .await;
    output(&ExperimentListOutput::new(&experiments), json_mode);
    Ok(())
}

pub async fn curated(ctx: &CommandContext, key: &str, json_mode: bool) -> Result<()> {
    ctx.evaluate().await;
    let extensions = ctx.service.get_curated_extensions_list(key).await;
    output(
        &CuratedOutput {
            key: key.to_string(),
            extensions,
        },
        json_mode,
    );
    Ok(())
}
