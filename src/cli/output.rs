//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::Experiment;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Print an error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "success": false, "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}

/// Create a standard list table with the given headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table with a count line.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{total} {noun}:\n{table}")
}

/// One experiment row.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentOutput {
    pub id: String,
    pub enabled: bool,
    pub state: String,
    pub action_type: Option<String>,
}

impl From<&Experiment> for ExperimentOutput {
    fn from(experiment: &Experiment) -> Self {
        Self {
            id: experiment.id.clone(),
            enabled: experiment.enabled,
            state: experiment.state.as_str().to_string(),
            action_type: experiment
                .action
                .as_ref()
                .map(|action| action.action_type().as_str().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExperimentListOutput {
    pub experiments: Vec<ExperimentOutput>,
    pub total: usize,
}

impl ExperimentListOutput {
    pub fn new(experiments: &[Experiment]) -> Self {
        Self {
            total: experiments.len(),
            experiments: experiments.iter().map(ExperimentOutput::from).collect(),
        }
    }
}

impl CommandOutput for ExperimentListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "enabled", "state", "action"]);
        for experiment in &self.experiments {
            table.add_row(vec![
                experiment.id.clone(),
                experiment.enabled.to_string(),
                experiment.state.clone(),
                experiment.action_type.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        render_list("experiment", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ActionOutput {
    pub success: bool,
    pub message: String,
}

impl CommandOutput for ActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
