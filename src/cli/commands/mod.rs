//! CLI command implementations.

pub mod complete;
pub mod query;
pub mod record_save;

use anyhow::Result;
use std::sync::Arc;

use crate::adapters::{
    ConfiguredExtensionCatalog, ConfiguredWorkspaceTags, HttpExperimentSource,
    JsonFileStateStorage, SaveEventHub, TracingTelemetry,
};
use crate::cli::types::Commands;
use crate::domain::models::Config;
use crate::services::ExperimentService;

/// Service wired to the production adapters, plus the hub used to feed it
/// save events.
pub struct CommandContext {
    pub service: ExperimentService,
    pub save_events: SaveEventHub,
    pub display_language: String,
}

impl CommandContext {
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpExperimentSource::new(&config.experiments)?;
        let storage = JsonFileStateStorage::open(&config.storage.path);
        let save_events = SaveEventHub::new();

        let service = ExperimentService::new(
            Arc::new(source),
            Arc::new(storage),
            config.environment.clone(),
        )
        .with_extensions(Arc::new(ConfiguredExtensionCatalog::new(&config.workspace)))
        .with_workspace_tags(Arc::new(ConfiguredWorkspaceTags::new(&config.workspace)))
        .with_save_events(Arc::new(save_events.clone()))
        .with_telemetry(Arc::new(TracingTelemetry::new()));

        Ok(Self {
            service,
            save_events,
            display_language: config.environment.display_language.clone(),
        })
    }

    /// Run the evaluation build; the CLI has no startup phase to wait for.
    pub async fn evaluate(&self) {
        self.service.initialize(futures::future::ready(())).await;
    }
}

/// Dispatch a parsed command.
pub async fn execute(command: Commands, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::from_config(config)?;

    let result = match command {
        Commands::Evaluate => query::evaluate(&ctx, json_mode).await,
        Commands::Show { id } => query::show(&ctx, &id, json_mode).await,
        Commands::Eligible { action_type } => query::eligible(&ctx, action_type, json_mode).await,
        Commands::Curated { key } => query::curated(&ctx, &key, json_mode).await,
        Commands::Complete { id } => complete::execute(&ctx, &id, json_mode).await,
        Commands::RecordSave { paths, settle_ms } => {
            record_save::execute(&ctx, paths, settle_ms, json_mode).await
        }
    };

    ctx.service.dispose();
    result
}
