//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the engine consumes from its
//! collaborators:
//! - ExperimentSource: remote experiment configuration
//! - StateStorage: process-global key-value persistence
//! - SaveEventSource: batches of file-save notifications
//! - ExtensionCatalog / WorkspaceTagProvider: workspace facts for conditions
//! - TelemetrySink: fire-and-forget usage records
//! - Clock / RandomSource: calendar day and sampling rolls
//!
//! Adapters for each live under `crate::adapters`.

pub mod clock;
pub mod experiment_source;
pub mod extension_catalog;
pub mod null_telemetry;
pub mod random;
pub mod save_events;
pub mod state_storage;
pub mod telemetry;
pub mod workspace_tags;

pub use clock::Clock;
pub use experiment_source::ExperimentSource;
pub use extension_catalog::{ExtensionCatalog, InstalledExtension};
pub use null_telemetry::NullTelemetry;
pub use random::RandomSource;
pub use save_events::{FileSaveEvent, SaveEventKind, SaveEventSource};
pub use state_storage::{StateStorage, StorageScope};
pub use telemetry::TelemetrySink;
pub use workspace_tags::WorkspaceTagProvider;
