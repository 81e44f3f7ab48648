//! Experiments - experiment evaluation engine
//!
//! Decides whether remotely configured experiments run for the current user,
//! persists each decision, and notifies consumers when a prompt experiment
//! becomes active. Undecided experiments can wait on observed file edits
//! before a final probability roll.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and port traits
//! - **Service Layer** (`services`): Condition gates, state store, evaluation
//!   engine, file-edit tracker and the consumer-facing `ExperimentService`
//! - **Adapters** (`adapters`): HTTP source, JSON file storage, in-memory and
//!   system implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use experiments::adapters::{InMemoryStateStorage, StaticExperimentSource};
//! use experiments::domain::models::{RawExperiment, RuntimeEnvironment};
//! use experiments::services::ExperimentService;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ExperimentService::new(
//!         Arc::new(StaticExperimentSource::new(vec![RawExperiment::new("exp.tips")])),
//!         Arc::new(InMemoryStateStorage::new()),
//!         RuntimeEnvironment::default(),
//!     );
//!     service.initialize(async {}).await;
//!     assert!(service.get_experiment_by_id("exp.tips").await.is_some());
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, Experiment, ExperimentAction, ExperimentActionType, ExperimentCondition,
    ExperimentState, ExperimentStorageState, RawExperiment, RuntimeEnvironment,
};
pub use domain::ports::{
    Clock, ExperimentSource, ExtensionCatalog, FileSaveEvent, RandomSource, SaveEventSource,
    StateStorage, StorageScope, TelemetrySink, WorkspaceTagProvider,
};
pub use domain::{DomainError, DomainResult, StorageError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ExperimentEvent, ExperimentService};
