//! Experiment services.
//!
//! - `conditions`: pure gate predicates
//! - `state_store`: typed persisted state and the id registry
//! - `file_edit_tracker`: resolves experiments waiting on file edits
//! - `evaluation_engine`: builds the processed experiment list
//! - `experiment_service`: consumer-facing registry and query API

pub mod conditions;
pub mod context;
pub mod evaluation_engine;
pub mod event_bus;
pub mod experiment_service;
pub mod file_edit_tracker;
pub mod state_store;
pub mod subscriptions;

pub use context::EvaluationContext;
pub use evaluation_engine::{EvaluationEngine, GateOutcome, EXPERIMENTS_TELEMETRY_EVENT};
pub use event_bus::{EventBus, EventBusConfig, EventId, ExperimentEvent, SequenceNumber};
pub use experiment_service::ExperimentService;
pub use file_edit_tracker::{FileEditTracker, TrackerStatus};
pub use state_store::{storage_key, ExperimentStateStore, ALL_EXPERIMENTS_KEY};
pub use subscriptions::SubscriptionSet;
