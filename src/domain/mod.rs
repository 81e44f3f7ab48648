//! Domain layer for the experiment engine
//!
//! This module contains the experiment models, persisted state schema and
//! the port traits the engine consumes.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult, StorageError};
