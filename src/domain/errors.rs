//! Domain errors for the experiment engine.

use thiserror::Error;

use super::models::ExperimentState;

/// Errors raised by state storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Domain-level errors that can occur while evaluating experiments.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid state transition for experiment {id} from {from} to {to}")]
    InvalidStateTransition {
        id: String,
        from: ExperimentState,
        to: ExperimentState,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type DomainResult<T> = Result<T, DomainError>;
