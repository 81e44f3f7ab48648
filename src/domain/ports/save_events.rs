use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// What happened to a text file model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveEventKind {
    Dirty,
    Saving,
    SaveError,
    Saved,
    Reverted,
}

/// A single file state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSaveEvent {
    pub kind: SaveEventKind,
    pub path: PathBuf,
}

impl FileSaveEvent {
    pub fn new(kind: SaveEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn saved(path: impl Into<PathBuf>) -> Self {
        Self::new(SaveEventKind::Saved, path)
    }
}

/// Stream of file-save notification batches.
pub trait SaveEventSource: Send + Sync {
    /// Subscribe to future batches. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileSaveEvent>>;
}
