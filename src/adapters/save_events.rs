//! In-process save-event hub.
//!
//! Editors (or the CLI) publish batches of file-save notifications; every
//! file-edit tracker holds its own receiver.

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::ports::{FileSaveEvent, SaveEventSource};

/// Default number of batches buffered per receiver.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast hub for save-event batches.
#[derive(Debug, Clone)]
pub struct SaveEventHub {
    sender: broadcast::Sender<Vec<FileSaveEvent>>,
}

impl SaveEventHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a batch; returns how many receivers it reached.
    pub fn publish(&self, batch: Vec<FileSaveEvent>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        // No receivers just means no tracker is pending.
        let delivered = self.sender.send(batch).unwrap_or(0);
        trace!(delivered, "published save batch");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SaveEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveEventSource for SaveEventHub {
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileSaveEvent>> {
        self.sender.subscribe()
    }
}
