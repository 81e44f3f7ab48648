//! Tracker subscription handles.
//!
//! Every file-edit tracker runs as its own task observing a child token of
//! the set's root token. Disposing the set cancels the root and aborts any
//! task still running.

use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Collection of tracker tasks released together.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    root: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a new subscription; cancelled when the set is disposed.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Keep `handle` so it can be aborted on dispose.
    ///
    /// A handle tracked after disposal is aborted immediately.
    pub fn track(&self, handle: JoinHandle<()>) {
        if self.root.is_cancelled() {
            handle.abort();
            return;
        }
        match self.handles.lock() {
            Ok(mut handles) => {
                handles.retain(|existing| !existing.is_finished());
                handles.push(handle);
            }
            Err(_) => handle.abort(),
        }
    }

    /// Number of tracked tasks that have not finished yet.
    pub fn active(&self) -> usize {
        self.handles
            .lock()
            .map(|handles| handles.iter().filter(|handle| !handle.is_finished()).count())
            .unwrap_or(0)
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel every subscription. Idempotent.
    pub fn dispose(&self) {
        self.root.cancel();
        if let Ok(mut handles) = self.handles.lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispose_cancels_children() {
        let set = SubscriptionSet::new();
        let token = set.child_token();
        let waiter = token.clone();
        set.track(tokio::spawn(async move { waiter.cancelled().await }));
        assert_eq!(set.active(), 1);

        set.dispose();

        assert!(token.is_cancelled());
        assert!(set.is_disposed());
        assert_eq!(set.active(), 0);
    }

    #[tokio::test]
    async fn test_track_after_dispose_aborts() {
        let set = SubscriptionSet::new();
        set.dispose();

        set.track(tokio::spawn(std::future::pending::<()>()));

        assert_eq!(set.active(), 0);
    }
}
