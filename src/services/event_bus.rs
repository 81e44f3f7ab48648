//! Experiment event bus.
//!
//! Broadcasts experiments that newly reach `Run` with a prompt action.
//! Each event carries a sequence number; each experiment id is published
//! at most once per bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::Experiment;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing sequence number assigned by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification that an experiment became enabled for its prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentEvent {
    pub id: EventId,
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub experiment: Experiment,
}

/// Configuration for the event bus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Broadcast channel for experiment notifications.
pub struct EventBus {
    sender: broadcast::Sender<ExperimentEvent>,
    sequence: AtomicU64,
    published: Mutex<HashSet<String>>,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
            published: Mutex::new(HashSet::new()),
        }
    }

    /// Publish `experiment` unless its id was already published.
    ///
    /// # Returns
    /// `true` when an event was emitted.
    pub fn publish_enabled(&self, experiment: &Experiment) -> bool {
        let first_time = self
            .published
            .lock()
            .map(|mut published| published.insert(experiment.id.to_lowercase()))
            .unwrap_or(false);
        if !first_time {
            return false;
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let event = ExperimentEvent {
            id: EventId::new(),
            sequence: SequenceNumber(seq),
            timestamp: Utc::now(),
            experiment: experiment.clone(),
        };

        // Broadcast to subscribers (ignore send errors - may have no subscribers)
        let _ = self.sender.send(event);
        tracing::debug!(experiment_id = %experiment.id, sequence = seq, "published event");
        true
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ExperimentEvent> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExperimentState, RawExperiment};

    fn running(id: &str) -> Experiment {
        let mut experiment = Experiment::from_raw(&RawExperiment::new(id));
        experiment.state = ExperimentState::Run;
        experiment
    }

    #[tokio::test]
    async fn test_event_bus_sequence_assignment() {
        let bus = EventBus::default();
        assert_eq!(bus.current_sequence().0, 0);

        let mut rx = bus.subscribe();

        assert!(bus.publish_enabled(&running("a")));
        let event1 = rx.recv().await.unwrap();
        assert_eq!(event1.sequence.0, 0);
        assert_eq!(event1.experiment.id, "a");

        assert!(bus.publish_enabled(&running("b")));
        let event2 = rx.recv().await.unwrap();
        assert_eq!(event2.sequence.0, 1);

        assert_eq!(bus.current_sequence().0, 2);
    }

    #[tokio::test]
    async fn test_each_experiment_published_once() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        assert!(bus.publish_enabled(&running("Exp")));
        assert!(!bus.publish_enabled(&running("exp")));

        rx.recv().await.unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(bus.current_sequence().0, 1);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish_enabled(&running("a")));
    }
}
