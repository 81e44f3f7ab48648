use async_trait::async_trait;

use crate::domain::models::RawExperiment;

/// Remote experiment configuration.
#[async_trait]
pub trait ExperimentSource: Send + Sync {
    /// Fetch the current raw experiment list.
    ///
    /// # Returns
    /// * `Some(experiments)` when configuration was retrieved (possibly empty)
    /// * `None` when configuration is unavailable; the engine then rebuilds
    ///   from persisted state instead
    async fn fetch_experiments(&self) -> Option<Vec<RawExperiment>>;
}
