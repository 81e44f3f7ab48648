//! HTTP experiment source.
//!
//! Fetches `{"experiments": [...]}` from the configured endpoint. Any failure
//! (connection, non-success status, malformed body) makes the source report
//! the configuration as unavailable so the engine falls back to persisted
//! state.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::models::{ExperimentsConfig, RawExperiment};
use crate::domain::ports::ExperimentSource;

/// Failures while retrieving remote configuration.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed experiment payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ExperimentsPayload {
    experiments: Vec<RawExperiment>,
}

/// Experiment source backed by a JSON endpoint.
pub struct HttpExperimentSource {
    http_client: ReqwestClient,
    endpoint: Option<String>,
    enabled: bool,
}

impl HttpExperimentSource {
    /// Build a source from configuration.
    ///
    /// # Returns
    /// * `Err(anyhow::Error)` - Failed to build HTTP client
    pub fn new(config: &ExperimentsConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            enabled: config.enabled,
        })
    }

    /// Fetch and decode the experiment list from `endpoint`.
    pub async fn fetch_from(&self, endpoint: &str) -> Result<Vec<RawExperiment>, SourceError> {
        let response = self.http_client.get(endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(SourceError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let payload: ExperimentsPayload = serde_json::from_slice(&bytes)?;
        Ok(payload.experiments)
    }
}

#[async_trait]
impl ExperimentSource for HttpExperimentSource {
    async fn fetch_experiments(&self) -> Option<Vec<RawExperiment>> {
        if !self.enabled {
            debug!("experiments disabled by configuration");
            return Some(Vec::new());
        }

        let Some(endpoint) = self.endpoint.as_deref() else {
            debug!("no experiment endpoint configured");
            return Some(Vec::new());
        };

        match self.fetch_from(endpoint).await {
            Ok(experiments) => {
                debug!(endpoint, count = experiments.len(), "fetched experiments");
                Some(experiments)
            }
            Err(err) => {
                warn!(endpoint, error = %err, "experiment configuration unavailable");
                None
            }
        }
    }
}
