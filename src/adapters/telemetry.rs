//! Tracing-backed telemetry sink.

use tracing::info;

use crate::domain::ports::TelemetrySink;

/// Emits telemetry records as structured log events on the `telemetry`
/// target.
#[derive(Debug, Clone, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for TracingTelemetry {
    fn public_log(&self, event_name: &str, payload: serde_json::Value) {
        info!(target: "telemetry", event = event_name, payload = %payload, "telemetry");
    }
}
