//! Null telemetry sink.
//!
//! Used when telemetry is not wanted but the engine still requires a
//! TelemetrySink implementation.

use super::TelemetrySink;

/// A no-op telemetry sink that drops every record.
#[derive(Debug, Clone, Default)]
pub struct NullTelemetry;

impl NullTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for NullTelemetry {
    fn public_log(&self, _event_name: &str, _payload: serde_json::Value) {}
}
