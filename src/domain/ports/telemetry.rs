/// Fire-and-forget telemetry sink.
///
/// Implementations must not block and must not report failures back to the
/// caller; a dropped record is acceptable.
pub trait TelemetrySink: Send + Sync {
    fn public_log(&self, event_name: &str, payload: serde_json::Value);
}
