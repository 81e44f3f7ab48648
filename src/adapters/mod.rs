//! Adapters implementing the domain ports.

pub mod http;
pub mod json_file;
pub mod memory;
pub mod save_events;
pub mod system;
pub mod telemetry;
pub mod workspace;

pub use http::{HttpExperimentSource, SourceError};
pub use json_file::JsonFileStateStorage;
pub use memory::{
    FixedRandom, InMemoryStateStorage, ManualClock, RecordingTelemetry, StaticExperimentSource,
    StaticExtensionCatalog, StaticWorkspaceTags, TelemetryRecord,
};
pub use save_events::SaveEventHub;
pub use system::{SystemClock, ThreadRandom, DAY_FORMAT};
pub use telemetry::TracingTelemetry;
pub use workspace::{ConfiguredExtensionCatalog, ConfiguredWorkspaceTags};
