use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An installed extension, identified by `publisher.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstalledExtension {
    pub id: String,
}

impl InstalledExtension {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Query for the currently installed extensions.
#[async_trait]
pub trait ExtensionCatalog: Send + Sync {
    async fn installed_extensions(&self) -> Vec<InstalledExtension>;
}
