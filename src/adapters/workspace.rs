//! Workspace facts read from configuration.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::models::WorkspaceConfig;
use crate::domain::ports::{ExtensionCatalog, InstalledExtension, WorkspaceTagProvider};

/// Installed extensions as listed under `workspace.installed_extensions`.
#[derive(Debug, Clone)]
pub struct ConfiguredExtensionCatalog {
    extensions: Vec<InstalledExtension>,
}

impl ConfiguredExtensionCatalog {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            extensions: config
                .installed_extensions
                .iter()
                .map(InstalledExtension::new)
                .collect(),
        }
    }
}

#[async_trait]
impl ExtensionCatalog for ConfiguredExtensionCatalog {
    async fn installed_extensions(&self) -> Vec<InstalledExtension> {
        self.extensions.clone()
    }
}

/// Workspace tags as listed under `workspace.tags`.
#[derive(Debug, Clone)]
pub struct ConfiguredWorkspaceTags {
    tags: HashMap<String, bool>,
}

impl ConfiguredWorkspaceTags {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            tags: config.tags.clone(),
        }
    }
}

#[async_trait]
impl WorkspaceTagProvider for ConfiguredWorkspaceTags {
    async fn tags(&self) -> HashMap<String, bool> {
        self.tags.clone()
    }
}
