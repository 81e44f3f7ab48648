use async_trait::async_trait;
use std::collections::HashMap;

/// Computes the tag set describing the open workspace.
#[async_trait]
pub trait WorkspaceTagProvider: Send + Sync {
    /// Tag name to presence. Missing tags count as absent.
    async fn tags(&self) -> HashMap<String, bool>;
}
