use crate::domain::errors::StorageError;

/// Visibility of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Shared across every workspace of this installation
    Global,
    /// Private to the current workspace
    Workspace,
}

/// String key-value persistence.
///
/// Calls are synchronous so that a decision and its persisted record are
/// updated together, without an await point in between.
pub trait StateStorage: Send + Sync {
    /// Read a value; `None` when the key is absent.
    fn get(&self, key: &str, scope: StorageScope) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn store(&self, key: &str, value: &str, scope: StorageScope) -> Result<(), StorageError>;

    /// Delete a value. Removing an absent key is not an error.
    fn remove(&self, key: &str, scope: StorageScope) -> Result<(), StorageError>;
}
