//! JSON file state storage.
//!
//! Keeps the full key-value map in memory and rewrites the file on every
//! change. Writes go to a temporary sibling first and are renamed into
//! place, so a crash never leaves a half-written file behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

use crate::domain::errors::StorageError;
use crate::domain::ports::{StateStorage, StorageScope};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    global: BTreeMap<String, String>,
    #[serde(default)]
    workspace: BTreeMap<String, String>,
}

impl StateFile {
    fn scope(&self, scope: StorageScope) -> &BTreeMap<String, String> {
        match scope {
            StorageScope::Global => &self.global,
            StorageScope::Workspace => &self.workspace,
        }
    }

    fn scope_mut(&mut self, scope: StorageScope) -> &mut BTreeMap<String, String> {
        match scope {
            StorageScope::Global => &mut self.global,
            StorageScope::Workspace => &mut self.workspace,
        }
    }
}

/// State storage persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileStateStorage {
    path: PathBuf,
    state: RwLock<StateFile>,
}

impl JsonFileStateStorage {
    /// Open the store at `path`, creating nothing until the first write.
    ///
    /// An unreadable or malformed file is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring malformed state file");
                StateFile::default()
            }),
            Err(_) => StateFile::default(),
        };

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &StateFile) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        atomic_write(&self.path, &bytes)
    }

    /// Apply `change` and write the result; memory only sees the change once
    /// the file does.
    fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut StateFile),
    {
        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;
        let mut next = state.clone();
        change(&mut next);
        self.persist(&next)?;
        *state = next;
        Ok(())
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("state.json");
    let tmp = path.with_file_name(format!(".{}.tmp.{}", name, std::process::id()));

    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl StateStorage for JsonFileStateStorage {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
        self.state.read().ok()?.scope(scope).get(key).cloned()
    }

    fn store(&self, key: &str, value: &str, scope: StorageScope) -> Result<(), StorageError> {
        self.update(|state| {
            state
                .scope_mut(scope)
                .insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str, scope: StorageScope) -> Result<(), StorageError> {
        self.update(|state| {
            state.scope_mut(scope).remove(key);
        })
    }
}
