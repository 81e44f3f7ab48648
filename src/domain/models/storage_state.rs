//! Persisted per-experiment state.
//!
//! Records are plain JSON blobs written under `experiments.<id>`. Older
//! records may be partial or malformed, so parsing goes field by field and
//! anything unreadable is treated as absent.

use serde::{Deserialize, Serialize};

use super::experiment::ExperimentState;

/// Persisted decision and file-edit progress for one experiment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentStorageState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExperimentState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_count: Option<u32>,

    /// Calendar day of the last counted edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_date: Option<String>,
}

impl ExperimentStorageState {
    /// Parse a stored blob. Missing, malformed or mistyped fields are absent.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(object) = raw
            .and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
            .and_then(|value| match value {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
        else {
            return Self::default();
        };

        Self {
            enabled: object.get("enabled").and_then(serde_json::Value::as_bool),
            state: object.get("state").and_then(ExperimentState::from_json),
            edit_count: object
                .get("editCount")
                .and_then(serde_json::Value::as_u64)
                .and_then(|count| u32::try_from(count).ok()),
            last_edited_date: object
                .get("lastEditedDate")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
        }
    }

    pub fn edit_count(&self) -> u32 {
        self.edit_count.unwrap_or(0)
    }

    pub fn is_evaluating(&self) -> bool {
        self.state == Some(ExperimentState::Evaluating)
    }
}

/// Parse the stored registry of experiment ids. Non-string entries are
/// skipped; ids are lowercased.
pub fn parse_registry(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
        .and_then(|value| match value {
            serde_json::Value::Array(items) => Some(items),
            _ => None,
        })
        .map(|items| {
            items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}
