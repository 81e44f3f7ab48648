//! Typed experiment actions.
//!
//! Remote configuration describes an action as a type tag plus an opaque
//! property bag. The engine resolves that pair into [`ExperimentAction`],
//! a closed set of variants each carrying its own payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Action as it appears in remote configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExperimentAction {
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default)]
    pub properties: serde_json::Value,
}

impl RawExperimentAction {
    pub fn new(action_type: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            action_type: action_type.into(),
            properties,
        }
    }
}

/// Kind of action an experiment triggers once it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperimentActionType {
    Custom,
    Prompt,
    AddToRecommendations,
}

impl ExperimentActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Prompt => "Prompt",
            Self::AddToRecommendations => "AddToRecommendations",
        }
    }

    /// Resolve a configuration tag; unknown tags fall back to `Custom`.
    pub fn from_tag(tag: &str) -> Self {
        Self::parse(tag).unwrap_or(Self::Custom)
    }

    /// Strict parse accepting both the wire tag and kebab-case spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "custom" => Some(Self::Custom),
            "prompt" => Some(Self::Prompt),
            "addtorecommendations" => Some(Self::AddToRecommendations),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExperimentActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExperimentActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unknown action type '{s}' (expected custom, prompt or add-to-recommendations)")
        })
    }
}

/// Action attached to a processed experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties")]
pub enum ExperimentAction {
    /// Consumer-defined behavior with opaque properties
    Custom(serde_json::Value),
    /// User-facing suggestion with selectable commands
    Prompt(PromptActionProperties),
    /// Extensions to add to the recommendation list
    AddToRecommendations(AddToRecommendationsProperties),
}

impl ExperimentAction {
    /// Resolve a raw action. Properties that do not fit a known type's
    /// payload fall back to that payload's default.
    pub fn from_raw(raw: &RawExperimentAction) -> Self {
        match ExperimentActionType::from_tag(&raw.action_type) {
            ExperimentActionType::Custom => Self::Custom(raw.properties.clone()),
            ExperimentActionType::Prompt => Self::Prompt(
                serde_json::from_value(raw.properties.clone()).unwrap_or_default(),
            ),
            ExperimentActionType::AddToRecommendations => Self::AddToRecommendations(
                serde_json::from_value(raw.properties.clone()).unwrap_or_default(),
            ),
        }
    }

    pub fn action_type(&self) -> ExperimentActionType {
        match self {
            Self::Custom(_) => ExperimentActionType::Custom,
            Self::Prompt(_) => ExperimentActionType::Prompt,
            Self::AddToRecommendations(_) => ExperimentActionType::AddToRecommendations,
        }
    }

    pub fn is_prompt(&self) -> bool {
        matches!(self, Self::Prompt(_))
    }

    pub fn as_prompt(&self) -> Option<&PromptActionProperties> {
        match self {
            Self::Prompt(properties) => Some(properties),
            _ => None,
        }
    }

    pub fn curated_extensions(&self) -> Option<CuratedExtensions> {
        self.as_prompt().and_then(PromptActionProperties::curated_extensions)
    }
}

/// Payload of a prompt action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptActionProperties {
    #[serde(default)]
    pub prompt_text: PromptText,

    #[serde(default)]
    pub commands: Vec<PromptCommand>,
}

impl PromptActionProperties {
    /// Curated list declared by the prompt's commands. When several commands
    /// declare one, the last declaration wins.
    pub fn curated_extensions(&self) -> Option<CuratedExtensions> {
        self.commands.iter().rev().find_map(|command| {
            match (&command.curated_extensions_key, &command.curated_extensions_list) {
                (Some(key), Some(extensions)) => Some(CuratedExtensions {
                    key: key.clone(),
                    extensions: extensions.clone(),
                }),
                _ => None,
            }
        })
    }
}

/// Prompt text, either a single string or one entry per locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl Default for PromptText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl PromptText {
    /// Text for `locale`: exact match, then primary subtag, then `en`, then
    /// whichever entry sorts first.
    pub fn localized(&self, locale: &str) -> Option<&str> {
        let entries = match self {
            Self::Plain(text) => return Some(text.as_str()),
            Self::Localized(entries) => entries,
        };

        let wanted = locale.to_lowercase();
        let primary = wanted.split('-').next().unwrap_or_default().to_string();
        let lookup = |target: &str| {
            entries
                .iter()
                .find(|(key, _)| key.to_lowercase() == target)
                .map(|(_, text)| text.as_str())
        };

        lookup(&wanted)
            .or_else(|| lookup(&primary))
            .or_else(|| lookup("en"))
            .or_else(|| entries.values().next().map(String::as_str))
    }
}

/// A selectable command on a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCommand {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curated_extensions_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curated_extensions_list: Option<Vec<String>>,

    #[serde(default)]
    pub dont_show_again: bool,
}

/// Payload of an add-to-recommendations action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToRecommendationsProperties {
    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

/// Named list of extension ids attached to a prompt command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedExtensions {
    pub key: String,
    pub extensions: Vec<String>,
}
