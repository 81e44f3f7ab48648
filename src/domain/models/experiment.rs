//! Experiment domain model.
//!
//! Experiments arrive from remote configuration in their raw form
//! ([`RawExperiment`]) and are turned into processed [`Experiment`]s once the
//! evaluation engine has merged them with persisted state. The processed form
//! carries the decision ([`ExperimentState`]) that consumers gate behavior on.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::action::{CuratedExtensions, ExperimentAction, RawExperimentAction};
use crate::domain::errors::{DomainError, DomainResult};

/// Decision state of an experiment.
///
/// `Evaluating` is the only non-terminal state. `Run` and `NoRun` are decided
/// outcomes; `Complete` is set by consumers once they are done with a running
/// experiment and is never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentState {
    /// Decision pending further observed user activity
    Evaluating,
    /// A condition failed or the probability roll missed
    NoRun,
    /// All conditions satisfied
    Run,
    /// The consumer signaled it is done with the experiment
    Complete,
}

impl Default for ExperimentState {
    fn default() -> Self {
        Self::Evaluating
    }
}

impl ExperimentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evaluating => "evaluating",
            Self::NoRun => "norun",
            Self::Run => "run",
            Self::Complete => "complete",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "evaluating" => Some(Self::Evaluating),
            "norun" | "no_run" | "no-run" => Some(Self::NoRun),
            "run" => Some(Self::Run),
            "complete" | "completed" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Numeric code used by older persisted records.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Evaluating),
            1 => Some(Self::NoRun),
            2 => Some(Self::Run),
            3 => Some(Self::Complete),
            _ => None,
        }
    }

    /// Read a state from either its name or its legacy numeric code.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::from_str(s),
            serde_json::Value::Number(n) => n.as_u64().and_then(Self::from_code),
            _ => None,
        }
    }

    /// True once a Run/NoRun decision (or completion) has been reached.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Evaluating)
    }

    /// Check if this state can move to `next`.
    ///
    /// Re-entering the same decided state is allowed so that persisting an
    /// unchanged decision is not an error.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Evaluating, _)
                | (Self::NoRun, Self::NoRun | Self::Complete)
                | (Self::Run, Self::Run | Self::Complete)
                | (Self::Complete, Self::Complete)
        )
    }
}

impl std::fmt::Display for ExperimentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Experiment as delivered by remote configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExperiment {
    /// Globally unique identifier
    pub id: String,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ExperimentCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RawExperimentAction>,
}

impl RawExperiment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            condition: None,
            action: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_condition(mut self, condition: ExperimentCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_action(mut self, action: RawExperimentAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Conditions gating an experiment. Every field is optional and absent
/// fields never cause a `NoRun`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentCondition {
    /// Restrict to pre-release quality channels
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub insiders_only: Option<bool>,

    /// Locale the UI must be running in
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub display_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_extensions: Option<ExtensionsCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_edits: Option<FileEditsCondition>,

    /// Sampling probability in [0, 1]; absent means always
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_probability: Option<f64>,

    /// Skip environment gates when resuming a pending evaluation
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub evaluate_only_once: Option<bool>,
}

impl ExperimentCondition {
    /// Configured sampling probability, defaulting to 1.
    pub fn probability(&self) -> f64 {
        self.user_probability.unwrap_or(1.0)
    }

    pub fn evaluates_only_once(&self) -> bool {
        self.evaluate_only_once.unwrap_or(false)
    }

    /// File-edit condition together with its threshold, if both are present.
    pub fn edit_threshold(&self) -> Option<(&FileEditsCondition, u32)> {
        self.file_edits
            .as_ref()
            .and_then(|edits| edits.min_edit_count.map(|min| (edits, min)))
    }
}

/// Installed-extension gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionsCondition {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
}

/// File-edit gate resolved asynchronously by the file-edit tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEditsCondition {
    /// Glob matched against the saved file's path
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub file_path_pattern: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub workspace_includes: Option<Vec<String>>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub workspace_excludes: Option<Vec<String>>,

    /// Number of qualifying saves (one per calendar day) required
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub min_edit_count: Option<u32>,
}

impl FileEditsCondition {
    /// True when either workspace tag list is non-empty.
    pub fn has_workspace_filters(&self) -> bool {
        self.workspace_includes.as_ref().is_some_and(|tags| !tags.is_empty())
            || self.workspace_excludes.as_ref().is_some_and(|tags| !tags.is_empty())
    }
}

/// Deserialize an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Experiment after evaluation, as exposed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub enabled: bool,
    pub state: ExperimentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ExperimentAction>,
}

impl Experiment {
    /// Build the processed form; state seeds to `Evaluating` when enabled.
    pub fn from_raw(raw: &RawExperiment) -> Self {
        Self {
            id: raw.id.clone(),
            enabled: raw.enabled,
            state: if raw.enabled {
                ExperimentState::Evaluating
            } else {
                ExperimentState::NoRun
            },
            action: raw.action.as_ref().map(ExperimentAction::from_raw),
        }
    }

    /// Case-insensitive id comparison.
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }

    /// Enabled and decided to run.
    pub fn is_running(&self) -> bool {
        self.enabled && self.state == ExperimentState::Run
    }

    pub fn has_prompt_action(&self) -> bool {
        self.action.as_ref().is_some_and(ExperimentAction::is_prompt)
    }

    /// Curated extension list declared by a prompt command, if any.
    pub fn curated_extensions(&self) -> Option<CuratedExtensions> {
        self.action.as_ref().and_then(ExperimentAction::curated_extensions)
    }

    /// Move to `next`, rejecting transitions that would reverse a decision.
    pub fn transition_to(&mut self, next: ExperimentState) -> DomainResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                id: self.id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_round_trips_through_names_and_codes() {
        assert_eq!(ExperimentState::from_str("NoRun"), Some(ExperimentState::NoRun));
        assert_eq!(ExperimentState::from_str("completed"), Some(ExperimentState::Complete));
        assert_eq!(ExperimentState::from_json(&json!(2)), Some(ExperimentState::Run));
        assert_eq!(
            ExperimentState::from_json(&json!("evaluating")),
            Some(ExperimentState::Evaluating)
        );
        assert_eq!(ExperimentState::from_json(&json!(9)), None);
        assert_eq!(ExperimentState::from_json(&json!(true)), None);
    }

    #[test]
    fn test_complete_is_never_left() {
        for next in [
            ExperimentState::Evaluating,
            ExperimentState::NoRun,
            ExperimentState::Run,
        ] {
            assert!(!ExperimentState::Complete.can_transition_to(next));
        }
        assert!(ExperimentState::Complete.can_transition_to(ExperimentState::Complete));
    }

    #[test]
    fn test_decided_states_do_not_swap() {
        assert!(!ExperimentState::Run.can_transition_to(ExperimentState::NoRun));
        assert!(!ExperimentState::NoRun.can_transition_to(ExperimentState::Run));
        assert!(!ExperimentState::Run.can_transition_to(ExperimentState::Evaluating));
        assert!(ExperimentState::Evaluating.can_transition_to(ExperimentState::Run));
    }

    #[test]
    fn test_transition_to_reports_rejected_move() {
        let mut experiment = Experiment::from_raw(&RawExperiment::new("exp"));
        experiment.transition_to(ExperimentState::Run).unwrap();

        let err = experiment.transition_to(ExperimentState::NoRun).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        assert_eq!(experiment.state, ExperimentState::Run);
    }

    #[test]
    fn test_from_raw_seeds_state_from_enabled_flag() {
        let enabled = Experiment::from_raw(&RawExperiment::new("a"));
        let disabled = Experiment::from_raw(&RawExperiment::new("b").disabled());

        assert_eq!(enabled.state, ExperimentState::Evaluating);
        assert_eq!(disabled.state, ExperimentState::NoRun);
    }

    #[test]
    fn test_condition_parses_camel_case_payload() {
        let raw: RawExperiment = serde_json::from_value(json!({
            "id": "exp.edits",
            "enabled": true,
            "condition": {
                "insidersOnly": true,
                "displayLanguage": "en-US",
                "installedExtensions": { "includes": ["a.b"] },
                "fileEdits": {
                    "filePathPattern": "**/*.ts",
                    "workspaceIncludes": ["workspace.typescript"],
                    "minEditCount": 2
                },
                "userProbability": 0.5,
                "evaluateOnlyOnce": true
            }
        }))
        .unwrap();

        let condition = raw.condition.unwrap();
        assert_eq!(condition.insiders_only, Some(true));
        assert_eq!(condition.display_language.as_deref(), Some("en-US"));
        assert!((condition.probability() - 0.5).abs() < f64::EPSILON);
        assert!(condition.evaluates_only_once());
        let (edits, min) = condition.edit_threshold().unwrap();
        assert_eq!(min, 2);
        assert!(edits.has_workspace_filters());
    }

    #[test]
    fn test_malformed_condition_fields_are_absent() {
        let raw: RawExperiment = serde_json::from_value(json!({
            "id": "exp.bad",
            "enabled": true,
            "condition": {
                "userProbability": "often",
                "fileEdits": { "minEditCount": "two" }
            }
        }))
        .unwrap();

        let condition = raw.condition.unwrap();
        assert!((condition.probability() - 1.0).abs() < f64::EPSILON);
        assert!(condition.edit_threshold().is_none());
    }
}
