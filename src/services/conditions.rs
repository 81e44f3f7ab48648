//! Condition evaluators.
//!
//! Each function is a pure predicate over a single condition kind. A `false`
//! result forces the experiment to `NoRun`; absent or empty condition data
//! always passes.

use glob::{MatchOptions, Pattern};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::models::{ExperimentCondition, ExtensionsCondition, RuntimeEnvironment};
use crate::domain::ports::{InstalledExtension, RandomSource};

/// Quality gate: insiders-only experiments never run on the stable channel.
pub fn quality_gate(condition: &ExperimentCondition, environment: &RuntimeEnvironment) -> bool {
    !(environment.quality.is_stable() && condition.insiders_only == Some(true))
}

/// Language gate.
///
/// Compares case-insensitively; on mismatch compares the primary subtags
/// (text before the first `-`) instead.
pub fn language_gate(configured: Option<&str>, active: &str) -> bool {
    let Some(configured) = configured else {
        return true;
    };

    let configured = configured.to_lowercase();
    let active = active.to_lowercase();
    configured == active || primary_subtag(&configured) == primary_subtag(&active)
}

/// Locale text before the first region/script separator.
pub fn primary_subtag(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

/// Extension gate: at least one include installed and no exclude installed.
pub fn extension_gate(
    condition: Option<&ExtensionsCondition>,
    installed: &[InstalledExtension],
) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    let is_installed = |wanted: &String| {
        installed
            .iter()
            .any(|extension| extension.id.eq_ignore_ascii_case(wanted))
    };

    let includes_pass = match condition.includes.as_deref() {
        Some(includes) if !includes.is_empty() => includes.iter().any(is_installed),
        _ => true,
    };
    let excludes_pass = match condition.excludes.as_deref() {
        Some(excludes) if !excludes.is_empty() => !excludes.iter().any(is_installed),
        _ => true,
    };

    includes_pass && excludes_pass
}

/// True when the extension gate needs the installed-extension list at all.
pub fn needs_installed_extensions(condition: Option<&ExtensionsCondition>) -> bool {
    condition.is_some_and(|extensions| {
        extensions.includes.as_ref().is_some_and(|list| !list.is_empty())
            || extensions.excludes.as_ref().is_some_and(|list| !list.is_empty())
    })
}

/// Probability gate: one roll, passing iff it lands strictly below `probability`.
pub fn probability_gate(probability: f64, random: &dyn RandomSource) -> bool {
    random.next_f64() < probability
}

/// File path filter. An invalid pattern matches nothing.
pub fn path_filter(pattern: Option<&str>, path: &Path) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    match Pattern::new(pattern) {
        Ok(compiled) => compiled.matches_path_with(path, options),
        Err(err) => {
            tracing::debug!(pattern, error = %err, "invalid file path pattern");
            false
        }
    }
}

/// Workspace tag filter: some include tag present and no exclude tag present.
pub fn workspace_filter(
    includes: Option<&[String]>,
    excludes: Option<&[String]>,
    tags: &HashMap<String, bool>,
) -> bool {
    let present = |tag: &String| tags.get(tag).copied().unwrap_or(false);

    let includes_pass = match includes {
        Some(includes) if !includes.is_empty() => includes.iter().any(present),
        _ => true,
    };
    let excludes_pass = match excludes {
        Some(excludes) if !excludes.is_empty() => !excludes.iter().any(present),
        _ => true,
    };

    includes_pass && excludes_pass
}
