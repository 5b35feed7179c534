//! Settings for the population-plan builder.
//!
//! Settings are plain serde-deserializable data with defaults for every
//! field, so an empty JSON object is a valid configuration. Regex patterns
//! are validated separately via [`Settings::compile`], which produces the
//! form the node engine consumes.

use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file")]
    Io(#[from] io::Error),

    #[error("failed to parse settings")]
    Parse(#[from] serde_json::Error),

    #[error("invalid ignore pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How object slots are assigned values downstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentType {
    /// Populate via fields only.
    #[default]
    Field,
    /// Populate via fields and matching setter methods.
    Method,
}

/// Naming convention used to pair fields with setters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetterStyle {
    /// `setFoo(value)`
    #[default]
    Set,
    /// `withFoo(value)`
    With,
    /// `foo(value)` — no prefix. Unmatched setters cannot be collected in
    /// this style since a bare single-argument method is indistinguishable
    /// from a non-setter.
    Property,
}

impl SetterStyle {
    /// The method-name prefix, or `None` for the property style.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            SetterStyle::Set => Some("set"),
            SetterStyle::With => Some("with"),
            SetterStyle::Property => None,
        }
    }
}

/// What to do with collected setters that matched no field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnSetterUnmatched {
    /// Drop them.
    #[default]
    Ignore,
    /// Emit a setter-only child node for each.
    Invoke,
}

/// Modifier filters for setter collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodModifier {
    Static,
    Private,
    PackagePrivate,
    Protected,
}

fn default_max_depth() -> usize {
    8
}

fn default_setter_exclude_modifiers() -> Vec<MethodModifier> {
    vec![MethodModifier::Static]
}

fn default_excluded_packages() -> Vec<String> {
    vec!["java.".to_string(), "javax.".to_string()]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Hard cutoff on tree depth; subtrees past it are pruned silently.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub assignment: AssignmentType,

    #[serde(default)]
    pub setter_style: SetterStyle,

    #[serde(default)]
    pub on_setter_unmatched: OnSetterUnmatched,

    /// Setters carrying any of these modifiers are never collected.
    #[serde(default = "default_setter_exclude_modifiers")]
    pub setter_exclude_modifiers: Vec<MethodModifier>,

    /// Regexes matched against member names; a match prunes the member's
    /// subtree before a node is created for it.
    #[serde(default)]
    pub ignore_field_patterns: Vec<String>,

    /// Static nominal-name to subtype-name substitutions.
    #[serde(default)]
    pub subtype_map: IndexMap<String, String>,

    /// Classes in these package prefixes are not introspected for members.
    #[serde(default = "default_excluded_packages")]
    pub excluded_packages: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            assignment: AssignmentType::default(),
            setter_style: SetterStyle::default(),
            on_setter_unmatched: OnSetterUnmatched::default(),
            setter_exclude_modifiers: default_setter_exclude_modifiers(),
            ignore_field_patterns: Vec::new(),
            subtype_map: IndexMap::new(),
            excluded_packages: default_excluded_packages(),
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading settings");
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate and compile the pattern fields into their matching form.
    pub fn compile(self) -> Result<CompiledSettings, ConfigError> {
        let mut ignore_patterns = Vec::with_capacity(self.ignore_field_patterns.len());
        for pattern in &self.ignore_field_patterns {
            let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            ignore_patterns.push(regex);
        }
        Ok(CompiledSettings {
            ignore_patterns,
            settings: self,
        })
    }
}

/// [`Settings`] with its regexes compiled; what the node engine consumes.
#[derive(Clone, Debug)]
pub struct CompiledSettings {
    settings: Settings,
    ignore_patterns: Vec<Regex>,
}

impl CompiledSettings {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether a member name is matched by any ignore pattern.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.ignore_patterns.iter().any(|re| re.is_match(name))
    }

    /// Whether a qualified class name falls in an excluded package.
    pub fn is_excluded_package(&self, class_name: &str) -> bool {
        self.settings
            .excluded_packages
            .iter()
            .any(|prefix| class_name.starts_with(prefix.as_str()))
    }
}

impl Default for CompiledSettings {
    fn default() -> Self {
        Settings::default()
            .compile()
            .expect("default settings compile")
    }
}

/// Install a global env-filtered tracing subscriber.
///
/// Intended for binaries and ad-hoc diagnostics; libraries and tests that
/// need output should install their own subscriber. Calling this twice is a
/// no-op (the second install fails silently).
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let settings = Settings::from_json_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_depth, 8);
        assert_eq!(settings.assignment, AssignmentType::Field);
        assert_eq!(settings.on_setter_unmatched, OnSetterUnmatched::Ignore);
        assert_eq!(
            settings.setter_exclude_modifiers,
            vec![MethodModifier::Static]
        );
    }

    #[test]
    fn invalid_ignore_pattern_is_rejected() {
        let settings = Settings {
            ignore_field_patterns: vec!["[unclosed".to_string()],
            ..Settings::default()
        };
        let err = settings.compile().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn compiled_name_and_package_matching() {
        let settings = Settings {
            ignore_field_patterns: vec!["^internal.*".to_string(), ".*Cache$".to_string()],
            ..Settings::default()
        };
        let compiled = settings.compile().unwrap();

        assert!(compiled.is_ignored_name("internalState"));
        assert!(compiled.is_ignored_name("resultCache"));
        assert!(!compiled.is_ignored_name("name"));

        assert!(compiled.is_excluded_package("java.util.ArrayList"));
        assert!(!compiled.is_excluded_package("com.example.Person"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Settings::from_json_str(r#"{"max_dept": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
