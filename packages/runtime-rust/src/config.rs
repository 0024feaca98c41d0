//! Debug configuration for operation executors.

use serde::{Deserialize, Serialize};

/// Controls the structured traces an executor emits around backend calls.
///
/// Configuration files may also give a bare boolean; see [`DebugSetting`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConfig {
    /// Also trace the backend's raw result after execution.
    #[serde(default)]
    pub include_return_values: bool,
    /// Expand nested structures fully instead of truncating them.
    #[serde(default)]
    pub print_deep_objects: bool,
    /// Restrict tracing to these module operation names. `None` traces all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_module_operations: Option<Vec<String>>,
}

impl DebugConfig {
    /// Debug enabled with default options.
    #[must_use]
    pub fn enabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn include_return_values(mut self) -> Self {
        self.include_return_values = true;
        self
    }

    #[must_use]
    pub fn print_deep_objects(mut self) -> Self {
        self.print_deep_objects = true;
        self
    }

    #[must_use]
    pub fn only<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_module_operations = Some(operations.into_iter().map(Into::into).collect());
        self
    }

    /// Whether traces are emitted for the module operation `name`.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.only_module_operations
            .as_ref()
            .is_none_or(|only| only.iter().any(|op| op == name))
    }

    /// Normalizes an optional flag-or-config setting.
    #[must_use]
    pub fn from_setting(setting: DebugSetting) -> Option<Self> {
        match setting {
            DebugSetting::Flag(false) => None,
            DebugSetting::Flag(true) => Some(Self::enabled()),
            DebugSetting::Config(config) => Some(config),
        }
    }
}

/// Debug setting as written in configuration: a flag or a full config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DebugSetting {
    Flag(bool),
    Config(DebugConfig),
}
