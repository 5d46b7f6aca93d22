//! Feature-flag lookup handle.
//!
//! Flags are loaded once (from the API or a config file) and passed to the
//! code that needs them. Unknown flags read as disabled.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    enabled: BTreeSet<String>,
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the names of enabled flags.
    pub fn from_enabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a JSON object of `{"flag-name": bool}`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| CoreError::Validation("feature flags must be a JSON object".to_string()))?;

        let mut enabled = BTreeSet::new();
        for (name, state) in object {
            match state.as_bool() {
                Some(true) => {
                    enabled.insert(name.clone());
                }
                Some(false) => {}
                None => {
                    return Err(CoreError::Validation(format!(
                        "feature flag '{name}' must be a boolean"
                    )))
                }
            }
        }
        Ok(Self { enabled })
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Enabled flag names in sorted order.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }
}
