use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Priority overrides keyed by stable criteria key.
///
/// A criteria without an override keeps its built-in priority. Zero and
/// negative values are legal and simply rank the criteria lower.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaProfile {
    overrides: BTreeMap<String, i32>,
}

impl CriteriaProfile {
    /// No overrides: every criteria uses its default priority.
    pub fn legacy() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: BTreeMap<String, i32>) -> Result<Self, ConfigError> {
        if let Some(bad) = overrides
            .keys()
            .find(|k| k.trim().is_empty() || k.chars().any(char::is_whitespace))
        {
            return Err(ConfigError::InvalidPriorityKey(bad.clone()));
        }
        Ok(Self { overrides })
    }

    pub fn priority_for(&self, key: &str) -> Option<i32> {
        self.overrides.get(key).copied()
    }

    pub fn resolve_priority(&self, key: &str, default_priority: i32) -> i32 {
        self.priority_for(key).unwrap_or(default_priority)
    }

    pub fn is_legacy(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn overrides(&self) -> &BTreeMap<String, i32> {
        &self.overrides
    }
}
