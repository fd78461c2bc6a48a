use crate::classification::profile::CriteriaProfile;
use crate::domain::cycle::CycleDetectionConfig;
use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Numeric knobs for criteria and plugin verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Method complexity at which a stateless service counts as holding domain logic
    pub complexity_threshold: u32,
    /// Plugin verdicts below this confidence percentage are discarded
    pub min_plugin_confidence_pct: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            complexity_threshold: 10,
            min_plugin_confidence_pct: 50,
        }
    }
}

/// Everything an analysis run can be tuned with. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Criteria key → priority override
    pub priorities: BTreeMap<String, i32>,
    pub cycles: CycleDetectionConfig,
    pub plugin_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
    pub thresholds: Thresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            priorities: BTreeMap::new(),
            cycles: CycleDetectionConfig::default(),
            plugin_timeout_ms: 2_000,
            shutdown_grace_ms: 5_000,
            thresholds: Thresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.complexity_threshold == 0 {
            return Err(ConfigError::NonPositiveComplexityThreshold(0));
        }
        if self.thresholds.min_plugin_confidence_pct > 100 {
            return Err(ConfigError::PercentageOutOfRange {
                name: "min_plugin_confidence_pct",
                value: self.thresholds.min_plugin_confidence_pct,
            });
        }
        let limits = [
            ("cycles.max_cycles", self.cycles.max_cycles),
            ("cycles.max_edges_per_cycle", self.cycles.max_edges_per_cycle),
            ("cycles.max_edge_scans", self.cycles.max_edge_scans),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ZeroLimit(*name));
        }
        if self.plugin_timeout_ms == 0 {
            return Err(ConfigError::ZeroLimit("plugin_timeout_ms"));
        }
        // validates override keys
        self.profile().map(|_| ())
    }

    pub fn profile(&self) -> Result<CriteriaProfile, ConfigError> {
        if self.priorities.is_empty() {
            return Ok(CriteriaProfile::legacy());
        }
        CriteriaProfile::with_overrides(self.priorities.clone())
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_millis(self.plugin_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
