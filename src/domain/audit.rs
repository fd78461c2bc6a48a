//! Dependency-cycle audit over a plain name → dependencies map.
//!
//! The whole-graph data an audit needs is handed over explicitly through
//! [`AuditContext`]; nothing is kept in ambient state between calls.

use crate::domain::cycle::{CycleDetectionConfig, find_dependency_cycles};
use crate::domain::query::GraphQuery;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Whole-graph data shared with single-unit audits
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl AuditContext {
    pub fn new(dependencies: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { dependencies }
    }

    /// Type-level dependencies of a frozen graph.
    pub fn from_query(query: GraphQuery<'_>) -> Self {
        Self::new(query.type_dependencies())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleViolation {
    pub unit: String,
    /// Participants of the cycle, in discovery order
    pub cycle: Vec<String>,
    pub message: String,
}

/// Reports the dependency cycles a unit takes part in.
#[derive(Debug, Clone, Default)]
pub struct DependencyCycleAudit {
    config: CycleDetectionConfig,
}

impl DependencyCycleAudit {
    pub fn new(config: CycleDetectionConfig) -> Self {
        Self { config }
    }

    /// One violation per cycle containing `unit`. Missing or empty context
    /// yields no violations.
    pub fn check(&self, unit: &str, context: Option<&AuditContext>) -> Vec<CycleViolation> {
        let Some(context) = context else {
            tracing::debug!(unit, "No audit context, skipping dependency cycle audit");
            return Vec::new();
        };
        if context.dependencies.is_empty() {
            return Vec::new();
        }

        find_dependency_cycles(&context.dependencies, &self.config)
            .into_iter()
            .filter(|cycle| cycle.contains(&unit.to_string()))
            .map(|cycle| {
                let mut path: Vec<&str> = cycle.edges.iter().map(|(from, _)| from.as_str()).collect();
                if let Some(first) = path.first().copied() {
                    path.push(first);
                }
                CycleViolation {
                    unit: unit.to_string(),
                    message: format!("Dependency cycle detected: {}", path.join(" -> ")),
                    cycle: cycle.nodes,
                }
            })
            .collect()
    }
}
