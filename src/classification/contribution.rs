use crate::classification::criteria::Evidence;
use crate::classification::kind::{ClassificationKind, ConfidenceLevel};
use serde::Serialize;

/// One criteria's vote for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution<K: ClassificationKind> {
    pub kind: K,
    pub criteria_name: String,
    pub criteria_key: String,
    pub priority: i32,
    pub confidence: ConfidenceLevel,
    pub justification: String,
    pub evidence: Vec<Evidence>,
    /// Position of the criteria in the engine, used as the last tie-breaker
    #[serde(skip)]
    pub registration: usize,
}

/// Disagreement between the winning kind and an incompatible competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict<K: ClassificationKind> {
    pub competing_kind: K,
    pub competing_criteria: String,
    pub competing_confidence: ConfidenceLevel,
    pub competing_priority: i32,
    pub rationale: String,
}

impl<K: ClassificationKind> Conflict<K> {
    pub fn against(competitor: &Contribution<K>, winner: &Contribution<K>) -> Self {
        Self {
            competing_kind: competitor.kind,
            competing_criteria: competitor.criteria_name.clone(),
            competing_confidence: competitor.confidence,
            competing_priority: competitor.priority,
            rationale: format!(
                "Also matched {} with {}; {} wins via '{}' (priority {} vs {})",
                competitor.kind,
                competitor.justification,
                winner.kind,
                winner.criteria_name,
                winner.priority,
                competitor.priority
            ),
        }
    }
}
