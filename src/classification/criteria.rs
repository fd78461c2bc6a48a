use crate::classification::kind::{ClassificationKind, ConfidenceLevel};
use crate::domain::id::NodeId;
use crate::domain::node::TypeNode;
use crate::domain::query::GraphQuery;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// What kind of fact an [`Evidence`] points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceKind {
    Annotation,
    Naming,
    Structure,
    Relationship,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_nodes: Vec<NodeId>,
}

impl Evidence {
    pub fn new(kind: EvidenceKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            related_nodes: Vec::new(),
        }
    }

    pub fn with_related(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.related_nodes.extend(nodes);
        self
    }
}

/// Outcome of one criteria evaluation.
///
/// Confidence and justification are present exactly when the result matched;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    confidence: Option<ConfidenceLevel>,
    justification: Option<String>,
    evidence: Vec<Evidence>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            confidence: None,
            justification: None,
            evidence: Vec::new(),
        }
    }

    pub fn matched(confidence: ConfidenceLevel, justification: impl Into<String>) -> Self {
        Self {
            confidence: Some(confidence),
            justification: Some(justification.into()),
            evidence: Vec::new(),
        }
    }

    /// Evidence is dropped on a non-match.
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        if self.is_match() {
            self.evidence.push(evidence);
        }
        self
    }

    pub fn is_match(&self) -> bool {
        self.confidence.is_some()
    }

    pub fn confidence(&self) -> Option<ConfidenceLevel> {
        self.confidence
    }

    pub fn justification(&self) -> Option<&str> {
        self.justification.as_deref()
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    pub(crate) fn into_parts(self) -> Option<(ConfidenceLevel, String, Vec<Evidence>)> {
        match (self.confidence, self.justification) {
            (Some(c), Some(j)) => Some((c, j, self.evidence)),
            _ => None,
        }
    }
}

/// An independent, stateless pattern matcher voting for one kind.
pub trait Criteria<K: ClassificationKind>: Send + Sync {
    /// Human-readable name, reported in contributions and conflicts
    fn name(&self) -> &str;

    /// Stable identifier used by priority override profiles
    fn key(&self) -> &str {
        self.name()
    }

    fn target_kind(&self) -> K;

    /// Built-in priority, used unless a profile overrides it
    fn default_priority(&self) -> i32;

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult;
}

fn stable_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]+(\.[A-Za-z0-9]+)+$").expect("stable key regex"))
}

/// Dotted lowercase-rooted key such as `domain.explicit.aggregateRoot`.
pub fn is_stable_key(key: &str) -> bool {
    stable_key_pattern().is_match(key)
}
