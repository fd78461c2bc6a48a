use crate::adapters::criteria::names;
use crate::classification::criteria::{Criteria, Evidence, EvidenceKind, MatchResult};
use crate::classification::kind::{ConfidenceLevel, PortKind};
use crate::domain::node::TypeNode;
use crate::domain::query::GraphQuery;

/// Every built-in port criteria, in registration order.
pub fn builtin() -> Vec<Box<dyn Criteria<PortKind>>> {
    vec![
        Box::new(ExplicitRepositoryCriteria),
        Box::new(MarkerPortCriteria::primary()),
        Box::new(MarkerPortCriteria::secondary()),
        Box::new(NamingCriteria::repository()),
        Box::new(NamingCriteria::gateway()),
        Box::new(NamingCriteria::event_publisher()),
        Box::new(NamingCriteria::use_case()),
        Box::new(DrivingPortCriteria),
    ]
}

/// Name fragments that mark a class as infrastructure rather than application code
const INFRASTRUCTURE_HINTS: &[&str] = &["Adapter", "Jpa", "Jdbc", "Http", "Rest", "Client"];

/// Interface annotated `@Repository`
pub struct ExplicitRepositoryCriteria;

impl Criteria<PortKind> for ExplicitRepositoryCriteria {
    fn name(&self) -> &str {
        "explicit-repository"
    }

    fn key(&self) -> &str {
        "port.explicit.repository"
    }

    fn target_kind(&self) -> PortKind {
        PortKind::Repository
    }

    fn default_priority(&self) -> i32 {
        100
    }

    fn evaluate(&self, node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
        if !node.is_interface() || !node.has_annotation("Repository") {
            return MatchResult::no_match();
        }
        MatchResult::matched(ConfidenceLevel::Explicit, "Annotated with @Repository")
            .with_evidence(Evidence::new(EvidenceKind::Annotation, "@Repository"))
    }
}

/// Interface extending, or annotated with, a primary/secondary port marker
pub struct MarkerPortCriteria {
    key: &'static str,
    name: &'static str,
    marker: &'static str,
    kind: PortKind,
}

impl MarkerPortCriteria {
    pub fn primary() -> Self {
        Self {
            key: "port.explicit.primaryPort",
            name: "explicit-primary-port",
            marker: "PrimaryPort",
            kind: PortKind::UseCase,
        }
    }

    pub fn secondary() -> Self {
        Self {
            key: "port.explicit.secondaryPort",
            name: "explicit-secondary-port",
            marker: "SecondaryPort",
            kind: PortKind::Gateway,
        }
    }

    fn extends_marker(&self, node: &TypeNode) -> bool {
        node.interfaces
            .iter()
            .chain(node.supertype.iter())
            .any(|r| r.simple_name() == self.marker)
    }
}

impl Criteria<PortKind> for MarkerPortCriteria {
    fn name(&self) -> &str {
        self.name
    }

    fn key(&self) -> &str {
        self.key
    }

    fn target_kind(&self) -> PortKind {
        self.kind
    }

    fn default_priority(&self) -> i32 {
        100
    }

    fn evaluate(&self, node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
        if !node.is_interface() {
            return MatchResult::no_match();
        }
        let (evidence_kind, how) = if node.has_annotation(self.marker) {
            (EvidenceKind::Annotation, "Annotated with")
        } else if self.extends_marker(node) {
            (EvidenceKind::Relationship, "Extends")
        } else {
            return MatchResult::no_match();
        };
        MatchResult::matched(ConfidenceLevel::Explicit, format!("{how} {}", self.marker))
            .with_evidence(Evidence::new(evidence_kind, format!("{} marker", self.marker)))
    }
}

/// Interface whose simple name ends with one of the suffixes
pub struct NamingCriteria {
    key: &'static str,
    name: &'static str,
    suffixes: &'static [&'static str],
    kind: PortKind,
    priority: i32,
    confidence: ConfidenceLevel,
}

impl NamingCriteria {
    pub fn repository() -> Self {
        Self {
            key: "port.naming.repository",
            name: "repository-naming",
            suffixes: &["Repository"],
            kind: PortKind::Repository,
            priority: 80,
            confidence: ConfidenceLevel::High,
        }
    }

    pub fn gateway() -> Self {
        Self {
            key: "port.naming.gateway",
            name: "gateway-naming",
            suffixes: &["Gateway", "Client"],
            kind: PortKind::Gateway,
            priority: 70,
            confidence: ConfidenceLevel::Medium,
        }
    }

    pub fn event_publisher() -> Self {
        Self {
            key: "port.naming.eventPublisher",
            name: "event-publisher-naming",
            suffixes: &["EventPublisher", "Publisher"],
            kind: PortKind::EventPublisher,
            priority: 70,
            confidence: ConfidenceLevel::Medium,
        }
    }

    pub fn use_case() -> Self {
        Self {
            key: "port.naming.useCase",
            name: "use-case-naming",
            suffixes: &["UseCase"],
            kind: PortKind::UseCase,
            priority: 70,
            confidence: ConfidenceLevel::Medium,
        }
    }
}

impl Criteria<PortKind> for NamingCriteria {
    fn name(&self) -> &str {
        self.name
    }

    fn key(&self) -> &str {
        self.key
    }

    fn target_kind(&self) -> PortKind {
        self.kind
    }

    fn default_priority(&self) -> i32 {
        self.priority
    }

    fn evaluate(&self, node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
        if !node.is_interface() {
            return MatchResult::no_match();
        }
        let name = node.simple_name();
        let Some(suffix) = self
            .suffixes
            .iter()
            .find(|s| name.ends_with(**s) && name.len() > s.len())
        else {
            return MatchResult::no_match();
        };
        MatchResult::matched(self.confidence, format!("Interface name ends with '{suffix}'"))
            .with_evidence(Evidence::new(EvidenceKind::Naming, format!("*{suffix}")))
    }
}

/// Interface with operations, implemented by an application-side class
pub struct DrivingPortCriteria;

impl Criteria<PortKind> for DrivingPortCriteria {
    fn name(&self) -> &str {
        "driving-port"
    }

    fn key(&self) -> &str {
        "port.semantic.drivingPort"
    }

    fn target_kind(&self) -> PortKind {
        PortKind::UseCase
    }

    fn default_priority(&self) -> i32 {
        60
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if !node.is_interface() || query.methods_of(&node.id).is_empty() {
            return MatchResult::no_match();
        }
        let implementors: Vec<&TypeNode> = query
            .implementors_of(&node.id)
            .into_iter()
            .filter(|t| !t.is_interface())
            .filter(|t| {
                let name = t.simple_name();
                !INFRASTRUCTURE_HINTS.iter().any(|h| name.contains(h))
            })
            .collect();
        if implementors.is_empty() {
            return MatchResult::no_match();
        }
        MatchResult::matched(
            ConfidenceLevel::Medium,
            format!("Implemented by application code: {}", names(&implementors)),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Relationship, "Application-side implementors")
                .with_related(implementors.iter().map(|t| t.id.clone())),
        )
    }
}
