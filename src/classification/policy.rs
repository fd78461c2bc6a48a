use crate::classification::contribution::{Conflict, Contribution};
use crate::classification::kind::{ClassificationKind, DomainKind, PortKind};
use serde::Serialize;
use std::cmp::Ordering;

// -----------------------------------------------------------------------------
// Compatibility
// -----------------------------------------------------------------------------

/// Declares which pairs of distinct kinds may coexist on one node without
/// being reported as a conflict. A kind is always compatible with itself,
/// whatever the policy says.
pub trait CompatibilityPolicy<K: ClassificationKind>: Send + Sync {
    fn are_compatible(&self, a: K, b: K) -> bool;
}

impl<K, F> CompatibilityPolicy<K> for F
where
    K: ClassificationKind,
    F: Fn(K, K) -> bool + Send + Sync,
{
    fn are_compatible(&self, a: K, b: K) -> bool {
        self(a, b)
    }
}

/// Only identical kinds are compatible
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneCompatible;

impl<K: ClassificationKind> CompatibilityPolicy<K> for NoneCompatible {
    fn are_compatible(&self, a: K, b: K) -> bool {
        a == b
    }
}

/// Aggregate root is a specialization of entity; every other pair conflicts.
pub fn domain_default() -> impl CompatibilityPolicy<DomainKind> + Clone {
    |a: DomainKind, b: DomainKind| {
        a == b
            || matches!(
                (a, b),
                (DomainKind::AggregateRoot, DomainKind::Entity)
                    | (DomainKind::Entity, DomainKind::AggregateRoot)
            )
    }
}

/// No two distinct port kinds can coexist.
pub fn port_default() -> NoneCompatible {
    NoneCompatible
}

// -----------------------------------------------------------------------------
// Decision
// -----------------------------------------------------------------------------

/// The engine's verdict for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision<K: ClassificationKind> {
    pub winner: Option<Contribution<K>>,
    pub conflicts: Vec<Conflict<K>>,
}

impl<K: ClassificationKind> Decision<K> {
    /// No contribution at all: the node is unclassified.
    pub fn empty() -> Self {
        Self {
            winner: None,
            conflicts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.winner.is_none()
    }

    pub fn has_winner(&self) -> bool {
        self.winner.is_some()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn kind(&self) -> Option<K> {
        self.winner.as_ref().map(|w| w.kind)
    }

    /// An incompatible competitor carried the same priority as the winner.
    /// The winner still stands.
    pub fn is_ambiguous(&self) -> bool {
        match &self.winner {
            Some(w) => self.conflicts.iter().any(|c| c.competing_priority == w.priority),
            None => false,
        }
    }
}

/// Turns a contribution list into a [`Decision`].
pub trait DecisionPolicy<K: ClassificationKind>: Send + Sync {
    fn decide(
        &self,
        contributions: &[Contribution<K>],
        compatibility: &dyn CompatibilityPolicy<K>,
    ) -> Decision<K>;
}

/// Highest priority wins; ties go to higher confidence, then to the criteria
/// registered first. Every contribution of a different, incompatible kind
/// becomes a conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecisionPolicy;

impl DefaultDecisionPolicy {
    fn rank<K: ClassificationKind>(a: &Contribution<K>, b: &Contribution<K>) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.confidence.cmp(&a.confidence))
            .then_with(|| a.registration.cmp(&b.registration))
    }
}

impl<K: ClassificationKind> DecisionPolicy<K> for DefaultDecisionPolicy {
    fn decide(
        &self,
        contributions: &[Contribution<K>],
        compatibility: &dyn CompatibilityPolicy<K>,
    ) -> Decision<K> {
        let mut ranked: Vec<&Contribution<K>> = contributions.iter().collect();
        ranked.sort_by(|a, b| Self::rank(a, b));

        let Some((&winner, rest)) = ranked.split_first() else {
            return Decision::empty();
        };

        let conflicts = rest
            .iter()
            .filter(|c| c.kind != winner.kind && !compatibility.are_compatible(winner.kind, c.kind))
            .map(|c| Conflict::against(c, winner))
            .collect();

        Decision {
            winner: Some(winner.clone()),
            conflicts,
        }
    }
}
