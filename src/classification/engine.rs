use crate::classification::contribution::Contribution;
use crate::classification::criteria::Criteria;
use crate::classification::kind::ClassificationKind;
use crate::classification::policy::{
    CompatibilityPolicy, Decision, DecisionPolicy, DefaultDecisionPolicy,
};
use crate::classification::profile::CriteriaProfile;
use crate::domain::id::NodeId;
use crate::domain::node::TypeNode;
use crate::domain::query::GraphQuery;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Evaluates registered criteria and resolves their votes into a [`Decision`].
///
/// The engine holds no per-node state; `classify` is a pure function of the
/// node and the frozen graph and may run on many threads at once.
pub struct CriteriaEngine<K: ClassificationKind> {
    criteria: Vec<Box<dyn Criteria<K>>>,
    profile: CriteriaProfile,
    decision_policy: Box<dyn DecisionPolicy<K>>,
    compatibility: Box<dyn CompatibilityPolicy<K>>,
}

impl<K: ClassificationKind> CriteriaEngine<K> {
    pub fn new(compatibility: impl CompatibilityPolicy<K> + 'static) -> Self {
        Self {
            criteria: Vec::new(),
            profile: CriteriaProfile::legacy(),
            decision_policy: Box::new(DefaultDecisionPolicy),
            compatibility: Box::new(compatibility),
        }
    }

    /// Registration order is the final tie-breaker between equal votes.
    pub fn register(&mut self, criteria: Box<dyn Criteria<K>>) {
        self.criteria.push(criteria);
    }

    pub fn with_criteria(mut self, criteria: impl Criteria<K> + 'static) -> Self {
        self.register(Box::new(criteria));
        self
    }

    pub fn with_profile(mut self, profile: CriteriaProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_decision_policy(mut self, policy: impl DecisionPolicy<K> + 'static) -> Self {
        self.decision_policy = Box::new(policy);
        self
    }

    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
    }

    /// `(key, effective priority)` of every registered criteria, in registration order.
    pub fn effective_priorities(&self) -> Vec<(String, i32)> {
        self.criteria
            .iter()
            .map(|c| {
                let key = c.key().to_string();
                let priority = self.profile.resolve_priority(&key, c.default_priority());
                (key, priority)
            })
            .collect()
    }

    /// Every matching criteria's vote, in registration order.
    pub fn contributions(&self, node: &TypeNode, query: &GraphQuery<'_>) -> Vec<Contribution<K>> {
        self.criteria
            .iter()
            .enumerate()
            .filter_map(|(registration, criteria)| {
                let (confidence, justification, evidence) =
                    criteria.evaluate(node, query).into_parts()?;
                Some(Contribution {
                    kind: criteria.target_kind(),
                    criteria_name: criteria.name().to_string(),
                    criteria_key: criteria.key().to_string(),
                    priority: self
                        .profile
                        .resolve_priority(criteria.key(), criteria.default_priority()),
                    confidence,
                    justification,
                    evidence,
                    registration,
                })
            })
            .collect()
    }

    pub fn classify(&self, node: &TypeNode, query: &GraphQuery<'_>) -> Decision<K> {
        let contributions = self.contributions(node, query);
        if contributions.is_empty() {
            return Decision::empty();
        }
        let decision = self
            .decision_policy
            .decide(&contributions, self.compatibility.as_ref());
        debug!(
            node = %node.id,
            kind = ?decision.kind(),
            contributions = contributions.len(),
            conflicts = decision.conflicts.len(),
            "Classified node"
        );
        decision
    }

    /// Classifies every type of the graph in parallel.
    pub fn classify_all(&self, query: &GraphQuery<'_>) -> BTreeMap<NodeId, Decision<K>> {
        let types: Vec<&TypeNode> = query.types().collect();
        let decisions: BTreeMap<NodeId, Decision<K>> = types
            .par_iter()
            .map(|t| (t.id.clone(), self.classify(t, query)))
            .collect();
        info!(
            types = decisions.len(),
            classified = decisions.values().filter(|d| d.has_winner()).count(),
            conflicted = decisions.values().filter(|d| d.has_conflicts()).count(),
            "Classification pass finished"
        );
        decisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::criteria::MatchResult;
    use crate::classification::kind::{ConfidenceLevel, DomainKind};
    use crate::classification::policy::{NoneCompatible, domain_default};
    use crate::domain::builder::GraphBuilder;
    use crate::domain::node::TypeForm;

    struct Always {
        name: &'static str,
        kind: DomainKind,
        priority: i32,
        confidence: ConfidenceLevel,
    }

    impl Criteria<DomainKind> for Always {
        fn name(&self) -> &str {
            self.name
        }

        fn target_kind(&self) -> DomainKind {
            self.kind
        }

        fn default_priority(&self) -> i32 {
            self.priority
        }

        fn evaluate(&self, _node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
            MatchResult::matched(self.confidence, format!("{} always matches", self.name))
        }
    }

    struct Never;

    impl Criteria<DomainKind> for Never {
        fn name(&self) -> &str {
            "never"
        }

        fn target_kind(&self) -> DomainKind {
            DomainKind::Entity
        }

        fn default_priority(&self) -> i32 {
            100
        }

        fn evaluate(&self, _node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
            MatchResult::no_match()
        }
    }

    fn always(name: &'static str, kind: DomainKind, priority: i32) -> Always {
        Always {
            name,
            kind,
            priority,
            confidence: ConfidenceLevel::High,
        }
    }

    fn one_type_graph() -> crate::domain::graph::FactGraph {
        let mut b = GraphBuilder::new();
        b.add_node(TypeNode::new("x.Order", TypeForm::Class).unwrap()).unwrap();
        b.freeze()
    }

    #[test]
    fn test_no_match_yields_empty_decision() {
        let graph = one_type_graph();
        let q = GraphQuery::new(&graph);
        let engine = CriteriaEngine::new(NoneCompatible).with_criteria(Never);
        let node = q.type_by_name("x.Order").unwrap();
        assert!(engine.contributions(node, &q).is_empty());
        assert!(engine.classify(node, &q).is_empty());
    }

    #[test]
    fn test_profile_override_changes_winner() {
        let graph = one_type_graph();
        let q = GraphQuery::new(&graph);
        let node = q.type_by_name("x.Order").unwrap();

        let engine = || {
            CriteriaEngine::new(NoneCompatible)
                .with_criteria(always("entity", DomainKind::Entity, 70))
                .with_criteria(always("vo", DomainKind::ValueObject, 65))
        };
        assert_eq!(engine().classify(node, &q).kind(), Some(DomainKind::Entity));

        let profile =
            CriteriaProfile::with_overrides(BTreeMap::from([("vo".to_string(), 90)])).unwrap();
        let decision = engine().with_profile(profile).classify(node, &q);
        assert_eq!(decision.kind(), Some(DomainKind::ValueObject));
        assert_eq!(decision.winner.as_ref().map(|w| w.priority), Some(90));
        assert_eq!(decision.conflicts[0].competing_priority, 70);
    }

    #[test]
    fn test_compatible_co_classification() {
        let graph = one_type_graph();
        let q = GraphQuery::new(&graph);
        let node = q.type_by_name("x.Order").unwrap();
        let engine = CriteriaEngine::new(domain_default())
            .with_criteria(always("agg", DomainKind::AggregateRoot, 80))
            .with_criteria(always("entity", DomainKind::Entity, 70));
        let decision = engine.classify(node, &q);
        assert_eq!(decision.kind(), Some(DomainKind::AggregateRoot));
        assert!(!decision.has_conflicts());
    }

    #[test]
    fn test_classify_all_covers_every_type() {
        let mut b = GraphBuilder::new();
        for name in ["x.A", "x.B", "x.C"] {
            b.add_node(TypeNode::new(name, TypeForm::Class).unwrap()).unwrap();
        }
        let graph = b.freeze();
        let q = GraphQuery::new(&graph);
        let engine = CriteriaEngine::new(NoneCompatible).with_criteria(always("e", DomainKind::Entity, 1));
        let all = engine.classify_all(&q);
        let keys: Vec<_> = all.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["type:x.A", "type:x.B", "type:x.C"]);
        assert!(all.values().all(|d| d.kind() == Some(DomainKind::Entity)));
    }
}
