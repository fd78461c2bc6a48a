use crate::adapters::criteria::identity_field;
use crate::classification::kind::{ConfidenceLevel, DomainKind};
use crate::domain::node::{TypeForm, TypeNode};
use crate::plugin::executor::{ClassificationPlugin, PluginContext, PluginError, PluginVerdict};
use std::collections::BTreeMap;
use std::time::Duration;

/// One weighted piece of evidence for a kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Simple name ends with the suffix
    Suffix(&'static str),
    /// Declared with this syntactic form
    Form(TypeForm),
    /// Has a field that looks like an identity
    HasIdentity,
    /// Has no instance fields at all
    Stateless,
}

impl Signal {
    fn holds(&self, node: &TypeNode, context: &PluginContext<DomainKind>) -> bool {
        match self {
            Signal::Suffix(s) => node.simple_name().len() > s.len() && node.simple_name().ends_with(s),
            Signal::Form(form) => node.form == *form,
            Signal::HasIdentity => identity_field(node, &context.query()).is_some(),
            Signal::Stateless => context
                .query()
                .fields_of(&node.id)
                .iter()
                .all(|f| f.is_static()),
        }
    }
}

/// Scores naming and shape signals per kind and proposes the best scoring kind.
///
/// Defers when no kind reaches `threshold`. The verdict's confidence is the
/// score expressed as a share of the kind's total weight.
pub struct WeightedNamingPlugin {
    id: String,
    signals: Vec<(DomainKind, Signal, u32)>,
    threshold: u32,
    timeout: Option<Duration>,
}

impl WeightedNamingPlugin {
    pub fn new(id: impl Into<String>, threshold: u32) -> Self {
        Self {
            id: id.into(),
            signals: Vec::new(),
            threshold,
            timeout: None,
        }
    }

    /// Signals used when nothing else is configured.
    pub fn with_default_signals(id: impl Into<String>) -> Self {
        Self::new(id, 3)
            .with_signal(DomainKind::ValueObject, Signal::Form(TypeForm::Record), 2)
            .with_signal(DomainKind::ValueObject, Signal::Suffix("Value"), 2)
            .with_signal(DomainKind::Identifier, Signal::Suffix("Id"), 3)
            .with_signal(DomainKind::Identifier, Signal::Form(TypeForm::Record), 1)
            .with_signal(DomainKind::Entity, Signal::HasIdentity, 2)
            .with_signal(DomainKind::DomainEvent, Signal::Suffix("Event"), 3)
            .with_signal(DomainKind::DomainEvent, Signal::Form(TypeForm::Record), 1)
            .with_signal(DomainKind::DomainService, Signal::Suffix("Service"), 2)
            .with_signal(DomainKind::DomainService, Signal::Stateless, 1)
    }

    pub fn with_signal(mut self, kind: DomainKind, signal: Signal, weight: u32) -> Self {
        self.signals.push((kind, signal, weight));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn total_weight(&self, kind: DomainKind) -> u32 {
        self.signals
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, _, w)| w)
            .sum()
    }
}

impl ClassificationPlugin<DomainKind> for WeightedNamingPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn classify(
        &self,
        node: &TypeNode,
        context: &PluginContext<DomainKind>,
    ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
        if node.form == TypeForm::Interface || node.form == TypeForm::Annotation {
            return Ok(None);
        }
        let mut scores: BTreeMap<DomainKind, (u32, Vec<String>)> = BTreeMap::new();
        for (kind, signal, weight) in &self.signals {
            if context.is_cancelled() {
                return Err(PluginError::Cancelled);
            }
            if signal.holds(node, context) {
                let entry = scores.entry(*kind).or_default();
                entry.0 += weight;
                entry.1.push(format!("{signal:?}"));
            }
        }

        // highest score wins, ties go to the first kind in declaration order
        let Some((kind, (score, hits))) = scores
            .into_iter()
            .filter(|(_, (score, _))| *score >= self.threshold)
            .max_by(|(ka, (a, _)), (kb, (b, _))| a.cmp(b).then(kb.cmp(ka)))
        else {
            return Ok(None);
        };

        let total = self.total_weight(kind).max(1);
        let pct = u8::try_from(score.saturating_mul(100) / total).unwrap_or(100);
        let confidence = ConfidenceLevel::from_percentage(pct)
            .unwrap_or(ConfidenceLevel::Low)
            .min(ConfidenceLevel::High);
        Ok(Some(PluginVerdict {
            kind,
            confidence,
            justification: format!("Weighted score {score}/{total} from {}", hits.join(", ")),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::policy::Decision;
    use crate::domain::builder::GraphBuilder;
    use crate::domain::node::{FieldNode, TypeRef};
    use std::sync::Arc;

    fn context(types: Vec<TypeNode>, fields: Vec<FieldNode>) -> PluginContext<DomainKind> {
        let mut b = GraphBuilder::new();
        for t in types {
            b.add_node(t).unwrap();
        }
        for f in fields {
            b.add_node(f).unwrap();
        }
        PluginContext::new(Arc::new(b.freeze()), Decision::empty())
    }

    #[test]
    fn test_record_named_id_is_identifier() {
        let node = TypeNode::new("x.CustomerId", TypeForm::Record).unwrap();
        let ctx = context(vec![node.clone()], vec![]);
        let plugin = WeightedNamingPlugin::with_default_signals("weighted");

        let verdict = plugin.classify(&node, &ctx).unwrap().unwrap();
        assert_eq!(verdict.kind, DomainKind::Identifier);
        assert_eq!(verdict.confidence, ConfidenceLevel::High);
        assert!(verdict.justification.starts_with("Weighted score 4/4"));
    }

    #[test]
    fn test_defers_below_threshold() {
        let node = TypeNode::new("x.Customer", TypeForm::Class).unwrap();
        let field = FieldNode::new("x.Customer", "id", TypeRef::new("long")).unwrap();
        let ctx = context(vec![node.clone()], vec![field]);

        let plugin = WeightedNamingPlugin::with_default_signals("weighted");
        assert!(plugin.classify(&node, &ctx).unwrap().is_none());

        let lenient = WeightedNamingPlugin::new("lenient", 1).with_signal(DomainKind::Entity, Signal::HasIdentity, 1);
        let verdict = lenient.classify(&node, &ctx).unwrap().unwrap();
        assert_eq!(verdict.kind, DomainKind::Entity);
    }

    #[test]
    fn test_interfaces_are_skipped() {
        let node = TypeNode::new("x.EventService", TypeForm::Interface).unwrap();
        let ctx = context(vec![node.clone()], vec![]);
        let plugin = WeightedNamingPlugin::with_default_signals("weighted");
        assert!(plugin.classify(&node, &ctx).unwrap().is_none());
    }
}
