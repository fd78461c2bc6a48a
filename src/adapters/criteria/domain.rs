use crate::adapters::criteria::{containers_of, identity_field, instance_fields, names, referencing_types};
use crate::classification::criteria::{Criteria, Evidence, EvidenceKind, MatchResult};
use crate::classification::kind::{ConfidenceLevel, DomainKind};
use crate::domain::node::{Modifier, TypeForm, TypeNode};
use crate::domain::query::GraphQuery;

/// Every built-in domain criteria, in registration order.
pub fn builtin(complexity_threshold: u32) -> Vec<Box<dyn Criteria<DomainKind>>> {
    let mut all: Vec<Box<dyn Criteria<DomainKind>>> = ExplicitAnnotationCriteria::all()
        .into_iter()
        .map(|c| Box::new(c) as Box<dyn Criteria<DomainKind>>)
        .collect();
    all.push(Box::new(RepositoryDominantCriteria));
    all.push(Box::new(RecordSingleIdCriteria));
    all.push(Box::new(ContainedEntityCriteria));
    all.push(Box::new(EmbeddedValueObjectCriteria));
    all.push(Box::new(DomainEventNamingCriteria));
    all.push(Box::new(RecordValueObjectCriteria));
    all.push(Box::new(ApplicationServiceCriteria));
    all.push(Box::new(StatelessServiceCriteria::new(complexity_threshold)));
    all
}

fn is_class_like(node: &TypeNode) -> bool {
    matches!(node.form, TypeForm::Class | TypeForm::Record)
}

// ============ Explicit ============

/// Matches a jMolecules-style annotation naming the kind
pub struct ExplicitAnnotationCriteria {
    key: &'static str,
    name: &'static str,
    /// Simple or qualified names; a qualified entry only matches that exact annotation
    annotations: &'static [&'static str],
    kind: DomainKind,
}

impl ExplicitAnnotationCriteria {
    pub fn all() -> Vec<Self> {
        [
            ("domain.explicit.aggregateRoot", "explicit-aggregate-root", &["AggregateRoot"][..], DomainKind::AggregateRoot),
            ("domain.explicit.entity", "explicit-entity", &["Entity"][..], DomainKind::Entity),
            ("domain.explicit.valueObject", "explicit-value-object", &["ValueObject"][..], DomainKind::ValueObject),
            ("domain.explicit.identifier", "explicit-identifier", &["Identifier"][..], DomainKind::Identifier),
            ("domain.explicit.domainEvent", "explicit-domain-event", &["DomainEvent"][..], DomainKind::DomainEvent),
            // a bare `Service` is usually a framework's application-layer marker
            (
                "domain.explicit.domainService",
                "explicit-domain-service",
                &["DomainService", "org.jmolecules.ddd.annotation.Service"][..],
                DomainKind::DomainService,
            ),
        ]
        .into_iter()
        .map(|(key, name, annotations, kind)| Self {
            key,
            name,
            annotations,
            kind,
        })
        .collect()
    }
}

impl Criteria<DomainKind> for ExplicitAnnotationCriteria {
    fn name(&self) -> &str {
        self.name
    }

    fn key(&self) -> &str {
        self.key
    }

    fn target_kind(&self) -> DomainKind {
        self.kind
    }

    fn default_priority(&self) -> i32 {
        100
    }

    fn evaluate(&self, node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
        let Some(annotation) = self.annotations.iter().find(|a| node.has_annotation(a)) else {
            return MatchResult::no_match();
        };
        MatchResult::matched(
            ConfidenceLevel::Explicit,
            format!("Annotated with @{annotation}"),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Annotation, format!("@{annotation}"))
                .with_related([node.id.clone()]),
        )
    }
}

// ============ Structural ============

/// Class with an identity, managed by a repository interface
pub struct RepositoryDominantCriteria;

impl Criteria<DomainKind> for RepositoryDominantCriteria {
    fn name(&self) -> &str {
        "repository-dominant"
    }

    fn key(&self) -> &str {
        "domain.structural.repositoryDominant"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::AggregateRoot
    }

    fn default_priority(&self) -> i32 {
        80
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if !is_class_like(node) {
            return MatchResult::no_match();
        }
        let Some(id_field) = identity_field(node, query) else {
            return MatchResult::no_match();
        };
        let repositories: Vec<&TypeNode> = query
            .users_in_signature_of(&node.id)
            .into_iter()
            .filter(|t| t.simple_name().ends_with("Repository"))
            .collect();
        if repositories.is_empty() {
            return MatchResult::no_match();
        }
        MatchResult::matched(
            ConfidenceLevel::High,
            format!(
                "Has identity '{}' and is managed by {}",
                id_field.name,
                names(&repositories)
            ),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Relationship, "Used in repository signatures")
                .with_related(repositories.iter().map(|r| r.id.clone())),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Structure, format!("Identity field '{}'", id_field.name))
                .with_related([id_field.id.clone()]),
        )
    }
}

/// Record named `*Id` wrapping exactly one value
pub struct RecordSingleIdCriteria;

impl Criteria<DomainKind> for RecordSingleIdCriteria {
    fn name(&self) -> &str {
        "record-single-id"
    }

    fn key(&self) -> &str {
        "domain.structural.recordSingleId"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::Identifier
    }

    fn default_priority(&self) -> i32 {
        80
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if !node.is_record() || !node.simple_name().ends_with("Id") || node.simple_name() == "Id" {
            return MatchResult::no_match();
        }
        let fields = instance_fields(node, query);
        let [only] = fields.as_slice() else {
            return MatchResult::no_match();
        };
        MatchResult::matched(
            ConfidenceLevel::High,
            format!("Record named *Id wrapping a single '{}'", only.field_type.simple_name()),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Structure, "Single component record")
                .with_related([only.id.clone()]),
        )
        .with_evidence(Evidence::new(EvidenceKind::Naming, "Name ends with 'Id'"))
    }
}

/// Class with an identity, held by another identified type and not managed by a repository
pub struct ContainedEntityCriteria;

impl Criteria<DomainKind> for ContainedEntityCriteria {
    fn name(&self) -> &str {
        "contained-entity"
    }

    fn key(&self) -> &str {
        "domain.structural.containedEntity"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::Entity
    }

    fn default_priority(&self) -> i32 {
        70
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if node.form != TypeForm::Class || identity_field(node, query).is_none() {
            return MatchResult::no_match();
        }
        let managed = query
            .users_in_signature_of(&node.id)
            .iter()
            .any(|t| t.simple_name().ends_with("Repository"));
        if managed {
            return MatchResult::no_match();
        }
        let owners: Vec<&TypeNode> = containers_of(node, query)
            .into_iter()
            .filter(|c| identity_field(c, query).is_some())
            .collect();
        if owners.is_empty() {
            return MatchResult::no_match();
        }
        MatchResult::matched(
            ConfidenceLevel::High,
            format!("Has identity and is contained in {}", names(&owners)),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Relationship, "Contained by identified types")
                .with_related(owners.iter().map(|o| o.id.clone())),
        )
    }
}

/// Type without identity embedded in an identified type
pub struct EmbeddedValueObjectCriteria;

impl EmbeddedValueObjectCriteria {
    fn is_immutable(node: &TypeNode, query: &GraphQuery<'_>) -> bool {
        node.is_record()
            || instance_fields(node, query)
                .iter()
                .all(|f| f.modifiers.contains(&Modifier::Final))
    }
}

impl Criteria<DomainKind> for EmbeddedValueObjectCriteria {
    fn name(&self) -> &str {
        "embedded-value-object"
    }

    fn key(&self) -> &str {
        "domain.structural.embeddedValueObject"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::ValueObject
    }

    fn default_priority(&self) -> i32 {
        70
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if !is_class_like(node) || identity_field(node, query).is_some() {
            return MatchResult::no_match();
        }
        let owners: Vec<&TypeNode> = containers_of(node, query)
            .into_iter()
            .filter(|c| identity_field(c, query).is_some())
            .collect();
        if owners.is_empty() {
            return MatchResult::no_match();
        }
        let (confidence, justification) = if Self::is_immutable(node, query) {
            (
                ConfidenceLevel::High,
                format!("Immutable type embedded in {}", names(&owners)),
            )
        } else {
            (
                ConfidenceLevel::Medium,
                format!("Embedded in {}, no identity, but not immutable", names(&owners)),
            )
        };
        MatchResult::matched(confidence, justification)
            .with_evidence(
                Evidence::new(EvidenceKind::Relationship, format!("Embedded in: {}", names(&owners)))
                    .with_related(owners.iter().map(|o| o.id.clone())),
            )
            .with_evidence(
                Evidence::new(EvidenceKind::Structure, "No identity field").with_related([node.id.clone()]),
            )
    }
}

// ============ Naming ============

/// Class or record named `*Event`
pub struct DomainEventNamingCriteria;

impl Criteria<DomainKind> for DomainEventNamingCriteria {
    fn name(&self) -> &str {
        "domain-event-naming"
    }

    fn key(&self) -> &str {
        "domain.naming.domainEvent"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::DomainEvent
    }

    fn default_priority(&self) -> i32 {
        68
    }

    fn evaluate(&self, node: &TypeNode, _query: &GraphQuery<'_>) -> MatchResult {
        let name = node.simple_name();
        if !is_class_like(node) || !name.ends_with("Event") || matches!(name, "Event" | "DomainEvent") {
            return MatchResult::no_match();
        }
        MatchResult::matched(ConfidenceLevel::Medium, format!("Name '{name}' ends with 'Event'"))
            .with_evidence(Evidence::new(EvidenceKind::Naming, "Event naming convention"))
    }
}

/// Record used by other types that is not an identifier
pub struct RecordValueObjectCriteria;

impl Criteria<DomainKind> for RecordValueObjectCriteria {
    fn name(&self) -> &str {
        "domain-record-value-object"
    }

    fn key(&self) -> &str {
        "domain.structural.recordValueObject"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::ValueObject
    }

    fn default_priority(&self) -> i32 {
        65
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if !node.is_record() || node.simple_name().ends_with("Id") {
            return MatchResult::no_match();
        }
        let users = referencing_types(node, query);
        if users.is_empty() {
            return MatchResult::no_match();
        }
        MatchResult::matched(
            ConfidenceLevel::Medium,
            format!("Immutable record referenced by {}", names(&users)),
        )
        .with_evidence(
            Evidence::new(EvidenceKind::Relationship, "Referenced by other types")
                .with_related(users.iter().map(|u| u.id.clone())),
        )
    }
}

// ============ Services ============

/// Class implementing a use-case interface, or named `*ApplicationService`
pub struct ApplicationServiceCriteria;

impl Criteria<DomainKind> for ApplicationServiceCriteria {
    fn name(&self) -> &str {
        "application-service"
    }

    fn key(&self) -> &str {
        "domain.structural.applicationService"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::ApplicationService
    }

    fn default_priority(&self) -> i32 {
        60
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if node.form != TypeForm::Class || node.is_abstract() {
            return MatchResult::no_match();
        }
        let use_cases: Vec<&TypeNode> = query
            .interfaces_of(&node.id)
            .into_iter()
            .filter(|i| i.simple_name().ends_with("UseCase"))
            .collect();
        if !use_cases.is_empty() {
            return MatchResult::matched(
                ConfidenceLevel::Medium,
                format!("Implements {}", names(&use_cases)),
            )
            .with_evidence(
                Evidence::new(EvidenceKind::Relationship, "Implements use case interfaces")
                    .with_related(use_cases.iter().map(|u| u.id.clone())),
            );
        }
        if node.simple_name().ends_with("ApplicationService") {
            return MatchResult::matched(ConfidenceLevel::Medium, "Named *ApplicationService")
                .with_evidence(Evidence::new(EvidenceKind::Naming, "Application service naming"));
        }
        MatchResult::no_match()
    }
}

/// Stateless class named `*Service` whose fields only hold collaborators
pub struct StatelessServiceCriteria {
    complexity_threshold: u32,
}

impl StatelessServiceCriteria {
    pub fn new(complexity_threshold: u32) -> Self {
        Self {
            complexity_threshold,
        }
    }
}

impl Criteria<DomainKind> for StatelessServiceCriteria {
    fn name(&self) -> &str {
        "stateless-service"
    }

    fn key(&self) -> &str {
        "domain.structural.statelessService"
    }

    fn target_kind(&self) -> DomainKind {
        DomainKind::DomainService
    }

    fn default_priority(&self) -> i32 {
        55
    }

    fn evaluate(&self, node: &TypeNode, query: &GraphQuery<'_>) -> MatchResult {
        if node.form != TypeForm::Class || !node.simple_name().ends_with("Service") {
            return MatchResult::no_match();
        }
        let stateful = instance_fields(node, query).into_iter().any(|f| {
            let collaborator = query
                .type_by_name(&f.field_type.qualified_name)
                .is_some_and(|t| t.is_interface());
            !collaborator
        });
        if stateful {
            return MatchResult::no_match();
        }
        let methods = query.methods_of(&node.id);
        if methods.is_empty() {
            return MatchResult::no_match();
        }
        let complex: Vec<&str> = methods
            .iter()
            .filter(|m| m.complexity.is_some_and(|c| c >= self.complexity_threshold))
            .map(|m| m.name.as_str())
            .collect();
        let (confidence, justification) = if complex.is_empty() {
            (ConfidenceLevel::Low, "Stateless *Service holding only collaborators".to_string())
        } else {
            (
                ConfidenceLevel::Medium,
                format!("Stateless *Service with domain logic in {}", complex.join(", ")),
            )
        };
        MatchResult::matched(confidence, justification).with_evidence(Evidence::new(
            EvidenceKind::Structure,
            format!("{} method(s), no state", methods.len()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::GraphBuilder;
    use crate::domain::graph::FactGraph;
    use crate::domain::id::NodeId;
    use crate::domain::node::{Annotation, FieldNode, MethodNode, Parameter, TypeRef};

    fn ty(name: &str, form: TypeForm) -> TypeNode {
        TypeNode::new(name, form).unwrap()
    }

    fn field(owner: &str, name: &str, ty: TypeRef) -> FieldNode {
        FieldNode::new(owner, name, ty).unwrap()
    }

    /// Order (id, lines, address) managed by OrderRepository; OrderId record;
    /// OrderLine with its own id; Address without identity.
    fn order_graph() -> FactGraph {
        let mut b = GraphBuilder::new();
        b.add_node(ty("shop.Order", TypeForm::Class)).unwrap();
        b.add_node(ty("shop.OrderId", TypeForm::Record)).unwrap();
        b.add_node(ty("shop.OrderLine", TypeForm::Class)).unwrap();
        b.add_node(ty("shop.Address", TypeForm::Record)).unwrap();
        b.add_node(ty("shop.OrderRepository", TypeForm::Interface)).unwrap();
        b.add_node(ty("shop.OrderPlacedEvent", TypeForm::Record)).unwrap();

        b.add_node(field("shop.OrderId", "value", TypeRef::new("java.util.UUID"))).unwrap();
        b.add_node(field("shop.Order", "id", TypeRef::new("shop.OrderId"))).unwrap();
        b.add_node(field(
            "shop.Order",
            "lines",
            TypeRef::generic("java.util.List", vec![TypeRef::new("shop.OrderLine")]),
        ))
        .unwrap();
        b.add_node(field("shop.Order", "address", TypeRef::new("shop.Address"))).unwrap();
        b.add_node(field("shop.OrderLine", "id", TypeRef::new("java.lang.Long"))).unwrap();
        b.add_node(field("shop.Address", "street", TypeRef::new("java.lang.String"))).unwrap();
        b.add_node(
            MethodNode::new(
                "shop.OrderRepository",
                "save",
                TypeRef::void(),
                vec![Parameter::new("order", TypeRef::new("shop.Order"))],
            )
            .unwrap(),
        )
        .unwrap();
        b.link_structural_edges().unwrap();
        b.compute_derived_edges().unwrap();
        b.freeze()
    }

    fn eval(criteria: &dyn Criteria<DomainKind>, graph: &FactGraph, name: &str) -> MatchResult {
        let query = GraphQuery::new(graph);
        let node = query.type_by_name(name).unwrap();
        criteria.evaluate(node, &query)
    }

    #[test]
    fn test_builtin_keys_are_stable_and_unique() {
        let all = builtin(10);
        let mut keys: Vec<&str> = all.iter().map(|c| c.key()).collect();
        assert!(keys.iter().all(|k| crate::classification::criteria::is_stable_key(k)));
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn test_explicit_annotation_matches_simple_or_qualified() {
        let mut b = GraphBuilder::new();
        b.add_node(
            ty("x.Money", TypeForm::Class)
                .with_annotations([Annotation::new("org.jmolecules.ddd.annotation.ValueObject")]),
        )
        .unwrap();
        let graph = b.freeze();
        let vo = ExplicitAnnotationCriteria::all()
            .into_iter()
            .find(|c| c.target_kind() == DomainKind::ValueObject)
            .unwrap();
        let result = eval(&vo, &graph, "x.Money");
        assert_eq!(result.confidence(), Some(ConfidenceLevel::Explicit));
        assert_eq!(vo.key(), "domain.explicit.valueObject");
    }

    #[test]
    fn test_explicit_domain_service_ignores_framework_service() {
        let mut b = GraphBuilder::new();
        for (name, annotation) in [
            ("x.Billing", "org.example.ddd.DomainService"),
            ("x.Pricing", "org.jmolecules.ddd.annotation.Service"),
            ("x.OrderFacade", "org.springframework.stereotype.Service"),
            ("x.Checkout", "Service"),
        ] {
            b.add_node(ty(name, TypeForm::Class).with_annotations([Annotation::new(annotation)]))
                .unwrap();
        }
        let graph = b.freeze();
        let service = ExplicitAnnotationCriteria::all()
            .into_iter()
            .find(|c| c.target_kind() == DomainKind::DomainService)
            .unwrap();

        assert!(eval(&service, &graph, "x.Billing").is_match());
        assert!(eval(&service, &graph, "x.Pricing").is_match());
        assert!(!eval(&service, &graph, "x.OrderFacade").is_match());
        assert!(!eval(&service, &graph, "x.Checkout").is_match());
    }

    #[test]
    fn test_repository_dominant_finds_aggregate() {
        let graph = order_graph();
        let result = eval(&RepositoryDominantCriteria, &graph, "shop.Order");
        assert_eq!(result.confidence(), Some(ConfidenceLevel::High));
        assert!(result.justification().unwrap().contains("OrderRepository"));
        assert!(!eval(&RepositoryDominantCriteria, &graph, "shop.OrderLine").is_match());
    }

    #[test]
    fn test_record_single_id() {
        let graph = order_graph();
        assert!(eval(&RecordSingleIdCriteria, &graph, "shop.OrderId").is_match());
        assert!(!eval(&RecordSingleIdCriteria, &graph, "shop.Address").is_match());
    }

    #[test]
    fn test_contained_entity_through_collection() {
        let graph = order_graph();
        let result = eval(&ContainedEntityCriteria, &graph, "shop.OrderLine");
        assert!(result.is_match());
        assert!(result.justification().unwrap().contains("Order"));
        // managed by a repository, so not a contained entity
        assert!(!eval(&ContainedEntityCriteria, &graph, "shop.Order").is_match());
    }

    #[test]
    fn test_embedded_value_object_confidence() {
        let graph = order_graph();
        let result = eval(&EmbeddedValueObjectCriteria, &graph, "shop.Address");
        assert_eq!(result.confidence(), Some(ConfidenceLevel::High));
        assert!(!eval(&EmbeddedValueObjectCriteria, &graph, "shop.OrderLine").is_match());
    }

    #[test]
    fn test_domain_event_naming() {
        let graph = order_graph();
        assert!(eval(&DomainEventNamingCriteria, &graph, "shop.OrderPlacedEvent").is_match());
        assert!(!eval(&DomainEventNamingCriteria, &graph, "shop.Order").is_match());
    }

    #[test]
    fn test_record_value_object_needs_a_user() {
        let graph = order_graph();
        assert!(eval(&RecordValueObjectCriteria, &graph, "shop.Address").is_match());
        assert!(!eval(&RecordValueObjectCriteria, &graph, "shop.OrderId").is_match());
        assert!(!eval(&RecordValueObjectCriteria, &graph, "shop.OrderPlacedEvent").is_match());
    }

    #[test]
    fn test_services() {
        let mut b = GraphBuilder::new();
        b.add_node(ty("x.PlaceOrderUseCase", TypeForm::Interface)).unwrap();
        b.add_node(ty("x.PricingPolicy", TypeForm::Interface)).unwrap();
        b.add_node(
            ty("x.OrderHandler", TypeForm::Class).with_interfaces([TypeRef::new("x.PlaceOrderUseCase")]),
        )
        .unwrap();
        b.add_node(ty("x.PricingService", TypeForm::Class)).unwrap();
        b.add_node(field("x.PricingService", "policy", TypeRef::new("x.PricingPolicy"))).unwrap();
        b.add_node(
            MethodNode::new("x.PricingService", "price", TypeRef::new("long"), vec![])
                .unwrap()
                .with_complexity(12),
        )
        .unwrap();
        b.link_structural_edges().unwrap();
        let graph = b.freeze();

        assert!(eval(&ApplicationServiceCriteria, &graph, "x.OrderHandler").is_match());
        assert_eq!(
            eval(&StatelessServiceCriteria::new(10), &graph, "x.PricingService").confidence(),
            Some(ConfidenceLevel::Medium)
        );
        assert_eq!(
            eval(&StatelessServiceCriteria::new(20), &graph, "x.PricingService").confidence(),
            Some(ConfidenceLevel::Low)
        );
        assert!(graph.contains(&NodeId::type_("x.PricingPolicy")));
    }
}
