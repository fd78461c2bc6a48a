//! Built-in criteria for domain roles and hexagonal ports.

pub mod domain;
pub mod port;

use crate::classification::engine::CriteriaEngine;
use crate::classification::kind::{DomainKind, PortKind};
use crate::classification::policy::{domain_default, port_default};
use crate::classification::profile::CriteriaProfile;
use crate::domain::edge::EdgeKind;
use crate::domain::id::NodeId;
use crate::domain::node::{FieldNode, Node, TypeNode};
use crate::domain::query::GraphQuery;

/// Engine with every built-in domain criteria and the default domain compatibility.
pub fn domain_engine(profile: CriteriaProfile, complexity_threshold: u32) -> CriteriaEngine<DomainKind> {
    let mut engine = CriteriaEngine::new(domain_default()).with_profile(profile);
    for criteria in domain::builtin(complexity_threshold) {
        engine.register(criteria);
    }
    engine
}

/// Engine with every built-in port criteria; distinct port kinds always conflict.
pub fn port_engine(profile: CriteriaProfile) -> CriteriaEngine<PortKind> {
    let mut engine = CriteriaEngine::new(port_default()).with_profile(profile);
    for criteria in port::builtin() {
        engine.register(criteria);
    }
    engine
}

// -----------------------------------------------------------------------------
// Shared structural helpers
// -----------------------------------------------------------------------------

pub(crate) fn identity_field<'g>(node: &TypeNode, query: &GraphQuery<'g>) -> Option<&'g FieldNode> {
    query
        .fields_of(&node.id)
        .into_iter()
        .find(|f| f.looks_like_identity())
}

pub(crate) fn instance_fields<'g>(node: &TypeNode, query: &GraphQuery<'g>) -> Vec<&'g FieldNode> {
    query
        .fields_of(&node.id)
        .into_iter()
        .filter(|f| !f.is_static())
        .collect()
}

/// Other types holding `node` in a field, directly or as a collection element.
pub(crate) fn containers_of<'g>(node: &TypeNode, query: &GraphQuery<'g>) -> Vec<&'g TypeNode> {
    let mut containers: Vec<&'g TypeNode> = query
        .edges_to(&node.id)
        .into_iter()
        .filter_map(|edge| match edge.kind() {
            EdgeKind::FieldType | EdgeKind::TypeArgument => match query.node_by_id(edge.from())? {
                Node::Field(f) => query.graph().type_node(&f.declaring_type),
                _ => None,
            },
            EdgeKind::UsesAsCollectionElement => query.graph().type_node(edge.from()),
            _ => None,
        })
        .filter(|t| t.id != node.id)
        .collect();
    containers.sort_by(|a, b| a.id.cmp(&b.id));
    containers.dedup_by(|a, b| a.id == b.id);
    containers
}

/// Types other than `node` that depend on it through any non-ownership edge.
pub(crate) fn referencing_types<'g>(node: &TypeNode, query: &GraphQuery<'g>) -> Vec<&'g TypeNode> {
    let mut users: Vec<&'g TypeNode> = query
        .edges_to(&node.id)
        .into_iter()
        .filter(|e| e.kind().is_dependency())
        .filter_map(|e| query.graph().type_node(&NodeId::type_(e.from().type_name())))
        .filter(|t| t.id != node.id)
        .collect();
    users.sort_by(|a, b| a.id.cmp(&b.id));
    users.dedup_by(|a, b| a.id == b.id);
    users
}

pub(crate) fn names(types: &[&TypeNode]) -> String {
    types
        .iter()
        .map(|t| t.simple_name())
        .collect::<Vec<_>>()
        .join(", ")
}
