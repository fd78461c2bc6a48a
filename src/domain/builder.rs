use crate::domain::edge::{Edge, EdgeKind, EdgeOrigin, EdgeProof};
use crate::domain::error::GraphError;
use crate::domain::graph::FactGraph;
use crate::domain::id::NodeId;
use crate::domain::node::{Node, TypeForm, TypeRef};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Graph builder - the only mutating phase of a fact graph.
///
/// Construction is append-only: nodes and edges can be added but never
/// removed or replaced. Every edge is checked against the nodes already
/// present, so a frozen graph never contains dangling references.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DiGraph<Node, Edge>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    edge_identities: HashSet<(NodeId, NodeId, EdgeKind, EdgeOrigin)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.id_to_index.contains_key(id)
    }

    /// Adds a node. Members also get a RAW `Declares` edge from their
    /// declaring type, which must already be present.
    pub fn add_node(&mut self, node: impl Into<Node>) -> Result<NodeId, GraphError> {
        let node = node.into();
        let id = node.id().clone();
        let derived = node.derived_id();
        if id != derived {
            return Err(GraphError::invalid(
                "node id",
                format!("'{id}' does not match its declaration, expected '{derived}'"),
            ));
        }
        if self.contains(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let owner = node.declaring_type().cloned();
        if let Some(owner) = &owner {
            let owner_is_type = self
                .id_to_index
                .get(owner)
                .is_some_and(|&idx| matches!(self.graph[idx], Node::Type(_)));
            if !owner_is_type {
                return Err(GraphError::UnknownDeclaringType {
                    member: id,
                    declaring_type: owner.clone(),
                });
            }
        }

        let idx = self.graph.add_node(node);
        self.id_to_index.insert(id.clone(), idx);
        if let Some(owner) = owner {
            self.add_edge(Edge::raw(owner, id.clone(), EdgeKind::Declares))?;
        }
        Ok(id)
    }

    /// Adds an edge. Returns `Ok(false)` when an edge with the same
    /// `(from, to, kind, origin)` already exists.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool, GraphError> {
        edge.validate()?;
        let Some(&from) = self.id_to_index.get(edge.from()) else {
            return Err(GraphError::UnknownSource(edge.from().clone()));
        };
        let Some(&to) = self.id_to_index.get(edge.to()) else {
            return Err(GraphError::UnknownTarget(edge.to().clone()));
        };
        let (f, t, kind, origin) = edge.identity();
        if !self
            .edge_identities
            .insert((f.clone(), t.clone(), kind, origin))
        {
            return Ok(false);
        }
        self.graph.add_edge(from, to, edge);
        Ok(true)
    }

    fn resolve(&self, type_ref: &TypeRef) -> Option<NodeId> {
        let id = NodeId::type_(&type_ref.qualified_name);
        self.contains(&id).then_some(id)
    }

    /// Records RAW hierarchy and signature edges for every type reference
    /// that resolves to a type in the graph. Idempotent; returns the number
    /// of new edges.
    pub fn link_structural_edges(&mut self) -> Result<usize, GraphError> {
        let mut pending: Vec<Edge> = Vec::new();
        let push_refs = |pending: &mut Vec<Edge>, from: &NodeId, tr: &TypeRef, kind: EdgeKind| {
            if let Some(target) = self.resolve(tr) {
                pending.push(Edge::raw(from.clone(), target, kind));
            }
            for arg in tr.all_referenced().into_iter().skip(1) {
                if let Some(target) = self.resolve(arg) {
                    pending.push(Edge::raw(from.clone(), target, EdgeKind::TypeArgument));
                }
            }
        };

        for node in self.graph.node_weights() {
            match node {
                Node::Type(t) => {
                    if let Some(supertype) = &t.supertype {
                        push_refs(&mut pending, &t.id, supertype, EdgeKind::Extends);
                    }
                    let kind = if t.form == TypeForm::Interface {
                        EdgeKind::Extends
                    } else {
                        EdgeKind::Implements
                    };
                    for interface in &t.interfaces {
                        push_refs(&mut pending, &t.id, interface, kind);
                    }
                }
                Node::Field(f) => push_refs(&mut pending, &f.id, &f.field_type, EdgeKind::FieldType),
                Node::Method(m) => {
                    push_refs(&mut pending, &m.id, &m.return_type, EdgeKind::ReturnType);
                    for p in &m.parameters {
                        push_refs(&mut pending, &m.id, &p.param_type, EdgeKind::ParameterType);
                    }
                    for thrown in &m.thrown_types {
                        push_refs(&mut pending, &m.id, thrown, EdgeKind::References);
                    }
                }
                Node::Constructor(c) => {
                    for p in &c.parameters {
                        push_refs(&mut pending, &c.id, &p.param_type, EdgeKind::ParameterType);
                    }
                    for thrown in &c.thrown_types {
                        push_refs(&mut pending, &c.id, thrown, EdgeKind::References);
                    }
                }
            }
        }

        let mut added = 0;
        for edge in pending {
            if edge.is_self_loop() && edge.kind() != EdgeKind::References {
                continue;
            }
            if self.add_edge(edge)? {
                added += 1;
            }
        }
        debug!(added, "Linked structural edges");
        Ok(added)
    }

    /// Computes DERIVED edges from the nodes present. Idempotent; returns the
    /// number of new edges.
    ///
    /// - `UsesInSignature`: interface → each in-graph type in one of its
    ///   method return or parameter types, generics and optionals unwrapped.
    /// - `UsesAsCollectionElement`: owner → in-graph element type of a
    ///   collection-like or optional-like field.
    ///
    /// At most one edge is produced per (from, to) pair and kind; the proof
    /// names the first member that produced it.
    pub fn compute_derived_edges(&mut self) -> Result<usize, GraphError> {
        let mut pending: Vec<Edge> = Vec::new();
        let mut seen: HashSet<(NodeId, NodeId, EdgeKind)> = HashSet::new();
        let mut push = |pending: &mut Vec<Edge>,
                        from: &NodeId,
                        to: NodeId,
                        kind: EdgeKind,
                        proof: EdgeProof| {
            if *from != to && seen.insert((from.clone(), to.clone(), kind)) {
                pending.push(Edge::derived(from.clone(), to, kind, proof));
            }
        };

        for node in self.graph.node_weights() {
            match node {
                Node::Method(m) => {
                    let owner_is_interface = self
                        .id_to_index
                        .get(&m.declaring_type)
                        .and_then(|&idx| self.graph[idx].as_type())
                        .is_some_and(|t| t.is_interface());
                    if !owner_is_interface {
                        continue;
                    }
                    let signature = std::iter::once(("return".to_string(), &m.return_type)).chain(
                        m.parameters
                            .iter()
                            .enumerate()
                            .map(|(i, p)| (format!("param:{i}"), &p.param_type)),
                    );
                    for (via, type_ref) in signature {
                        for used in type_ref.all_referenced() {
                            if used.is_void() || used.is_primitive() {
                                continue;
                            }
                            if let Some(target) = self.resolve(used) {
                                let proof = EdgeProof::signature_usage(m.id.clone(), via.clone());
                                push(&mut pending, &m.declaring_type, target, EdgeKind::UsesInSignature, proof);
                            }
                        }
                    }
                }
                Node::Field(f) => {
                    let rule = if f.field_type.is_collection_like() {
                        EdgeProof::RULE_COLLECTION_UNWRAP
                    } else if f.field_type.is_optional_like() {
                        EdgeProof::RULE_OPTIONAL_UNWRAP
                    } else {
                        continue;
                    };
                    let element = &f.field_type.arguments[0];
                    if let Some(target) = self.resolve(element) {
                        let proof = EdgeProof::field_unwrap(f.id.clone(), rule);
                        push(
                            &mut pending,
                            &f.declaring_type,
                            target,
                            EdgeKind::UsesAsCollectionElement,
                            proof,
                        );
                    }
                }
                _ => {}
            }
        }

        let mut added = 0;
        for edge in pending {
            if self.add_edge(edge)? {
                added += 1;
            }
        }
        debug!(added, "Computed derived edges");
        Ok(added)
    }

    /// Ends construction. The returned graph is immutable.
    pub fn freeze(self) -> FactGraph {
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "Freezing fact graph"
        );
        FactGraph::new(self.graph, self.id_to_index)
    }
}
