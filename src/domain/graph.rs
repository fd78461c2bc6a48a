use crate::domain::edge::{Edge, EdgeKind};
use crate::domain::id::NodeId;
use crate::domain::node::{Node, TypeForm, TypeNode};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

/// Lookup tables computed once when a graph is frozen.
///
/// Every list is in deterministic order: type lists are sorted by id, member
/// lists follow insertion order.
#[derive(Debug, Default, Clone)]
pub struct GraphIndexes {
    pub types_by_form: BTreeMap<TypeForm, Vec<NodeId>>,
    pub types_by_package: BTreeMap<String, Vec<NodeId>>,
    /// Keyed by both simple and qualified annotation name
    pub types_by_annotation: BTreeMap<String, Vec<NodeId>>,
    pub types_by_name: HashMap<String, NodeId>,
    pub members_by_type: HashMap<NodeId, Vec<NodeId>>,
    /// Supertype id → direct subtypes (in-graph `Extends` edges)
    pub subtypes: BTreeMap<NodeId, Vec<NodeId>>,
    /// Interface id → direct implementors (in-graph `Implements` edges)
    pub implementors: BTreeMap<NodeId, Vec<NodeId>>,
}

impl GraphIndexes {
    fn build(graph: &FactGraph) -> Self {
        let mut idx = GraphIndexes::default();

        for node in graph.nodes() {
            match node {
                Node::Type(t) => {
                    idx.types_by_form.entry(t.form).or_default().push(t.id.clone());
                    idx.types_by_package
                        .entry(t.package_name().to_string())
                        .or_default()
                        .push(t.id.clone());
                    for annotation in &t.annotations {
                        idx.types_by_annotation
                            .entry(annotation.qualified_name.clone())
                            .or_default()
                            .push(t.id.clone());
                        if annotation.simple_name() != annotation.qualified_name {
                            idx.types_by_annotation
                                .entry(annotation.simple_name().to_string())
                                .or_default()
                                .push(t.id.clone());
                        }
                    }
                    idx.types_by_name.insert(t.qualified_name.clone(), t.id.clone());
                }
                other => {
                    if let Some(owner) = other.declaring_type() {
                        idx.members_by_type
                            .entry(owner.clone())
                            .or_default()
                            .push(other.id().clone());
                    }
                }
            }
        }

        for edge in graph.edges() {
            let bucket = match edge.kind() {
                EdgeKind::Extends => &mut idx.subtypes,
                EdgeKind::Implements => &mut idx.implementors,
                _ => continue,
            };
            bucket.entry(edge.to().clone()).or_default().push(edge.from().clone());
        }

        for list in idx
            .types_by_form
            .values_mut()
            .chain(idx.types_by_package.values_mut())
            .chain(idx.types_by_annotation.values_mut())
            .chain(idx.subtypes.values_mut())
            .chain(idx.implementors.values_mut())
        {
            list.sort();
            list.dedup();
        }
        idx
    }
}

/// Frozen fact graph - immutable once built, safe to share across threads.
#[derive(Debug)]
pub struct FactGraph {
    graph: DiGraph<Node, Edge>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    indexes: GraphIndexes,
}

impl FactGraph {
    pub(crate) fn new(graph: DiGraph<Node, Edge>, id_to_index: HashMap<NodeId, NodeIndex>) -> Self {
        let mut frozen = Self {
            graph,
            id_to_index,
            indexes: GraphIndexes::default(),
        };
        frozen.indexes = GraphIndexes::build(&frozen);
        frozen
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

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.id_to_index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn type_node(&self, id: &NodeId) -> Option<&TypeNode> {
        self.node(id).and_then(Node::as_type)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Outgoing edges of `id` in insertion order.
    pub fn edges_from(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges_directed(id, Direction::Outgoing)
    }

    /// Incoming edges of `id` in insertion order.
    pub fn edges_to(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges_directed(id, Direction::Incoming)
    }

    fn edges_directed(&self, id: &NodeId, direction: Direction) -> Vec<&Edge> {
        let Some(&idx) = self.id_to_index.get(id) else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest-first
        let mut ids: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| e.id())
            .collect();
        ids.sort();
        ids.into_iter().map(|e| &self.graph[e]).collect()
    }

    /// Declared members of a type, in insertion order.
    pub fn members_of(&self, type_id: &NodeId) -> Vec<&Node> {
        self.indexes
            .members_by_type
            .get(type_id)
            .map(|ids| ids.iter().filter_map(|id| self.node(id)).collect())
            .unwrap_or_default()
    }

    pub fn indexes(&self) -> &GraphIndexes {
        &self.indexes
    }
}
