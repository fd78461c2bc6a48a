use crate::domain::cycle::{Cycle, CycleDetectionConfig, find_dependency_cycles};
use crate::domain::edge::{Edge, EdgeKind};
use crate::domain::graph::FactGraph;
use crate::domain::id::NodeId;
use crate::domain::node::{ConstructorNode, FieldNode, MethodNode, Node, TypeForm, TypeNode};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Read-only traversal facade over a frozen [`FactGraph`].
///
/// Cheap to copy; every method is a pure read.
#[derive(Debug, Clone, Copy)]
pub struct GraphQuery<'g> {
    graph: &'g FactGraph,
}

impl<'g> GraphQuery<'g> {
    pub fn new(graph: &'g FactGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g FactGraph {
        self.graph
    }

    // ============ Core lookups ============

    pub fn node_by_id(&self, id: &NodeId) -> Option<&'g Node> {
        self.graph.node(id)
    }

    pub fn edges_from(&self, id: &NodeId) -> Vec<&'g Edge> {
        self.graph.edges_from(id)
    }

    pub fn edges_to(&self, id: &NodeId) -> Vec<&'g Edge> {
        self.graph.edges_to(id)
    }

    pub fn members_of(&self, type_id: &NodeId) -> Vec<&'g Node> {
        self.graph.members_of(type_id)
    }

    // ============ Types ============

    /// All types in insertion order.
    pub fn types(&self) -> impl Iterator<Item = &'g TypeNode> + use<'g> {
        self.graph.nodes().filter_map(Node::as_type)
    }

    pub fn type_by_name(&self, qualified_name: &str) -> Option<&'g TypeNode> {
        let id = self.graph.indexes().types_by_name.get(qualified_name)?;
        self.graph.type_node(id)
    }

    pub fn types_with_form(&self, form: TypeForm) -> Vec<&'g TypeNode> {
        self.resolve_types(self.graph.indexes().types_by_form.get(&form))
    }

    pub fn types_in_package(&self, package: &str) -> Vec<&'g TypeNode> {
        self.resolve_types(self.graph.indexes().types_by_package.get(package))
    }

    /// Matches simple or qualified annotation names.
    pub fn types_annotated_with(&self, annotation: &str) -> Vec<&'g TypeNode> {
        self.resolve_types(self.graph.indexes().types_by_annotation.get(annotation))
    }

    fn resolve_types(&self, ids: Option<&'g Vec<NodeId>>) -> Vec<&'g TypeNode> {
        ids.map(|ids| ids.iter().filter_map(|id| self.graph.type_node(id)).collect())
            .unwrap_or_default()
    }

    // ============ Members ============

    pub fn fields_of(&self, type_id: &NodeId) -> Vec<&'g FieldNode> {
        self.members_of(type_id)
            .into_iter()
            .filter_map(|n| match n {
                Node::Field(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn methods_of(&self, type_id: &NodeId) -> Vec<&'g MethodNode> {
        self.members_of(type_id)
            .into_iter()
            .filter_map(|n| match n {
                Node::Method(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn constructors_of(&self, type_id: &NodeId) -> Vec<&'g ConstructorNode> {
        self.members_of(type_id)
            .into_iter()
            .filter_map(|n| match n {
                Node::Constructor(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    // ============ Hierarchy ============

    /// Supertype when it is part of the graph.
    pub fn supertype_of(&self, type_id: &NodeId) -> Option<&'g TypeNode> {
        let t = self.graph.type_node(type_id)?;
        if t.is_interface() {
            return None;
        }
        let supertype = t.supertype.as_ref()?;
        self.type_by_name(&supertype.qualified_name)
    }

    /// Implemented (or, for interfaces, extended) interfaces that are part of the graph.
    pub fn interfaces_of(&self, type_id: &NodeId) -> Vec<&'g TypeNode> {
        let Some(t) = self.graph.type_node(type_id) else {
            return Vec::new();
        };
        t.interfaces
            .iter()
            .filter_map(|r| self.type_by_name(&r.qualified_name))
            .collect()
    }

    pub fn subtypes_of(&self, type_id: &NodeId) -> Vec<&'g TypeNode> {
        self.resolve_types(self.graph.indexes().subtypes.get(type_id))
    }

    pub fn implementors_of(&self, interface_id: &NodeId) -> Vec<&'g TypeNode> {
        self.resolve_types(self.graph.indexes().implementors.get(interface_id))
    }

    /// Interfaces whose method signatures use `type_id`.
    pub fn users_in_signature_of(&self, type_id: &NodeId) -> Vec<&'g TypeNode> {
        let mut users: Vec<&'g TypeNode> = self
            .edges_to(type_id)
            .into_iter()
            .filter(|e| e.kind() == EdgeKind::UsesInSignature)
            .filter_map(|e| self.graph.type_node(e.from()))
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users.dedup_by(|a, b| a.id == b.id);
        users
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<&'g Edge> {
        self.graph.edges().filter(|e| e.kind() == kind).collect()
    }

    // ============ Type-level dependencies ============

    /// Qualified type name → qualified names it depends on.
    ///
    /// Member edges are lifted to their declaring types, `Declares` edges and
    /// self-dependencies are dropped. Every type appears as a key.
    pub fn type_dependencies(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut deps: BTreeMap<String, BTreeSet<String>> = self
            .types()
            .map(|t| (t.qualified_name.clone(), BTreeSet::new()))
            .collect();
        for edge in self.graph.edges() {
            if !edge.kind().is_dependency() {
                continue;
            }
            let from = edge.from().type_name();
            let to = edge.to().type_name();
            if from == to {
                continue;
            }
            if let Some(targets) = deps.get_mut(from) {
                targets.insert(to.to_string());
            }
        }
        deps
    }

    /// Types reachable from `qualified_name` within `max_depth` hops, excluding itself.
    pub fn transitive_dependencies(&self, qualified_name: &str, max_depth: usize) -> BTreeSet<String> {
        let deps = self.type_dependencies();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(qualified_name, 0)]);
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for next in deps.get(current).into_iter().flatten() {
                if next != qualified_name && seen.insert(next.clone()) {
                    queue.push_back((next.as_str(), depth + 1));
                }
            }
        }
        seen
    }

    /// Shortest dependency path between two types, both ends included.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let deps = self.type_dependencies();
        if !deps.contains_key(from) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for next in deps.get(current).into_iter().flatten() {
                let next = next.as_str();
                if next == from || parent.contains_key(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(&prev) = parent.get(cursor) {
                        path.push(prev.to_string());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Whether the type can reach itself through its dependencies.
    pub fn has_cyclic_dependency(&self, qualified_name: &str) -> bool {
        let deps = self.type_dependencies();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = vec![qualified_name];
        while let Some(current) = stack.pop() {
            for next in deps.get(current).into_iter().flatten() {
                if next == qualified_name {
                    return true;
                }
                if seen.insert(next.as_str()) {
                    stack.push(next.as_str());
                }
            }
        }
        false
    }

    /// Cycles in the type-level dependency map.
    pub fn type_cycles(&self, config: &CycleDetectionConfig) -> Vec<Cycle<String, (String, String)>> {
        find_dependency_cycles(&self.type_dependencies(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::GraphBuilder;
    use crate::domain::node::{FieldNode, MethodNode, TypeRef};

    fn sample() -> FactGraph {
        let mut b = GraphBuilder::new();
        b.add_node(TypeNode::new("app.A", TypeForm::Class).unwrap()).unwrap();
        b.add_node(TypeNode::new("app.B", TypeForm::Class).unwrap()).unwrap();
        b.add_node(TypeNode::new("app.C", TypeForm::Class).unwrap()).unwrap();
        b.add_node(FieldNode::new("app.A", "b", TypeRef::new("app.B")).unwrap()).unwrap();
        b.add_node(FieldNode::new("app.B", "c", TypeRef::new("app.C")).unwrap()).unwrap();
        b.add_node(MethodNode::new("app.C", "back", TypeRef::new("app.A"), vec![]).unwrap())
            .unwrap();
        b.link_structural_edges().unwrap();
        b.freeze()
    }

    #[test]
    fn test_member_queries() {
        let graph = sample();
        let q = GraphQuery::new(&graph);
        let a = NodeId::type_("app.A");
        assert_eq!(q.fields_of(&a).len(), 1);
        assert!(q.methods_of(&a).is_empty());
        assert_eq!(q.methods_of(&NodeId::type_("app.C")).len(), 1);
        assert!(q.type_by_name("app.B").is_some());
        assert!(q.type_by_name("app.Z").is_none());
    }

    #[test]
    fn test_type_dependencies_lift_member_edges() {
        let graph = sample();
        let q = GraphQuery::new(&graph);
        let deps = q.type_dependencies();
        assert_eq!(deps["app.A"], BTreeSet::from(["app.B".to_string()]));
        assert_eq!(deps["app.C"], BTreeSet::from(["app.A".to_string()]));
    }

    #[test]
    fn test_paths_and_cycles() {
        let graph = sample();
        let q = GraphQuery::new(&graph);
        assert_eq!(
            q.shortest_path("app.A", "app.C"),
            Some(vec!["app.A".to_string(), "app.B".to_string(), "app.C".to_string()])
        );
        assert_eq!(q.transitive_dependencies("app.A", 1).len(), 1);
        assert_eq!(q.transitive_dependencies("app.A", 5).len(), 2);
        assert!(q.has_cyclic_dependency("app.B"));

        let cycles = q.type_cycles(&CycleDetectionConfig::default());
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes.len(), 3);
    }
}
