use crate::classification::contribution::Contribution;
use crate::classification::kind::{
    ClassificationKind, ConfidenceLevel, DomainKind, PortDirection, PortKind,
};
use crate::classification::policy::Decision;
use crate::domain::builder::GraphBuilder;
use crate::domain::cycle::Cycle;
use crate::domain::edge::{Edge, EdgeKind};
use crate::domain::graph::FactGraph;
use crate::domain::id::NodeId;
use crate::domain::node::{
    Annotation, ConstructorNode, FieldNode, MethodNode, Modifier, Parameter, SourceLocation,
    TypeForm, TypeNode, TypeRef,
};
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============ Input ============

/// Extracted program structure, as written by a front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub types: Vec<TypeDto>,
    /// Extra raw edges between types, by qualified name
    #[serde(default)]
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDto {
    pub name: String,
    pub form: TypeForm,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
    #[serde(default)]
    pub supertype: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub fields: Vec<FieldDto>,
    #[serde(default)]
    pub methods: Vec<MethodDto>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDto {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TypeRef,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDto {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: TypeRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDto {
    pub name: String,
    #[serde(default = "TypeRef::void")]
    pub return_type: TypeRef,
    #[serde(default)]
    pub parameters: Vec<ParameterDto>,
    #[serde(default)]
    pub thrown: Vec<TypeRef>,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub complexity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDto {
    #[serde(default)]
    pub parameters: Vec<ParameterDto>,
    #[serde(default)]
    pub thrown: Vec<TypeRef>,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

fn annotations(names: &[String]) -> Vec<Annotation> {
    names.iter().map(Annotation::new).collect()
}

fn parameters(params: &[ParameterDto]) -> Vec<Parameter> {
    params
        .iter()
        .map(|p| Parameter::new(&p.name, p.param_type.clone()))
        .collect()
}

impl GraphDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse graph document")
    }

    /// Builds the fact graph: nodes, structural edges, listed edges, derived edges.
    pub fn into_graph(self) -> Result<FactGraph> {
        let mut builder = GraphBuilder::new();

        for t in &self.types {
            let mut node = TypeNode::new(&t.name, t.form)
                .context("Invalid type")?
                .with_modifiers(t.modifiers.iter().copied())
                .with_interfaces(t.interfaces.iter().cloned())
                .with_annotations(annotations(&t.annotations));
            if let Some(supertype) = &t.supertype {
                node = node.with_supertype(supertype.clone());
            }
            if let Some(location) = &t.location {
                node = node.with_location(location.clone());
            }
            builder
                .add_node(node)
                .with_context(|| format!("Failed to add type {}", t.name))?;
        }

        for t in &self.types {
            for f in &t.fields {
                let field = FieldNode::new(&t.name, &f.name, f.field_type.clone())?
                    .with_modifiers(f.modifiers.iter().copied())
                    .with_annotations(annotations(&f.annotations));
                builder
                    .add_node(field)
                    .with_context(|| format!("Failed to add field {}.{}", t.name, f.name))?;
            }
            for m in &t.methods {
                let mut method =
                    MethodNode::new(&t.name, &m.name, m.return_type.clone(), parameters(&m.parameters))?
                        .with_modifiers(m.modifiers.iter().copied())
                        .with_thrown_types(m.thrown.iter().cloned());
                method.annotations = annotations(&m.annotations);
                if let Some(complexity) = m.complexity {
                    method = method.with_complexity(complexity);
                }
                builder
                    .add_node(method)
                    .with_context(|| format!("Failed to add method {}.{}", t.name, m.name))?;
            }
            for c in &t.constructors {
                let constructor = ConstructorNode::new(&t.name, parameters(&c.parameters))?
                    .with_modifiers(c.modifiers.iter().copied())
                    .with_thrown_types(c.thrown.iter().cloned());
                builder
                    .add_node(constructor)
                    .with_context(|| format!("Failed to add constructor of {}", t.name))?;
            }
        }

        let structural = builder.link_structural_edges()?;
        let mut listed = 0;
        for e in &self.edges {
            let edge = Edge::raw(NodeId::type_(&e.from), NodeId::type_(&e.to), e.kind);
            if builder
                .add_edge(edge)
                .with_context(|| format!("Invalid edge {} -> {}", e.from, e.to))?
            {
                listed += 1;
            }
        }
        let derived = builder.compute_derived_edges()?;
        tracing::debug!(structural, listed, derived, "graph edges linked");

        Ok(builder.freeze())
    }
}

// ============ Output ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub types: usize,
    pub nodes: usize,
    pub edges: usize,
}

impl GraphSummary {
    pub fn of(graph: &FactGraph) -> Self {
        Self {
            types: graph.nodes().filter(|n| n.as_type().is_some()).count(),
            nodes: graph.node_count(),
            edges: graph.edge_count(),
        }
    }
}

/// Classification of one type, flattened for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedType<K> {
    pub type_name: String,
    pub kind: K,
    pub confidence: ConfidenceLevel,
    pub criteria: String,
    pub justification: String,
    pub ambiguous: bool,
    /// Kinds that lost against an incompatible winner
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}

impl<K: ClassificationKind> ClassifiedType<K> {
    pub fn from_decision(type_name: &str, decision: &Decision<K>) -> Option<Self> {
        let winner = decision.winner.as_ref()?;
        Some(Self {
            type_name: type_name.to_string(),
            kind: winner.kind,
            confidence: winner.confidence,
            criteria: winner.criteria_key.clone(),
            justification: winner.justification.clone(),
            ambiguous: decision.is_ambiguous(),
            conflicts: decision.conflicts.iter().map(|c| c.rationale.clone()).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortReport {
    #[serde(flatten)]
    pub port: ClassifiedType<PortKind>,
    pub direction: PortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub graph: GraphSummary,
    pub domain: Vec<ClassifiedType<DomainKind>>,
    pub ports: Vec<PortReport>,
    pub unclassified: Vec<String>,
    pub cycles: Vec<Cycle<String, (String, String)>>,
}

/// Every contribution and the resulting decisions for one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeExplanation {
    pub type_name: String,
    pub domain_contributions: Vec<Contribution<DomainKind>>,
    pub domain_decision: Decision<DomainKind>,
    pub port_contributions: Vec<Contribution<PortKind>>,
    pub port_decision: Decision<PortKind>,
}
