use crate::domain::error::GraphError;
use crate::domain::id::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Source position of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

/// Syntactic form of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeForm {
    Class,
    Interface,
    Record,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Sealed,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub qualified_name: String,
}

impl Annotation {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }

    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.qualified_name)
    }
}

const COLLECTION_WRAPPERS: &[&str] = &[
    "java.util.List",
    "java.util.Set",
    "java.util.Collection",
    "java.lang.Iterable",
    "java.util.stream.Stream",
    "List",
    "Set",
    "Collection",
    "Iterable",
    "Stream",
];

const OPTIONAL_WRAPPERS: &[&str] = &["java.util.Optional", "Optional"];

const PRIMITIVES: &[&str] = &[
    "void", "boolean", "byte", "short", "int", "long", "char", "float", "double",
];

/// Reference to a type as it appears in a signature, with its type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn generic(qualified_name: impl Into<String>, arguments: Vec<TypeRef>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            arguments,
        }
    }

    pub fn void() -> Self {
        Self::new("void")
    }

    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.qualified_name)
    }

    pub fn is_void(&self) -> bool {
        self.qualified_name == "void"
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.qualified_name.as_str())
    }

    pub fn is_collection_like(&self) -> bool {
        self.arguments.len() == 1 && COLLECTION_WRAPPERS.contains(&self.qualified_name.as_str())
    }

    pub fn is_optional_like(&self) -> bool {
        self.arguments.len() == 1 && OPTIONAL_WRAPPERS.contains(&self.qualified_name.as_str())
    }

    /// This type followed by all nested type arguments, depth first.
    pub fn all_referenced(&self) -> Vec<&TypeRef> {
        let mut out = vec![self];
        for arg in &self.arguments {
            out.extend(arg.all_referenced());
        }
        out
    }

    /// Canonical text used in member ids, e.g. `java.util.List<a.B>`.
    pub fn signature(&self) -> String {
        if self.arguments.is_empty() {
            return self.qualified_name.clone();
        }
        let args: Vec<String> = self.arguments.iter().map(TypeRef::signature).collect();
        format!("{}<{}>", self.qualified_name, args.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

fn param_signature(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| p.param_type.signature())
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn simple_name_of(qualified_name: &str) -> &str {
    qualified_name.rsplit('.').next().unwrap_or(qualified_name)
}

fn is_valid_identifier_path(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(char::is_whitespace)
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
}

fn validate_name(what: &'static str, name: &str) -> Result<(), GraphError> {
    if is_valid_identifier_path(name) {
        Ok(())
    } else {
        Err(GraphError::invalid(what, format!("'{name}'")))
    }
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub id: NodeId,
    pub qualified_name: String,
    pub form: TypeForm,
    pub modifiers: BTreeSet<Modifier>,
    pub supertype: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub annotations: Vec<Annotation>,
    pub location: Option<SourceLocation>,
}

impl TypeNode {
    /// Validates the qualified name and derives the id from it.
    pub fn new(qualified_name: impl Into<String>, form: TypeForm) -> Result<Self, GraphError> {
        let qualified_name = qualified_name.into();
        validate_name("type name", &qualified_name)?;
        Ok(Self {
            id: NodeId::type_(&qualified_name),
            qualified_name,
            form,
            modifiers: BTreeSet::new(),
            supertype: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            location: None,
        })
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_supertype(mut self, supertype: TypeRef) -> Self {
        self.supertype = Some(supertype);
        self
    }

    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = TypeRef>) -> Self {
        self.interfaces.extend(interfaces);
        self
    }

    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.qualified_name)
    }

    pub fn package_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(pkg, _)| pkg)
            .unwrap_or("")
    }

    pub fn is_interface(&self) -> bool {
        self.form == TypeForm::Interface
    }

    pub fn is_record(&self) -> bool {
        self.form == TypeForm::Record
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.contains(&Modifier::Abstract)
    }

    /// Matches on simple or qualified annotation name.
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations
            .iter()
            .any(|a| a.qualified_name == name || a.simple_name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub id: NodeId,
    pub declaring_type: NodeId,
    pub name: String,
    pub field_type: TypeRef,
    pub modifiers: BTreeSet<Modifier>,
    pub annotations: Vec<Annotation>,
    pub location: Option<SourceLocation>,
}

impl FieldNode {
    pub fn new(
        declaring_type: &str,
        name: impl Into<String>,
        field_type: TypeRef,
    ) -> Result<Self, GraphError> {
        let name = name.into();
        validate_name("declaring type name", declaring_type)?;
        validate_name("field name", &name)?;
        Ok(Self {
            id: NodeId::field(declaring_type, &name),
            declaring_type: NodeId::type_(declaring_type),
            name,
            field_type,
            modifiers: BTreeSet::new(),
            annotations: Vec::new(),
            location: None,
        })
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    /// `id`, `uuid`, or `<owner>Id` by name or by type. `customerId` on an
    /// `Order` is a reference, not an identity.
    pub fn looks_like_identity(&self) -> bool {
        if self.is_static() {
            return false;
        }
        let owner = simple_name_of(self.declaring_type.type_name());
        let own_id_type = format!("{owner}Id");
        self.name == "id"
            || self.name == "uuid"
            || self.field_type.simple_name() == own_id_type
            || self.name.eq_ignore_ascii_case(&own_id_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodNode {
    pub id: NodeId,
    pub declaring_type: NodeId,
    pub name: String,
    pub return_type: TypeRef,
    pub parameters: Vec<Parameter>,
    pub thrown_types: Vec<TypeRef>,
    pub modifiers: BTreeSet<Modifier>,
    pub annotations: Vec<Annotation>,
    /// Precomputed cyclomatic complexity, when the front end provides one
    pub complexity: Option<u32>,
    pub location: Option<SourceLocation>,
}

impl MethodNode {
    /// The id is derived from the declaring type, the name and the parameter types,
    /// so overloads get distinct ids.
    pub fn new(
        declaring_type: &str,
        name: impl Into<String>,
        return_type: TypeRef,
        parameters: Vec<Parameter>,
    ) -> Result<Self, GraphError> {
        let name = name.into();
        validate_name("declaring type name", declaring_type)?;
        validate_name("method name", &name)?;
        Ok(Self {
            id: NodeId::method(declaring_type, &name, &param_signature(&parameters)),
            declaring_type: NodeId::type_(declaring_type),
            name,
            return_type,
            parameters,
            thrown_types: Vec::new(),
            modifiers: BTreeSet::new(),
            annotations: Vec::new(),
            complexity: None,
            location: None,
        })
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_thrown_types(mut self, thrown: impl IntoIterator<Item = TypeRef>) -> Self {
        self.thrown_types.extend(thrown);
        self
    }

    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorNode {
    pub id: NodeId,
    pub declaring_type: NodeId,
    pub parameters: Vec<Parameter>,
    pub thrown_types: Vec<TypeRef>,
    pub modifiers: BTreeSet<Modifier>,
    pub annotations: Vec<Annotation>,
    pub location: Option<SourceLocation>,
}

impl ConstructorNode {
    pub fn new(declaring_type: &str, parameters: Vec<Parameter>) -> Result<Self, GraphError> {
        validate_name("declaring type name", declaring_type)?;
        Ok(Self {
            id: NodeId::constructor(declaring_type, &param_signature(&parameters)),
            declaring_type: NodeId::type_(declaring_type),
            parameters,
            thrown_types: Vec::new(),
            modifiers: BTreeSet::new(),
            annotations: Vec::new(),
            location: None,
        })
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_thrown_types(mut self, thrown: impl IntoIterator<Item = TypeRef>) -> Self {
        self.thrown_types.extend(thrown);
        self
    }
}

/// Polymorphic node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Type(TypeNode),
    Field(FieldNode),
    Method(MethodNode),
    Constructor(ConstructorNode),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Type(t) => &t.id,
            Node::Field(f) => &f.id,
            Node::Method(m) => &m.id,
            Node::Constructor(c) => &c.id,
        }
    }

    /// Id implied by the node's names and parameter types.
    pub fn derived_id(&self) -> NodeId {
        match self {
            Node::Type(t) => NodeId::type_(&t.qualified_name),
            Node::Field(f) => NodeId::field(f.declaring_type.path(), &f.name),
            Node::Method(m) => NodeId::method(
                m.declaring_type.path(),
                &m.name,
                &param_signature(&m.parameters),
            ),
            Node::Constructor(c) => {
                NodeId::constructor(c.declaring_type.path(), &param_signature(&c.parameters))
            }
        }
    }

    /// Owning type for members, `None` for types.
    pub fn declaring_type(&self) -> Option<&NodeId> {
        match self {
            Node::Type(_) => None,
            Node::Field(f) => Some(&f.declaring_type),
            Node::Method(m) => Some(&m.declaring_type),
            Node::Constructor(c) => Some(&c.declaring_type),
        }
    }

    pub fn modifiers(&self) -> &BTreeSet<Modifier> {
        match self {
            Node::Type(t) => &t.modifiers,
            Node::Field(f) => &f.modifiers,
            Node::Method(m) => &m.modifiers,
            Node::Constructor(c) => &c.modifiers,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Node::Type(t) => &t.annotations,
            Node::Field(f) => &f.annotations,
            Node::Method(m) => &m.annotations,
            Node::Constructor(c) => &c.annotations,
        }
    }

    pub fn as_type(&self) -> Option<&TypeNode> {
        match self {
            Node::Type(t) => Some(t),
            _ => None,
        }
    }
}

impl From<TypeNode> for Node {
    fn from(value: TypeNode) -> Self {
        Node::Type(value)
    }
}

impl From<FieldNode> for Node {
    fn from(value: FieldNode) -> Self {
        Node::Field(value)
    }
}

impl From<MethodNode> for Node {
    fn from(value: MethodNode) -> Self {
        Node::Method(value)
    }
}

impl From<ConstructorNode> for Node {
    fn from(value: ConstructorNode) -> Self {
        Node::Constructor(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_node_derives_id_and_names() {
        let t = TypeNode::new("com.example.Order", TypeForm::Class).unwrap();
        assert_eq!(t.id, NodeId::type_("com.example.Order"));
        assert_eq!(t.simple_name(), "Order");
        assert_eq!(t.package_name(), "com.example");
    }

    #[test]
    fn test_type_node_rejects_invalid_names() {
        assert!(TypeNode::new("", TypeForm::Class).is_err());
        assert!(TypeNode::new("com..Order", TypeForm::Class).is_err());
        assert!(TypeNode::new("com.example.Or der", TypeForm::Class).is_err());
    }

    #[test]
    fn test_method_overloads_get_distinct_ids() {
        let a = MethodNode::new("x.Repo", "find", TypeRef::void(), vec![]).unwrap();
        let b = MethodNode::new(
            "x.Repo",
            "find",
            TypeRef::void(),
            vec![Parameter::new("id", TypeRef::new("java.lang.String"))],
        )
        .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(b.id.as_str(), "method:x.Repo#find(java.lang.String)");
    }

    #[test]
    fn test_type_ref_wrappers() {
        let list = TypeRef::generic("java.util.List", vec![TypeRef::new("a.Item")]);
        assert!(list.is_collection_like());
        assert!(!list.is_optional_like());
        assert_eq!(list.signature(), "java.util.List<a.Item>");
        assert_eq!(list.all_referenced().len(), 2);

        let opt = TypeRef::generic("java.util.Optional", vec![TypeRef::new("a.Item")]);
        assert!(opt.is_optional_like());
        assert!(TypeRef::void().is_void());
        assert!(TypeRef::new("int").is_primitive());
    }

    #[test]
    fn test_annotation_matching_by_simple_or_qualified_name() {
        let t = TypeNode::new("x.Order", TypeForm::Class)
            .unwrap()
            .with_annotations([Annotation::new("org.jmolecules.ddd.annotation.AggregateRoot")]);
        assert!(t.has_annotation("AggregateRoot"));
        assert!(t.has_annotation("org.jmolecules.ddd.annotation.AggregateRoot"));
        assert!(!t.has_annotation("Entity"));
    }

    #[test]
    fn test_identity_field_detection() {
        let id = FieldNode::new("x.Order", "id", TypeRef::new("java.lang.String")).unwrap();
        let own_id = FieldNode::new("x.Order", "orderId", TypeRef::new("x.OrderId")).unwrap();
        let reference = FieldNode::new("x.Line", "orderId", TypeRef::new("x.OrderId")).unwrap();
        let name = FieldNode::new("x.Order", "name", TypeRef::new("java.lang.String")).unwrap();
        assert!(id.looks_like_identity());
        assert!(own_id.looks_like_identity());
        assert!(!reference.looks_like_identity());
        assert!(!name.looks_like_identity());
    }
}
