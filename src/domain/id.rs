use crate::domain::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag carried by every [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Type,
    Field,
    Method,
    Constructor,
}

impl NodeKind {
    fn prefix(self) -> &'static str {
        match self {
            NodeKind::Type => "type",
            NodeKind::Field => "field",
            NodeKind::Method => "method",
            NodeKind::Constructor => "ctor",
        }
    }
}

/// Stable, globally unique node identifier.
///
/// The textual form is `<kind>:<canonical path>`:
/// - `type:com.example.Order`
/// - `field:com.example.Order#id`
/// - `method:com.example.Order#total(java.lang.String,int)`
/// - `ctor:com.example.Order#<init>(java.lang.String)`
///
/// Equality and ordering are by string value, which keeps every ordered
/// collection keyed by `NodeId` deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl TryFrom<String> for NodeId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NodeId::parse(&value).ok_or_else(|| GraphError::invalid("node id", format!("'{value}'")))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl NodeId {
    pub fn type_(qualified_name: &str) -> Self {
        Self(format!("{}:{}", NodeKind::Type.prefix(), qualified_name))
    }

    pub fn field(declaring_type: &str, name: &str) -> Self {
        Self(format!("{}:{}#{}", NodeKind::Field.prefix(), declaring_type, name))
    }

    /// `params` is the comma-separated list of parameter type names.
    pub fn method(declaring_type: &str, name: &str, params: &str) -> Self {
        Self(format!(
            "{}:{}#{}({})",
            NodeKind::Method.prefix(),
            declaring_type,
            name,
            params
        ))
    }

    pub fn constructor(declaring_type: &str, params: &str) -> Self {
        Self(format!(
            "{}:{}#<init>({})",
            NodeKind::Constructor.prefix(),
            declaring_type,
            params
        ))
    }

    /// Parse an id from its textual form. Returns `None` for unknown prefixes.
    pub fn parse(value: &str) -> Option<Self> {
        let (prefix, rest) = value.split_once(':')?;
        if rest.is_empty() {
            return None;
        }
        match prefix {
            "type" | "field" | "method" | "ctor" => Some(Self(value.to_string())),
            _ => None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.0.split_once(':').map(|(prefix, _)| prefix) {
            Some("field") => NodeKind::Field,
            Some("method") => NodeKind::Method,
            Some("ctor") => NodeKind::Constructor,
            _ => NodeKind::Type,
        }
    }

    /// Qualified name of the type this id belongs to (the type itself for
    /// type ids, the declaring type for members).
    pub fn type_name(&self) -> &str {
        let path = self.path();
        match path.split_once('#') {
            Some((owner, _)) => owner,
            None => path,
        }
    }

    /// Canonical path without the kind tag.
    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, rest)| rest).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
