use crate::domain::error::GraphError;
use crate::domain::id::NodeId;
use serde::{Deserialize, Serialize};

/// Edge kind - structural relationship between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    // ============ Ownership ============
    Declares, // Type → Member

    // ============ Type Hierarchy ============
    Extends,
    Implements,

    // ============ Signature Types ============
    FieldType,     // Field → Type
    ReturnType,    // Method → Type
    ParameterType, // Method/Constructor → Type
    TypeArgument,  // Generic use → argument Type

    // ============ Generic Dependency ============
    References,

    // ============ Derived ============
    /// Interface → type appearing in one of its method signatures
    UsesInSignature,
    /// Owner → element type of a collection-like or optional-like field
    UsesAsCollectionElement,
}

impl EdgeKind {
    /// Kinds that express a type-level dependency for cycle audits.
    pub fn is_dependency(self) -> bool {
        !matches!(self, EdgeKind::Declares)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    /// Lifted directly from source structure
    Raw,
    /// Computed from other facts; always carries an [`EdgeProof`]
    Derived,
}

/// Traceability record for a derived edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeProof {
    pub source_node: NodeId,
    pub via: String,
    pub derivation_rule: String,
}

impl EdgeProof {
    pub const RULE_SIGNATURE_USAGE: &'static str = "signature-usage";
    pub const RULE_COLLECTION_UNWRAP: &'static str = "collection-unwrap";
    pub const RULE_OPTIONAL_UNWRAP: &'static str = "optional-unwrap";

    pub fn new(
        source_node: NodeId,
        via: impl Into<String>,
        derivation_rule: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let via = via.into();
        let derivation_rule = derivation_rule.into();
        if via.trim().is_empty() {
            return Err(GraphError::invalid("edge proof", "via must not be blank"));
        }
        if derivation_rule.trim().is_empty() {
            return Err(GraphError::invalid(
                "edge proof",
                "derivation rule must not be blank",
            ));
        }
        Ok(Self {
            source_node,
            via,
            derivation_rule,
        })
    }

    /// Proof for a type used in a method signature, `via` being `return` or `param:<i>`.
    pub fn signature_usage(method: NodeId, via: impl Into<String>) -> Self {
        Self {
            source_node: method,
            via: via.into(),
            derivation_rule: Self::RULE_SIGNATURE_USAGE.to_string(),
        }
    }

    pub fn field_unwrap(field: NodeId, rule: &'static str) -> Self {
        Self {
            source_node: field,
            via: "field".to_string(),
            derivation_rule: rule.to_string(),
        }
    }
}

/// Directed relationship between two nodes.
///
/// Fields are private so the origin/proof pairing can only be established
/// through the validating constructors, deserialization included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EdgeRepr")]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    kind: EdgeKind,
    origin: EdgeOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proof: Option<EdgeProof>,
}

/// Unchecked wire form of [`Edge`]
#[derive(Deserialize)]
struct EdgeRepr {
    from: NodeId,
    to: NodeId,
    kind: EdgeKind,
    origin: EdgeOrigin,
    #[serde(default)]
    proof: Option<EdgeProof>,
}

impl TryFrom<EdgeRepr> for Edge {
    type Error = GraphError;

    fn try_from(repr: EdgeRepr) -> Result<Self, Self::Error> {
        Edge::new(repr.from, repr.to, repr.kind, repr.origin, repr.proof)
    }
}

impl Edge {
    pub fn new(
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        origin: EdgeOrigin,
        proof: Option<EdgeProof>,
    ) -> Result<Self, GraphError> {
        let edge = Self {
            from,
            to,
            kind,
            origin,
            proof,
        };
        edge.validate()?;
        Ok(edge)
    }

    /// DERIVED edges carry a proof, RAW edges never do.
    pub fn validate(&self) -> Result<(), GraphError> {
        match (self.origin, &self.proof) {
            (EdgeOrigin::Derived, None) => Err(GraphError::MissingProof {
                from: self.from.clone(),
                to: self.to.clone(),
            }),
            (EdgeOrigin::Raw, Some(_)) => Err(GraphError::UnexpectedProof {
                from: self.from.clone(),
                to: self.to.clone(),
            }),
            _ => Ok(()),
        }
    }

    pub fn raw(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            origin: EdgeOrigin::Raw,
            proof: None,
        }
    }

    pub fn derived(from: NodeId, to: NodeId, kind: EdgeKind, proof: EdgeProof) -> Self {
        Self {
            from,
            to,
            kind,
            origin: EdgeOrigin::Derived,
            proof: Some(proof),
        }
    }

    pub fn from(&self) -> &NodeId {
        &self.from
    }

    pub fn to(&self) -> &NodeId {
        &self.to
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn origin(&self) -> EdgeOrigin {
        self.origin
    }

    pub fn proof(&self) -> Option<&EdgeProof> {
        self.proof.as_ref()
    }

    pub fn is_raw(&self) -> bool {
        self.origin == EdgeOrigin::Raw
    }

    pub fn is_derived(&self) -> bool {
        self.origin == EdgeOrigin::Derived
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Identity used for duplicate suppression; the proof is not part of it.
    pub(crate) fn identity(&self) -> (&NodeId, &NodeId, EdgeKind, EdgeOrigin) {
        (&self.from, &self.to, self.kind, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> NodeId {
        NodeId::type_("x.A")
    }

    fn b() -> NodeId {
        NodeId::type_("x.B")
    }

    #[test]
    fn test_derived_edge_requires_proof() {
        let err = Edge::new(a(), b(), EdgeKind::UsesInSignature, EdgeOrigin::Derived, None)
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingProof { .. }));
        assert!(err.to_string().contains("DERIVED edges must have a proof"));
    }

    #[test]
    fn test_raw_edge_rejects_proof() {
        let proof = EdgeProof::signature_usage(NodeId::method("x.A", "f", ""), "return");
        let err = Edge::new(a(), b(), EdgeKind::References, EdgeOrigin::Raw, Some(proof))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnexpectedProof { .. }));
    }

    #[test]
    fn test_valid_edges() {
        let raw = Edge::new(a(), b(), EdgeKind::Extends, EdgeOrigin::Raw, None).unwrap();
        assert!(raw.is_raw());
        assert!(raw.proof().is_none());

        let proof = EdgeProof::new(NodeId::method("x.A", "f", ""), "param:0", "signature-usage")
            .unwrap();
        let derived = Edge::new(
            a(),
            b(),
            EdgeKind::UsesInSignature,
            EdgeOrigin::Derived,
            Some(proof.clone()),
        )
        .unwrap();
        assert!(derived.is_derived());
        assert_eq!(derived.proof(), Some(&proof));
    }

    #[test]
    fn test_proof_rejects_blank_fields() {
        assert!(EdgeProof::new(a(), " ", "rule").is_err());
        assert!(EdgeProof::new(a(), "return", "").is_err());
    }

    #[test]
    fn test_deserialization_enforces_proof_pairing() {
        let unproven = r#"{"from":"type:x.A","to":"type:x.B","kind":"uses_in_signature","origin":"derived"}"#;
        let err = serde_json::from_str::<Edge>(unproven).unwrap_err();
        assert!(err.to_string().contains("DERIVED edges must have a proof"));

        let proven_raw = r#"{"from":"type:x.A","to":"type:x.B","kind":"references","origin":"raw",
            "proof":{"source_node":"method:x.A#f()","via":"return","derivation_rule":"signature-usage"}}"#;
        assert!(serde_json::from_str::<Edge>(proven_raw).is_err());

        let derived = Edge::derived(
            a(),
            b(),
            EdgeKind::UsesInSignature,
            EdgeProof::signature_usage(NodeId::method("x.A", "f", ""), "return"),
        );
        let json = serde_json::to_string(&derived).unwrap();
        assert_eq!(serde_json::from_str::<Edge>(&json).unwrap(), derived);
    }
}
