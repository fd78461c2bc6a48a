use crate::domain::id::NodeId;
use thiserror::Error;

/// Malformed graph input. Always fatal: raised at build time, never tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Edge from unknown node: {0}")]
    UnknownSource(NodeId),

    #[error("Edge to unknown node: {0}")]
    UnknownTarget(NodeId),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Member {member} declared by unknown type {declaring_type}")]
    UnknownDeclaringType { member: NodeId, declaring_type: NodeId },

    #[error("DERIVED edges must have a proof ({from} -> {to})")]
    MissingProof { from: NodeId, to: NodeId },

    #[error("RAW edges should not have a proof ({from} -> {to})")]
    UnexpectedProof { from: NodeId, to: NodeId },

    #[error("Invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },
}

impl GraphError {
    pub(crate) fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        GraphError::Invalid {
            what,
            reason: reason.into(),
        }
    }
}

/// Invalid analysis configuration. Fatal at configuration time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("complexity threshold must be positive, got {0}")]
    NonPositiveComplexityThreshold(u32),

    #[error("{name} must be a percentage in 0..=100, got {value}")]
    PercentageOutOfRange { name: &'static str, value: u32 },

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("priority override key '{0}' is blank or contains whitespace")]
    InvalidPriorityKey(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
