//! Multi-criteria classification: independent criteria vote, a decision
//! policy picks the winner and reports incompatible competitors.

pub mod kind;
pub mod criteria;
pub mod contribution;
pub mod policy;
pub mod profile;
pub mod engine;

pub use contribution::{Conflict, Contribution};
pub use criteria::{Criteria, Evidence, EvidenceKind, MatchResult};
pub use engine::CriteriaEngine;
pub use kind::{ClassificationKind, ConfidenceLevel, DomainKind, PortDirection, PortKind};
pub use policy::{CompatibilityPolicy, Decision, DecisionPolicy, DefaultDecisionPolicy, NoneCompatible};
pub use profile::CriteriaProfile;
