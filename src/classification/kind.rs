use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// A classification vocabulary the engine can decide over.
pub trait ClassificationKind:
    Copy + Eq + Ord + Hash + Debug + Display + Serialize + Send + Sync + 'static
{
}

impl<T> ClassificationKind for T where
    T: Copy + Eq + Ord + Hash + Debug + Display + Serialize + Send + Sync + 'static
{
}

/// How sure a criteria is about its match. Ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    /// Declared in source, e.g. through an annotation
    Explicit,
}

impl ConfidenceLevel {
    pub fn weight(self) -> u8 {
        match self {
            ConfidenceLevel::Low => 1,
            ConfidenceLevel::Medium => 2,
            ConfidenceLevel::High => 3,
            ConfidenceLevel::Explicit => 4,
        }
    }

    pub fn percentage(self) -> u8 {
        self.weight() * 25
    }

    /// Highest level whose percentage does not exceed `pct`; `None` below 25.
    pub fn from_percentage(pct: u8) -> Option<Self> {
        match pct {
            100.. => Some(ConfidenceLevel::Explicit),
            75..=99 => Some(ConfidenceLevel::High),
            50..=74 => Some(ConfidenceLevel::Medium),
            25..=49 => Some(ConfidenceLevel::Low),
            _ => None,
        }
    }
}

impl Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Explicit => "EXPLICIT",
        };
        f.write_str(s)
    }
}

/// Domain-driven design roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainKind {
    AggregateRoot,
    Entity,
    ValueObject,
    Identifier,
    DomainEvent,
    DomainService,
    ApplicationService,
}

impl Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DomainKind::AggregateRoot => "AGGREGATE_ROOT",
            DomainKind::Entity => "ENTITY",
            DomainKind::ValueObject => "VALUE_OBJECT",
            DomainKind::Identifier => "IDENTIFIER",
            DomainKind::DomainEvent => "DOMAIN_EVENT",
            DomainKind::DomainService => "DOMAIN_SERVICE",
            DomainKind::ApplicationService => "APPLICATION_SERVICE",
        };
        f.write_str(s)
    }
}

/// Which side of the hexagon a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortDirection {
    /// Called by the outside world (primary)
    Driving,
    /// Calls out to infrastructure (secondary)
    Driven,
}

/// Hexagonal port roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortKind {
    Repository,
    UseCase,
    Gateway,
    EventPublisher,
}

impl PortKind {
    pub fn direction(self) -> PortDirection {
        match self {
            PortKind::UseCase => PortDirection::Driving,
            PortKind::Repository | PortKind::Gateway | PortKind::EventPublisher => {
                PortDirection::Driven
            }
        }
    }
}

impl Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortKind::Repository => "REPOSITORY",
            PortKind::UseCase => "USE_CASE",
            PortKind::Gateway => "GATEWAY",
            PortKind::EventPublisher => "EVENT_PUBLISHER",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering_and_weights() {
        assert!(ConfidenceLevel::Explicit > ConfidenceLevel::High);
        assert!(ConfidenceLevel::High > ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium > ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Low.weight(), 1);
        assert_eq!(ConfidenceLevel::Explicit.weight(), 4);
    }

    #[test]
    fn test_confidence_from_percentage() {
        assert_eq!(ConfidenceLevel::from_percentage(10), None);
        assert_eq!(ConfidenceLevel::from_percentage(50), Some(ConfidenceLevel::Medium));
        assert_eq!(ConfidenceLevel::from_percentage(80), Some(ConfidenceLevel::High));
        assert_eq!(ConfidenceLevel::from_percentage(100), Some(ConfidenceLevel::Explicit));
    }

    #[test]
    fn test_port_direction() {
        assert_eq!(PortKind::UseCase.direction(), PortDirection::Driving);
        assert_eq!(PortKind::Repository.direction(), PortDirection::Driven);
        assert_eq!(PortKind::Gateway.direction(), PortDirection::Driven);
    }

    #[test]
    fn test_display_matches_serde_names() {
        assert_eq!(DomainKind::AggregateRoot.to_string(), "AGGREGATE_ROOT");
        assert_eq!(
            serde_json::to_string(&DomainKind::AggregateRoot).unwrap(),
            "\"AGGREGATE_ROOT\""
        );
        assert_eq!(PortKind::UseCase.to_string(), "USE_CASE");
    }
}
