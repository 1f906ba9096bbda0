//! Entity trait - common interface for all artifact types

use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// Common trait for all phase artifacts
pub trait Entity: Serialize + DeserializeOwned {
    /// The identifier prefix (e.g., REQ, RISK)
    const PREFIX: EntityPrefix;

    /// The phase during which this artifact is created
    const PHASE: Phase;

    /// Get the artifact's unique ID
    fn id(&self) -> &EntityId;

    /// Short human-readable label for list output
    fn label(&self) -> &str;
}

/// Three-step rating used for requirement priority and constraint impact
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::Medium => write!(f, "medium"),
            Level::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            _ => Err(format!("Unknown level: {}", s)),
        }
    }
}
