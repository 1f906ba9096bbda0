//! Project constraint entity type (DEFINE phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Level};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintCategory {
    #[default]
    Technical,
    Business,
    Regulatory,
    Resource,
}

impl std::fmt::Display for ConstraintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintCategory::Technical => write!(f, "technical"),
            ConstraintCategory::Business => write!(f, "business"),
            ConstraintCategory::Regulatory => write!(f, "regulatory"),
            ConstraintCategory::Resource => write!(f, "resource"),
        }
    }
}

impl std::str::FromStr for ConstraintCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technical" => Ok(ConstraintCategory::Technical),
            "business" => Ok(ConstraintCategory::Business),
            "regulatory" => Ok(ConstraintCategory::Regulatory),
            "resource" => Ok(ConstraintCategory::Resource),
            _ => Err(format!(
                "Invalid constraint category: {}. Use technical, business, regulatory, or resource",
                s
            )),
        }
    }
}

/// A limit the project must operate within
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default = "new_id")]
    pub id: EntityId,

    #[serde(default)]
    pub category: ConstraintCategory,

    pub description: String,

    #[serde(default)]
    pub impact: Level,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Con)
}

impl Entity for Constraint {
    const PREFIX: EntityPrefix = EntityPrefix::Con;
    const PHASE: Phase = Phase::Define;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.description
    }
}

impl Constraint {
    pub fn new(
        category: ConstraintCategory,
        description: impl Into<String>,
        impact: Level,
    ) -> Self {
        Self {
            id: new_id(),
            category,
            description: description.into(),
            impact,
            created: Utc::now(),
        }
    }
}
