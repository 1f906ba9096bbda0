//! Requirement entity type (DEFINE phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Level};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// Requirement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    #[default]
    Functional,
    NonFunctional,
}

impl std::fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequirementCategory::Functional => write!(f, "functional"),
            RequirementCategory::NonFunctional => write!(f, "non_functional"),
        }
    }
}

impl std::str::FromStr for RequirementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "functional" => Ok(RequirementCategory::Functional),
            "non_functional" | "nonfunctional" => Ok(RequirementCategory::NonFunctional),
            _ => Err(format!(
                "Invalid requirement category: {}. Use functional or non_functional",
                s
            )),
        }
    }
}

/// A project requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Unique identifier
    #[serde(default = "new_id")]
    pub id: EntityId,

    /// Full requirement text
    pub text: String,

    #[serde(default)]
    pub category: RequirementCategory,

    #[serde(default)]
    pub priority: Level,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Req)
}

impl Entity for Requirement {
    const PREFIX: EntityPrefix = EntityPrefix::Req;
    const PHASE: Phase = Phase::Define;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.text
    }
}

impl Requirement {
    /// Create a new requirement with the given parameters
    pub fn new(text: impl Into<String>, category: RequirementCategory, priority: Level) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            category,
            priority,
            created: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_defaults_from_yaml() {
        let req: Requirement =
            serde_yml::from_str("text: The API shall respond in 200ms\n").unwrap();
        assert!(req.id.to_string().starts_with("REQ-"));
        assert_eq!(req.category, RequirementCategory::Functional);
        assert_eq!(req.priority, Level::Medium);
    }

    #[test]
    fn test_requirement_serializes_category() {
        let req = Requirement::new("Uptime", RequirementCategory::NonFunctional, Level::High);
        let yaml = serde_yml::to_string(&req).unwrap();
        assert!(yaml.contains("category: non_functional"));
        assert!(yaml.contains("priority: high"));
    }
}
