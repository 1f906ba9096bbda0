//! Control checklist entity type (CONTROL phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// Sustainment checklist for the CONTROL phase. A project holds at most
/// one; a newer submission replaces the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlChecklist {
    #[serde(default = "new_id")]
    pub id: EntityId,

    /// Ongoing monitoring is in place
    #[serde(default)]
    pub monitoring: bool,

    /// Process documentation is updated
    #[serde(default)]
    pub documentation: bool,

    /// Results are validated against the CTQ targets
    #[serde(default)]
    pub validation: bool,

    /// Process owners are trained
    #[serde(default)]
    pub training: bool,

    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Chk)
}

impl Default for ControlChecklist {
    fn default() -> Self {
        Self {
            id: new_id(),
            monitoring: false,
            documentation: false,
            validation: false,
            training: false,
            updated: Utc::now(),
        }
    }
}

impl Entity for ControlChecklist {
    const PREFIX: EntityPrefix = EntityPrefix::Chk;
    const PHASE: Phase = Phase::Control;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        "control checklist"
    }
}

impl ControlChecklist {
    /// Flags in gate order
    pub fn flags(&self) -> [(&'static str, bool); 4] {
        [
            ("monitoring", self.monitoring),
            ("documentation", self.documentation),
            ("validation", self.validation),
            ("training", self.training),
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.flags().iter().all(|(_, set)| *set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_order() {
        let names: Vec<_> = ControlChecklist::default()
            .flags()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names, vec!["monitoring", "documentation", "validation", "training"]);
    }

    #[test]
    fn test_missing_flags_default_to_false() {
        let chk: ControlChecklist =
            serde_yml::from_str("monitoring: true\ndocumentation: true\n").unwrap();
        assert!(!chk.is_complete());
        assert!(!chk.training);
    }
}
