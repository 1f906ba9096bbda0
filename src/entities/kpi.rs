//! Key performance indicator entity type (MEASURE phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::error::FieldViolation;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// A measured indicator with a target and its current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    #[serde(default = "new_id")]
    pub id: EntityId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,

    /// Latest measured value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,

    #[serde(default)]
    pub unit: String,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Kpi)
}

impl Entity for Kpi {
    const PREFIX: EntityPrefix = EntityPrefix::Kpi;
    const PHASE: Phase = Phase::Measure;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl Kpi {
    pub fn new(
        name: impl Into<String>,
        target: Option<f64>,
        current: Option<f64>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: String::new(),
            target,
            current,
            unit: unit.into(),
            created: Utc::now(),
        }
    }

    /// Current value as a percentage of target
    pub fn performance(&self) -> Option<f64> {
        match (self.current, self.target) {
            (Some(current), Some(target)) if target != 0.0 => Some(current / target * 100.0),
            _ => None,
        }
    }

    pub fn validate(&self, violations: &mut Vec<FieldViolation>) {
        for (field, value) in [("target", self.target), ("current", self.current)] {
            if let Some(v) = value {
                if !v.is_finite() {
                    violations.push(FieldViolation::new(
                        Some(&self.id),
                        field,
                        v,
                        "a finite number",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance() {
        let kpi = Kpi::new("Throughput", Some(200.0), Some(150.0), "req/s");
        assert_eq!(kpi.performance(), Some(75.0));
    }

    #[test]
    fn test_performance_undefined_without_target() {
        assert_eq!(Kpi::new("Errors", None, Some(3.0), "").performance(), None);
        assert_eq!(Kpi::new("Errors", Some(0.0), Some(3.0), "").performance(), None);
        assert_eq!(Kpi::new("Errors", Some(5.0), None, "").performance(), None);
    }

    #[test]
    fn test_non_finite_values_are_violations() {
        let kpi = Kpi::new("Latency", Some(f64::NAN), Some(1.0), "ms");
        let mut violations = Vec::new();
        kpi.validate(&mut violations);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "target");
    }
}
