//! Critical-to-quality (CTQ) target entity type (DEFINE phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::error::FieldViolation;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// A CTQ item: a customer need traced to a measurable characteristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityTarget {
    #[serde(default = "new_id")]
    pub id: EntityId,

    /// Voice-of-customer need
    pub need: String,

    /// Quality driver derived from the need
    #[serde(default)]
    pub driver: String,

    /// Measurable characteristic name (e.g., "p95 latency")
    pub characteristic: String,

    /// Target value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,

    /// Upper specification limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usl: Option<f64>,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Ctq)
}

impl Entity for QualityTarget {
    const PREFIX: EntityPrefix = EntityPrefix::Ctq;
    const PHASE: Phase = Phase::Define;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.characteristic
    }
}

impl QualityTarget {
    pub fn new(
        need: impl Into<String>,
        driver: impl Into<String>,
        characteristic: impl Into<String>,
        target: Option<f64>,
        usl: Option<f64>,
    ) -> Self {
        Self {
            id: new_id(),
            need: need.into(),
            driver: driver.into(),
            characteristic: characteristic.into(),
            target,
            usl,
            created: Utc::now(),
        }
    }

    /// Both the target and the upper specification limit are set
    pub fn has_limits(&self) -> bool {
        self.target.is_some() && self.usl.is_some()
    }

    pub fn validate(&self, violations: &mut Vec<FieldViolation>) {
        for (field, value) in [("target", self.target), ("usl", self.usl)] {
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
        if let (Some(target), Some(usl)) = (self.target, self.usl) {
            if usl < target {
                violations.push(FieldViolation::new(
                    Some(&self.id),
                    "usl",
                    usl,
                    format!(">= target ({})", target),
                ));
            }
        }
    }
}
