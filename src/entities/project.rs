//! Project entity type - the record owned by the workflow engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::FieldViolation;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;
use crate::entities::risk::RiskLevel;

/// Parameters for creating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,

    #[serde(default)]
    pub business_case: String,

    /// Where the improved process will run (e.g., "production-eu")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_limit: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_days: Option<u32>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.name.trim().is_empty() {
            violations.push(FieldViolation::new(None, "name", "\"\"", "a non-empty name"));
        }
        if let Some(budget) = self.budget_limit {
            if !budget.is_finite() || budget < 0.0 {
                violations.push(FieldViolation::new(None, "budget_limit", budget, ">= 0"));
            }
        }
        if self.timeline_days == Some(0) {
            violations.push(FieldViolation::new(None, "timeline_days", 0, ">= 1"));
        }
        violations
    }
}

/// A DMAIC project
///
/// Phase, completion, quality score and risk level change only through the
/// workflow engine's advance and recompute operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,

    pub name: String,

    #[serde(default)]
    pub business_case: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_limit: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_days: Option<u32>,

    pub phase: Phase,

    /// Phase completion percentage, 0-100, never decreasing
    pub completion: u8,

    /// Composite quality score, 0-100
    pub quality_score: f64,

    pub risk_level: RiskLevel,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl Project {
    /// Create a project in DEFINE with zeroed metrics
    pub fn new(params: NewProject) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Prj),
            name: params.name,
            business_case: params.business_case,
            deployment_target: params.deployment_target,
            budget_limit: params.budget_limit,
            timeline_days: params.timeline_days,
            phase: Phase::Define,
            completion: 0,
            quality_score: 0.0,
            risk_level: RiskLevel::Low,
            created: now,
            updated: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase.is_terminal()
    }
}
