//! Candidate improvement solution entity type (IMPROVE phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::error::FieldViolation;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// Inclusive bounds of the impact/effort/risk/cost scores
pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 0..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Approach {
    #[default]
    Incremental,
    Redesign,
    Innovative,
}

impl std::fmt::Display for Approach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approach::Incremental => write!(f, "incremental"),
            Approach::Redesign => write!(f, "redesign"),
            Approach::Innovative => write!(f, "innovative"),
        }
    }
}

impl std::str::FromStr for Approach {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incremental" => Ok(Approach::Incremental),
            "redesign" => Ok(Approach::Redesign),
            "innovative" => Ok(Approach::Innovative),
            _ => Err(format!(
                "Invalid approach: {}. Use incremental, redesign, or innovative",
                s
            )),
        }
    }
}

/// Decision status, owned by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SolutionStatus {
    #[default]
    Proposed,
    Approved,
    Implemented,
}

impl SolutionStatus {
    /// Approved and implemented solutions satisfy the IMPROVE gate
    pub fn is_selected(self) -> bool {
        matches!(self, SolutionStatus::Approved | SolutionStatus::Implemented)
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Proposed => write!(f, "proposed"),
            SolutionStatus::Approved => write!(f, "approved"),
            SolutionStatus::Implemented => write!(f, "implemented"),
        }
    }
}

impl std::str::FromStr for SolutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proposed" => Ok(SolutionStatus::Proposed),
            "approved" => Ok(SolutionStatus::Approved),
            "implemented" => Ok(SolutionStatus::Implemented),
            _ => Err(format!(
                "Invalid solution status: {}. Use proposed, approved, or implemented",
                s
            )),
        }
    }
}

/// A candidate improvement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    #[serde(default = "new_id")]
    pub id: EntityId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub approach: Approach,

    /// Expected benefit, 0-10
    pub impact: i64,

    /// Implementation effort, 0-10
    pub effort: i64,

    /// Delivery risk, 0-10
    pub risk: i64,

    /// Relative cost, 0-10
    pub cost: i64,

    #[serde(default)]
    pub status: SolutionStatus,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Sol)
}

impl Entity for Solution {
    const PREFIX: EntityPrefix = EntityPrefix::Sol;
    const PHASE: Phase = Phase::Improve;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl Solution {
    pub fn new(title: impl Into<String>, impact: i64, effort: i64, risk: i64, cost: i64) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: String::new(),
            approach: Approach::default(),
            impact,
            effort,
            risk,
            cost,
            status: SolutionStatus::default(),
            created: Utc::now(),
        }
    }

    pub fn validate(&self, violations: &mut Vec<FieldViolation>) {
        for (field, value) in [
            ("impact", self.impact),
            ("effort", self.effort),
            ("risk", self.risk),
            ("cost", self.cost),
        ] {
            if !SCORE_RANGE.contains(&value) {
                violations.push(FieldViolation::new(Some(&self.id), field, value, "0..=10"));
            }
        }
    }
}
