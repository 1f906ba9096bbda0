//! Risk item entity type (FMEA - Failure Mode and Effects Analysis, ANALYZE phase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::error::FieldViolation;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// Inclusive bounds of the severity, occurrence and detection ratings
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// Per-item classification of a risk priority number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RpnLabel {
    Low,
    Medium,
    High,
    Critical,
}

impl RpnLabel {
    /// CRITICAL > 300, HIGH > 150, MEDIUM > 80, else LOW
    pub fn from_rpn(rpn: u16) -> Self {
        match rpn {
            301.. => RpnLabel::Critical,
            151..=300 => RpnLabel::High,
            81..=150 => RpnLabel::Medium,
            _ => RpnLabel::Low,
        }
    }
}

impl std::fmt::Display for RpnLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpnLabel::Low => write!(f, "LOW"),
            RpnLabel::Medium => write!(f, "MEDIUM"),
            RpnLabel::High => write!(f, "HIGH"),
            RpnLabel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Project-wide risk level derived from the average RPN
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// A risk item (FMEA row)
///
/// The risk priority number is never stored on the item; it is always
/// derived from the three ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
    #[serde(default = "new_id")]
    pub id: EntityId,

    /// How the failure manifests (FMEA: Failure Mode)
    pub failure_mode: String,

    /// Impact or consequence (FMEA: Effect)
    #[serde(default)]
    pub effects: String,

    /// Root cause or mechanism (FMEA: Cause)
    #[serde(default)]
    pub causes: String,

    /// Severity rating 1-10 (FMEA: S)
    pub severity: i64,

    /// Occurrence/probability rating 1-10 (FMEA: O)
    pub occurrence: i64,

    /// Detection difficulty rating 1-10 (FMEA: D)
    pub detection: i64,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn new_id() -> EntityId {
    EntityId::new(EntityPrefix::Risk)
}

impl Entity for RiskItem {
    const PREFIX: EntityPrefix = EntityPrefix::Risk;
    const PHASE: Phase = Phase::Analyze;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.failure_mode
    }
}

impl RiskItem {
    pub fn new(
        failure_mode: impl Into<String>,
        severity: i64,
        occurrence: i64,
        detection: i64,
    ) -> Self {
        Self {
            id: new_id(),
            failure_mode: failure_mode.into(),
            effects: String::new(),
            causes: String::new(),
            severity,
            occurrence,
            detection,
            created: Utc::now(),
        }
    }

    /// Risk Priority Number = S x O x D
    ///
    /// Ratings are clamped to 0..=10 so an item that has not been validated
    /// still yields a number in 0..=1000.
    pub fn rpn(&self) -> u16 {
        let product = [self.severity, self.occurrence, self.detection]
            .iter()
            .map(|r| (*r).clamp(0, 10))
            .product::<i64>();
        u16::try_from(product).unwrap_or_default()
    }

    pub fn rpn_label(&self) -> RpnLabel {
        RpnLabel::from_rpn(self.rpn())
    }

    pub fn validate(&self, violations: &mut Vec<FieldViolation>) {
        for (field, value) in [
            ("severity", self.severity),
            ("occurrence", self.occurrence),
            ("detection", self.detection),
        ] {
            if !RATING_RANGE.contains(&value) {
                violations.push(FieldViolation::new(Some(&self.id), field, value, "1..=10"));
            }
        }
    }
}
