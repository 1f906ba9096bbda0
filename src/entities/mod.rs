//! Artifact and project type definitions
//!
//! Each DMAIC phase owns a set of artifact kinds:
//!
//! - **DEFINE**: [`Requirement`], [`QualityTarget`] (CTQ), [`Constraint`]
//! - **MEASURE**: [`Kpi`]
//! - **ANALYZE**: [`RiskItem`] (FMEA)
//! - **IMPROVE**: [`Solution`]
//! - **CONTROL**: [`ControlChecklist`]
//!
//! [`Project`] is the record the workflow engine advances through the phases.

pub mod checklist;
pub mod constraint;
pub mod kpi;
pub mod project;
pub mod quality_target;
pub mod requirement;
pub mod risk;
pub mod solution;

pub use checklist::ControlChecklist;
pub use constraint::{Constraint, ConstraintCategory};
pub use kpi::Kpi;
pub use project::{NewProject, Project};
pub use quality_target::QualityTarget;
pub use requirement::{Requirement, RequirementCategory};
pub use risk::{RiskItem, RiskLevel, RpnLabel};
pub use solution::{Approach, Solution, SolutionStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::error::FieldViolation;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::phase::Phase;

/// Any artifact a caller can submit, tagged by `kind` in YAML/JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Requirement(Requirement),
    QualityTarget(QualityTarget),
    Constraint(Constraint),
    Kpi(Kpi),
    Risk(RiskItem),
    Solution(Solution),
    ControlChecklist(ControlChecklist),
}

impl Artifact {
    /// The phase that owns this artifact kind
    pub fn phase(&self) -> Phase {
        match self {
            Artifact::Requirement(_) => Requirement::PHASE,
            Artifact::QualityTarget(_) => QualityTarget::PHASE,
            Artifact::Constraint(_) => Constraint::PHASE,
            Artifact::Kpi(_) => Kpi::PHASE,
            Artifact::Risk(_) => RiskItem::PHASE,
            Artifact::Solution(_) => Solution::PHASE,
            Artifact::ControlChecklist(_) => ControlChecklist::PHASE,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Artifact::Requirement(a) => a.id(),
            Artifact::QualityTarget(a) => a.id(),
            Artifact::Constraint(a) => a.id(),
            Artifact::Kpi(a) => a.id(),
            Artifact::Risk(a) => a.id(),
            Artifact::Solution(a) => a.id(),
            Artifact::ControlChecklist(a) => a.id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Requirement(_) => "requirement",
            Artifact::QualityTarget(_) => "quality_target",
            Artifact::Constraint(_) => "constraint",
            Artifact::Kpi(_) => "kpi",
            Artifact::Risk(_) => "risk",
            Artifact::Solution(_) => "solution",
            Artifact::ControlChecklist(_) => "control_checklist",
        }
    }

    /// When the artifact was recorded (last update for the checklist)
    pub fn recorded(&self) -> DateTime<Utc> {
        match self {
            Artifact::Requirement(a) => a.created,
            Artifact::QualityTarget(a) => a.created,
            Artifact::Constraint(a) => a.created,
            Artifact::Kpi(a) => a.created,
            Artifact::Risk(a) => a.created,
            Artifact::Solution(a) => a.created,
            Artifact::ControlChecklist(a) => a.updated,
        }
    }

    /// Identifier prefix required for this artifact kind
    pub fn prefix(&self) -> EntityPrefix {
        match self {
            Artifact::Requirement(_) => Requirement::PREFIX,
            Artifact::QualityTarget(_) => QualityTarget::PREFIX,
            Artifact::Constraint(_) => Constraint::PREFIX,
            Artifact::Kpi(_) => Kpi::PREFIX,
            Artifact::Risk(_) => RiskItem::PREFIX,
            Artifact::Solution(_) => Solution::PREFIX,
            Artifact::ControlChecklist(_) => ControlChecklist::PREFIX,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Artifact::Requirement(a) => a.label(),
            Artifact::QualityTarget(a) => a.label(),
            Artifact::Constraint(a) => a.label(),
            Artifact::Kpi(a) => a.label(),
            Artifact::Risk(a) => a.label(),
            Artifact::Solution(a) => a.label(),
            Artifact::ControlChecklist(a) => a.label(),
        }
    }

    /// Collect every out-of-range field, including an id of the wrong kind
    pub fn validate(&self, violations: &mut Vec<FieldViolation>) {
        let id = self.id();
        if id.prefix() != self.prefix() {
            violations.push(FieldViolation::new(
                Some(id),
                "id",
                id,
                format!("{}-<ULID> for {}", self.prefix(), self.kind()),
            ));
        }
        match self {
            Artifact::QualityTarget(a) => a.validate(violations),
            Artifact::Kpi(a) => a.validate(violations),
            Artifact::Risk(a) => a.validate(violations),
            Artifact::Solution(a) => a.validate(violations),
            Artifact::Requirement(_) | Artifact::Constraint(_) | Artifact::ControlChecklist(_) => {}
        }
    }
}

/// Snapshot of every artifact stored for one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_targets: Vec<QualityTarget>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kpis: Vec<Kpi>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<RiskItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solutions: Vec<Solution>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<ControlChecklist>,
}

impl ArtifactSet {
    /// Add an artifact; a control checklist replaces any earlier one
    pub fn push(&mut self, artifact: Artifact) {
        match artifact {
            Artifact::Requirement(a) => self.requirements.push(a),
            Artifact::QualityTarget(a) => self.quality_targets.push(a),
            Artifact::Constraint(a) => self.constraints.push(a),
            Artifact::Kpi(a) => self.kpis.push(a),
            Artifact::Risk(a) => self.risks.push(a),
            Artifact::Solution(a) => self.solutions.push(a),
            Artifact::ControlChecklist(a) => self.checklist = Some(a),
        }
    }

    /// Number of stored artifacts owned by `phase`
    pub fn count_for(&self, phase: Phase) -> usize {
        match phase {
            Phase::Define => {
                self.requirements.len() + self.quality_targets.len() + self.constraints.len()
            }
            Phase::Measure => self.kpis.len(),
            Phase::Analyze => self.risks.len(),
            Phase::Improve => self.solutions.len(),
            Phase::Control => usize::from(self.checklist.is_some()),
            Phase::Completed => 0,
        }
    }

    pub fn len(&self) -> usize {
        Phase::working().iter().map(|p| self.count_for(*p)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if an artifact with `id` is stored. The control checklist is
    /// replaced on every submission and never counts as stored.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.requirements.iter().any(|a| &a.id == id)
            || self.quality_targets.iter().any(|a| &a.id == id)
            || self.constraints.iter().any(|a| &a.id == id)
            || self.kpis.iter().any(|a| &a.id == id)
            || self.risks.iter().any(|a| &a.id == id)
            || self.solutions.iter().any(|a| &a.id == id)
    }

    /// Every stored artifact in phase order, then insertion order per kind
    pub fn iter(&self) -> impl Iterator<Item = Artifact> + '_ {
        let define = self
            .requirements
            .iter()
            .cloned()
            .map(Artifact::Requirement)
            .chain(self.quality_targets.iter().cloned().map(Artifact::QualityTarget))
            .chain(self.constraints.iter().cloned().map(Artifact::Constraint));
        define
            .chain(self.kpis.iter().cloned().map(Artifact::Kpi))
            .chain(self.risks.iter().cloned().map(Artifact::Risk))
            .chain(self.solutions.iter().cloned().map(Artifact::Solution))
            .chain(self.checklist.iter().cloned().map(Artifact::ControlChecklist))
    }

    pub fn solution(&self, id: &EntityId) -> Option<&Solution> {
        self.solutions.iter().find(|s| &s.id == id)
    }
}

impl FromIterator<Artifact> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        let mut set = ArtifactSet::default();
        for artifact in iter {
            set.push(artifact);
        }
        set
    }
}
