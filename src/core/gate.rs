//! Phase gate evaluation
//!
//! Every working phase owns an ordered list of named completeness criteria
//! evaluated against the artifacts of that phase only. A [`GatePolicy`]
//! turns the criteria into a verdict.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::phase::Phase;
use crate::entities::ArtifactSet;

/// Minimum number of KPIs for the MEASURE gate
pub const MIN_KPIS: usize = 3;

/// Minimum number of risk items for the ANALYZE gate
pub const MIN_RISK_ITEMS: usize = 2;

/// Default pass fraction of the weighted policy
pub const DEFAULT_WEIGHTED_THRESHOLD: f64 = 0.8;

/// Outcome of a single named criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub name: String,
    pub met: bool,
    /// Guidance shown when the criterion is not met
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl CriterionOutcome {
    fn check(name: &str, met: bool, recommendation: impl FnOnce() -> String) -> Self {
        Self {
            name: name.to_string(),
            met,
            recommendation: (!met).then(recommendation),
        }
    }
}

/// Verdict for one phase gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub phase: Phase,
    pub passed: bool,
    /// Criteria in evaluation order
    pub criteria: Vec<CriterionOutcome>,
    /// Names of unmet criteria
    pub missing: Vec<String>,
    /// One entry per missing criterion
    pub recommendations: Vec<String>,
}

impl GateResult {
    fn from_criteria(phase: Phase, passed: bool, criteria: Vec<CriterionOutcome>) -> Self {
        let missing = criteria
            .iter()
            .filter(|c| !c.met)
            .map(|c| c.name.clone())
            .collect();
        let recommendations = criteria
            .iter()
            .filter_map(|c| c.recommendation.clone())
            .collect();
        Self {
            phase,
            passed,
            criteria,
            missing,
            recommendations,
        }
    }

    /// Criterion name to outcome
    pub fn as_map(&self) -> BTreeMap<&str, bool> {
        self.criteria
            .iter()
            .map(|c| (c.name.as_str(), c.met))
            .collect()
    }

    pub fn criterion(&self, name: &str) -> Option<bool> {
        self.criteria.iter().find(|c| c.name == name).map(|c| c.met)
    }

    pub fn met_count(&self) -> usize {
        self.criteria.iter().filter(|c| c.met).count()
    }
}

/// How criteria outcomes combine into a verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum GatePolicy {
    /// Every criterion must hold
    #[default]
    Strict,
    /// The fraction of met criteria must reach `threshold` (0.0-1.0)
    Weighted { threshold: f64 },
}

impl GatePolicy {
    pub fn weighted() -> Self {
        GatePolicy::Weighted {
            threshold: DEFAULT_WEIGHTED_THRESHOLD,
        }
    }

    /// Evaluate the gate of `phase` over the project's artifacts
    pub fn evaluate(&self, phase: Phase, artifacts: &ArtifactSet) -> GateResult {
        let criteria = criteria_for(phase, artifacts);
        let met = criteria.iter().filter(|c| c.met).count();
        let passed = self.passes(met, criteria.len());
        GateResult::from_criteria(phase, passed, criteria)
    }

    fn passes(&self, met: usize, total: usize) -> bool {
        if total == 0 {
            return true;
        }
        match self {
            GatePolicy::Strict => met == total,
            GatePolicy::Weighted { threshold } => met as f64 / total as f64 >= *threshold,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GatePolicy::Strict => "strict",
            GatePolicy::Weighted { .. } => "weighted",
        }
    }
}

/// Evaluate the named criteria of `phase`. COMPLETED has none.
pub fn criteria_for(phase: Phase, artifacts: &ArtifactSet) -> Vec<CriterionOutcome> {
    match phase {
        Phase::Define => {
            let with_limits = artifacts
                .quality_targets
                .iter()
                .filter(|q| q.has_limits())
                .count();
            vec![
                CriterionOutcome::check("requirements", !artifacts.requirements.is_empty(), || {
                    "Record at least one requirement the improved process must meet".to_string()
                }),
                CriterionOutcome::check("quality_targets", with_limits >= 1, || {
                    format!(
                        "Add a CTQ item with both a target and an upper specification limit ({} of {} complete)",
                        with_limits,
                        artifacts.quality_targets.len()
                    )
                }),
                CriterionOutcome::check("constraints", !artifacts.constraints.is_empty(), || {
                    "Document at least one project constraint".to_string()
                }),
            ]
        }
        Phase::Measure => {
            let total = artifacts.kpis.len();
            let with_target = artifacts.kpis.iter().filter(|k| k.target.is_some()).count();
            let met = total >= MIN_KPIS && with_target == total;
            vec![CriterionOutcome::check("kpis", met, || {
                if total < MIN_KPIS {
                    format!("Track at least {} KPIs ({} recorded)", MIN_KPIS, total)
                } else {
                    format!("Set a target on every KPI ({} missing)", total - with_target)
                }
            })]
        }
        Phase::Analyze => {
            let total = artifacts.risks.len();
            vec![CriterionOutcome::check("risk_items", total >= MIN_RISK_ITEMS, || {
                format!(
                    "Identify at least {} failure modes in the FMEA ({} recorded)",
                    MIN_RISK_ITEMS, total
                )
            })]
        }
        Phase::Improve => {
            let selected = artifacts.solutions.iter().any(|s| s.status.is_selected());
            vec![CriterionOutcome::check("approved_solution", selected, || {
                if artifacts.solutions.is_empty() {
                    "Propose candidate solutions and approve at least one".to_string()
                } else {
                    "Approve or implement at least one candidate solution".to_string()
                }
            })]
        }
        Phase::Control => {
            let checklist = artifacts.checklist.clone().unwrap_or_default();
            checklist
                .flags()
                .into_iter()
                .map(|(name, set)| CriterionOutcome::check(name, set, || checklist_hint(name)))
                .collect()
        }
        Phase::Completed => Vec::new(),
    }
}

fn checklist_hint(flag: &str) -> String {
    match flag {
        "monitoring" => "Put ongoing monitoring of the improved process in place",
        "documentation" => "Update the process documentation",
        "validation" => "Validate results against the CTQ targets",
        _ => "Train the process owners on the new procedure",
    }
    .to_string()
}

/// Criteria met and total for every phase from DEFINE up to `current`
/// (all five once the project is completed)
pub fn criteria_progress(current: Phase, artifacts: &ArtifactSet) -> (usize, usize) {
    Phase::working()
        .iter()
        .filter(|p| **p <= current)
        .flat_map(|p| criteria_for(*p, artifacts))
        .fold((0, 0), |(met, total), c| (met + usize::from(c.met), total + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Level;
    use crate::entities::{
        Artifact, Constraint, ConstraintCategory, ControlChecklist, Kpi, QualityTarget,
        Requirement, RequirementCategory, RiskItem, Solution, SolutionStatus,
    };

    fn define_artifacts() -> ArtifactSet {
        let mut set = ArtifactSet::default();
        for text in ["Checkout < 2s", "Cart persists", "Receipts emailed"] {
            set.push(Artifact::Requirement(Requirement::new(
                text,
                RequirementCategory::Functional,
                Level::High,
            )));
        }
        for name in ["p95 ms", "error %"] {
            set.push(Artifact::QualityTarget(QualityTarget::new(
                "Fast checkout",
                "Latency",
                name,
                Some(1.0),
                Some(2.0),
            )));
        }
        set.push(Artifact::Constraint(Constraint::new(
            ConstraintCategory::Business,
            "No downtime during sales",
            Level::High,
        )));
        set
    }

    #[test]
    fn test_define_gate_passes_with_complete_artifacts() {
        let result = GatePolicy::Strict.evaluate(Phase::Define, &define_artifacts());
        assert!(result.passed);
        assert!(result.missing.is_empty());
        assert!(result.recommendations.is_empty());
        assert_eq!(result.met_count(), 3);
    }

    #[test]
    fn test_define_gate_requires_ctq_limits() {
        let mut set = define_artifacts();
        for ctq in &mut set.quality_targets {
            ctq.usl = None;
        }
        let result = GatePolicy::Strict.evaluate(Phase::Define, &set);
        assert!(!result.passed);
        assert_eq!(result.missing, vec!["quality_targets"]);
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("0 of 2"));
    }

    #[test]
    fn test_criteria_keep_declared_order() {
        let result = GatePolicy::Strict.evaluate(Phase::Define, &ArtifactSet::default());
        let names: Vec<_> = result.criteria.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["requirements", "quality_targets", "constraints"]);
        assert_eq!(result.missing, names);
    }

    #[test]
    fn test_measure_gate_requires_three_targeted_kpis() {
        let mut set = ArtifactSet::default();
        set.kpis.push(Kpi::new("Latency", Some(200.0), Some(250.0), "ms"));
        set.kpis.push(Kpi::new("Errors", Some(1.0), Some(0.5), "%"));
        assert!(!GatePolicy::Strict.evaluate(Phase::Measure, &set).passed);

        set.kpis.push(Kpi::new("Throughput", None, Some(90.0), "rps"));
        let result = GatePolicy::Strict.evaluate(Phase::Measure, &set);
        assert!(!result.passed);
        assert!(result.recommendations[0].contains("1 missing"));

        set.kpis[2].target = Some(100.0);
        assert!(GatePolicy::Strict.evaluate(Phase::Measure, &set).passed);
    }

    #[test]
    fn test_analyze_gate_requires_two_risks() {
        let mut set = ArtifactSet::default();
        set.risks.push(RiskItem::new("Pool exhaustion", 9, 6, 7));
        assert_eq!(
            GatePolicy::Strict.evaluate(Phase::Analyze, &set).missing,
            vec!["risk_items"]
        );
        set.risks.push(RiskItem::new("Cache stampede", 5, 4, 3));
        assert!(GatePolicy::Strict.evaluate(Phase::Analyze, &set).passed);
    }

    #[test]
    fn test_improve_gate_requires_selected_solution() {
        let mut set = ArtifactSet::default();
        set.solutions.push(Solution::new("Read replica", 8, 4, 3, 3));
        assert!(!GatePolicy::Strict.evaluate(Phase::Improve, &set).passed);

        set.solutions[0].status = SolutionStatus::Implemented;
        assert!(GatePolicy::Strict.evaluate(Phase::Improve, &set).passed);
    }

    #[test]
    fn test_control_gate_reports_missing_flag() {
        let mut set = ArtifactSet::default();
        set.checklist = Some(ControlChecklist {
            monitoring: true,
            documentation: true,
            validation: true,
            training: false,
            ..ControlChecklist::default()
        });
        let result = GatePolicy::Strict.evaluate(Phase::Control, &set);
        assert!(!result.passed);
        assert_eq!(result.missing, vec!["training"]);
        assert_eq!(result.criterion("monitoring"), Some(true));
        assert_eq!(result.as_map().len(), 4);
    }

    #[test]
    fn test_control_gate_without_checklist_misses_everything() {
        let result = GatePolicy::Strict.evaluate(Phase::Control, &ArtifactSet::default());
        assert_eq!(result.missing.len(), 4);
    }

    #[test]
    fn test_weighted_policy_accepts_partial_checklist() {
        let mut set = ArtifactSet::default();
        set.checklist = Some(ControlChecklist {
            monitoring: true,
            documentation: true,
            validation: true,
            training: false,
            ..ControlChecklist::default()
        });
        // 3 of 4 = 0.75 < 0.8
        assert!(!GatePolicy::weighted().evaluate(Phase::Control, &set).passed);

        let lenient = GatePolicy::Weighted { threshold: 0.75 };
        let result = lenient.evaluate(Phase::Control, &set);
        assert!(result.passed);
        // Missing criteria are still reported
        assert_eq!(result.missing, vec!["training"]);
    }

    #[test]
    fn test_completed_gate_is_trivially_passed() {
        let result = GatePolicy::Strict.evaluate(Phase::Completed, &ArtifactSet::default());
        assert!(result.passed);
        assert!(result.criteria.is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let set = define_artifacts();
        let first = GatePolicy::Strict.evaluate(Phase::Define, &set);
        let second = GatePolicy::Strict.evaluate(Phase::Define, &set);
        assert_eq!(first, second);
    }

    #[test]
    fn test_criteria_progress_counts_phases_so_far() {
        let set = define_artifacts();
        assert_eq!(criteria_progress(Phase::Define, &set), (3, 3));
        assert_eq!(criteria_progress(Phase::Measure, &set), (3, 4));
        // 3 + 1 + 1 + 1 + 4 criteria in total
        assert_eq!(criteria_progress(Phase::Completed, &set), (3, 10));
    }
}
