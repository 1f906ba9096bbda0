//! Quality and risk metrics derived from a project's artifacts
//!
//! Everything here is a pure function of the artifact snapshot; nothing is
//! cached between calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::gate::criteria_progress;
use crate::core::phase::Phase;
use crate::entities::{ArtifactSet, Kpi, RiskItem, RiskLevel, RpnLabel};

/// A KPI counts as a defect when below this fraction of its target
pub const DEFECT_THRESHOLD: f64 = 0.9;

/// Upper DPMO bound for each sigma level, best first
const SIGMA_BREAKPOINTS: [(f64, u8); 5] = [
    (233.0, 6),
    (6_210.0, 5),
    (66_800.0, 4),
    (308_000.0, 3),
    (690_000.0, 2),
];

/// Composite score weights
const COMPLETION_WEIGHT: f64 = 0.4;
const CRITERIA_WEIGHT: f64 = 0.3;
const RISK_WEIGHT: f64 = 0.3;

/// Process capability derived from KPI performance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessCapability {
    pub defect_rate: f64,
    /// Defects per million opportunities
    pub dpmo: f64,
    pub sigma_level: u8,
    pub cp: f64,
    pub cpk: f64,
}

/// RPN statistics over all risk items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rpn: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rpn: Option<u16>,
    pub by_label: BTreeMap<RpnLabel, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiPerformance {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    pub defect: bool,
}

/// Full metrics view of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub risk_level: RiskLevel,
    pub quality_score: f64,
    pub criteria_met: usize,
    pub criteria_total: usize,
    pub risks: RiskSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<ProcessCapability>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub kpis: Vec<KpiPerformance>,
}

pub fn average_rpn(risks: &[RiskItem]) -> Option<f64> {
    if risks.is_empty() {
        return None;
    }
    let total: u32 = risks.iter().map(|r| u32::from(r.rpn())).sum();
    Some(f64::from(total) / risks.len() as f64)
}

/// Average RPN above 300 is HIGH, above 150 MEDIUM, otherwise LOW.
/// No risk items at all is LOW.
pub fn project_risk_level(risks: &[RiskItem]) -> RiskLevel {
    match average_rpn(risks) {
        Some(avg) if avg > 300.0 => RiskLevel::High,
        Some(avg) if avg > 150.0 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

pub fn risk_summary(risks: &[RiskItem]) -> RiskSummary {
    let mut by_label = BTreeMap::new();
    for risk in risks {
        *by_label.entry(risk.rpn_label()).or_insert(0) += 1;
    }
    RiskSummary {
        count: risks.len(),
        average_rpn: average_rpn(risks),
        max_rpn: risks.iter().map(RiskItem::rpn).max(),
        by_label,
    }
}

fn is_defect(kpi: &Kpi) -> bool {
    match (kpi.target, kpi.current) {
        (Some(target), Some(current)) => current < DEFECT_THRESHOLD * target,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

pub fn sigma_level(dpmo: f64) -> u8 {
    SIGMA_BREAKPOINTS
        .iter()
        .find(|(bound, _)| dpmo <= *bound)
        .map(|(_, sigma)| *sigma)
        .unwrap_or(1)
}

/// Capability indices from KPI performance; `None` without KPIs
pub fn process_capability(kpis: &[Kpi]) -> Option<ProcessCapability> {
    if kpis.is_empty() {
        return None;
    }
    let defects = kpis.iter().filter(|k| is_defect(k)).count();
    let defect_rate = defects as f64 / kpis.len() as f64;
    let dpmo = defect_rate * 1_000_000.0;
    let cp = (1.33 - 2.0 * defect_rate).max(0.5);
    Some(ProcessCapability {
        defect_rate,
        dpmo,
        sigma_level: sigma_level(dpmo),
        cp,
        cpk: 0.9 * cp,
    })
}

fn risk_contribution(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 30.0,
        RiskLevel::Medium => 20.0,
        RiskLevel::High => 10.0,
    }
}

/// Composite 0-100 score from completion, gate progress and risk
pub fn quality_score(
    completion: u8,
    criteria_met: usize,
    criteria_total: usize,
    risk: RiskLevel,
) -> f64 {
    let criteria_pct = if criteria_total == 0 {
        0.0
    } else {
        criteria_met as f64 / criteria_total as f64 * 100.0
    };
    let score = COMPLETION_WEIGHT * f64::from(completion)
        + CRITERIA_WEIGHT * criteria_pct
        + RISK_WEIGHT * risk_contribution(risk);
    score.clamp(0.0, 100.0)
}

/// Compute every derived metric for a project in `phase` with `completion`
pub fn compute(phase: Phase, completion: u8, artifacts: &ArtifactSet) -> MetricsReport {
    let risk_level = project_risk_level(&artifacts.risks);
    let (criteria_met, criteria_total) = criteria_progress(phase, artifacts);
    MetricsReport {
        risk_level,
        quality_score: quality_score(completion, criteria_met, criteria_total, risk_level),
        criteria_met,
        criteria_total,
        risks: risk_summary(&artifacts.risks),
        capability: process_capability(&artifacts.kpis),
        kpis: artifacts
            .kpis
            .iter()
            .map(|k| KpiPerformance {
                name: k.name.clone(),
                performance: k.performance(),
                defect: is_defect(k),
            })
            .collect(),
    }
}
