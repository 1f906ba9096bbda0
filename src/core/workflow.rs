//! Phase workflow engine
//!
//! Enforces the DEFINE -> MEASURE -> ANALYZE -> IMPROVE -> CONTROL order,
//! gates every transition on the current phase's criteria, and refreshes the
//! project's derived metrics when it advances. All state lives behind an
//! [`ArtifactRepository`]; the engine itself holds only its configuration.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::EngineError;
use crate::core::gate::{GatePolicy, GateResult};
use crate::core::identity::EntityId;
use crate::core::metrics::{self, MetricsReport};
use crate::core::phase::Phase;
use crate::core::repository::{ArtifactRepository, RepositoryError};
use crate::core::scoring::{self, ScoringStrategy, SolutionRanking};
use crate::entities::{
    Artifact, ArtifactSet, NewProject, Project, RiskLevel, Solution, SolutionStatus,
};

/// Strategies the engine is built with
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub gate_policy: GatePolicy,
    pub scoring: ScoringStrategy,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub project: EntityId,
    pub phase: Phase,
    /// Artifacts accepted by this call
    pub accepted: usize,
    /// Artifacts now stored for the phase
    pub artifact_count: usize,
}

/// Result of a successful phase transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAdvance {
    pub project: EntityId,
    pub from: Phase,
    pub phase: Phase,
    pub completion: u8,
    pub quality_score: f64,
    pub risk_level: RiskLevel,
}

/// Snapshot of a project with everything derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project: Project,
    pub metrics: MetricsReport,
    pub gate: GateResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactSet>,
}

/// Finite-state controller over DMAIC projects
pub struct PhaseWorkflowEngine<R> {
    repo: R,
    config: EngineConfig,
}

impl<R: ArtifactRepository> PhaseWorkflowEngine<R> {
    pub fn new(repo: R, config: EngineConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a project in DEFINE with zeroed metrics
    pub fn create_project(&self, params: NewProject) -> Result<Project, EngineError> {
        let violations = params.validate();
        if !violations.is_empty() {
            return Err(EngineError::InvalidFieldRange { violations });
        }

        let project = Project::new(params);
        self.repo
            .create_project(&project)
            .map_err(|e| EngineError::from_repository(e, &project.id))?;
        info!(project = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, EngineError> {
        self.repo.list_projects().map_err(store_error)
    }

    /// Store artifacts for the project's current phase
    ///
    /// Nothing is written unless every artifact belongs to `phase`, `phase`
    /// is the current phase, and every field is in range.
    pub fn submit_artifacts(
        &self,
        id: &EntityId,
        phase: Phase,
        artifacts: Vec<Artifact>,
    ) -> Result<SubmissionReceipt, EngineError> {
        let project = self.load(id)?;
        ensure_open(&project)?;

        if phase != project.phase {
            return Err(EngineError::PhaseMismatch {
                current: project.phase,
                submitted: phase,
            });
        }
        if let Some(stray) = artifacts.iter().find(|a| a.phase() != phase) {
            return Err(EngineError::PhaseMismatch {
                current: project.phase,
                submitted: stray.phase(),
            });
        }

        let mut violations = Vec::new();
        for artifact in &artifacts {
            artifact.validate(&mut violations);
        }
        if !violations.is_empty() {
            return Err(EngineError::InvalidFieldRange { violations });
        }

        self.repo
            .insert_artifacts(id, phase, &artifacts)
            .map_err(|e| EngineError::from_repository(e, id))?;
        let artifact_count = self
            .repo
            .artifacts(id)
            .map_err(|e| EngineError::from_repository(e, id))?
            .count_for(phase);

        debug!(
            project = %id,
            %phase,
            accepted = artifacts.len(),
            artifact_count,
            "artifacts stored"
        );
        Ok(SubmissionReceipt {
            project: id.clone(),
            phase,
            accepted: artifacts.len(),
            artifact_count,
        })
    }

    /// Gate verdict for the current phase. Read-only.
    pub fn evaluate_gate(&self, id: &EntityId) -> Result<GateResult, EngineError> {
        let (project, artifacts) = self.snapshot(id)?;
        let gate = self.config.gate_policy.evaluate(project.phase, &artifacts);
        debug!(
            project = %id,
            phase = %gate.phase,
            passed = gate.passed,
            missing = ?gate.missing,
            "gate evaluated"
        );
        Ok(gate)
    }

    /// Move to the next phase if the current gate passes
    ///
    /// Phase, completion and metrics are committed in one conditional write;
    /// a concurrent advance from the same phase makes this call fail with
    /// [`EngineError::PhaseConflict`] and leaves the winner's state intact.
    pub fn advance_phase(&self, id: &EntityId) -> Result<PhaseAdvance, EngineError> {
        let (project, artifacts) = self.snapshot(id)?;
        ensure_open(&project)?;

        let gate = self.config.gate_policy.evaluate(project.phase, &artifacts);
        if !gate.passed {
            warn!(
                project = %id,
                phase = %project.phase,
                missing = ?gate.missing,
                "advance rejected"
            );
            return Err(EngineError::GateNotSatisfied {
                phase: project.phase,
                missing: gate.missing,
                recommendations: gate.recommendations,
            });
        }

        let from = project.phase;
        let next = from
            .successor()
            .ok_or_else(|| EngineError::ProjectCompleted(id.clone()))?;
        let completion = next.completion().max(project.completion);
        let report = metrics::compute(next, completion, &artifacts);

        let updated = Project {
            phase: next,
            completion,
            quality_score: report.quality_score,
            risk_level: report.risk_level,
            updated: Utc::now(),
            ..project
        };
        self.repo
            .compare_and_swap_project(from, &updated)
            .map_err(|e| {
                if let RepositoryError::PhaseConflict { actual, .. } = &e {
                    warn!(project = %id, expected = %from, %actual, "lost concurrent advance");
                }
                EngineError::from_repository(e, id)
            })?;

        info!(
            project = %id,
            %from,
            to = %next,
            completion,
            quality_score = updated.quality_score,
            risk_level = %updated.risk_level,
            "phase advanced"
        );
        Ok(PhaseAdvance {
            project: id.clone(),
            from,
            phase: next,
            completion,
            quality_score: updated.quality_score,
            risk_level: updated.risk_level,
        })
    }

    /// Project, metrics and current gate in one read
    pub fn status(
        &self,
        id: &EntityId,
        include_artifacts: bool,
    ) -> Result<ProjectStatus, EngineError> {
        let (project, artifacts) = self.snapshot(id)?;
        let metrics = metrics::compute(project.phase, project.completion, &artifacts);
        let gate = self.config.gate_policy.evaluate(project.phase, &artifacts);
        Ok(ProjectStatus {
            project,
            metrics,
            gate,
            artifacts: include_artifacts.then_some(artifacts),
        })
    }

    /// Candidate solutions ordered by the configured scoring strategy
    pub fn rank_solutions(&self, id: &EntityId) -> Result<SolutionRanking, EngineError> {
        let (_, artifacts) = self.snapshot(id)?;
        Ok(scoring::rank_solutions(&artifacts.solutions, self.config.scoring))
    }

    /// Record the caller's decision on a candidate. IMPROVE only.
    pub fn set_solution_status(
        &self,
        id: &EntityId,
        solution: &EntityId,
        status: SolutionStatus,
    ) -> Result<Solution, EngineError> {
        let project = self.load(id)?;
        ensure_open(&project)?;
        if project.phase != Phase::Improve {
            return Err(EngineError::PhaseMismatch {
                current: project.phase,
                submitted: Phase::Improve,
            });
        }

        let updated = self
            .repo
            .update_solution_status(id, Phase::Improve, solution, status)
            .map_err(|e| EngineError::from_repository(e, id))?;
        debug!(project = %id, solution = %solution, %status, "solution status set");
        Ok(updated)
    }

    /// Refresh quality score and risk level without changing phase
    pub fn recompute_metrics(&self, id: &EntityId) -> Result<Project, EngineError> {
        let (project, artifacts) = self.snapshot(id)?;
        ensure_open(&project)?;

        let report = metrics::compute(project.phase, project.completion, &artifacts);
        let phase = project.phase;
        let updated = Project {
            quality_score: report.quality_score,
            risk_level: report.risk_level,
            updated: Utc::now(),
            ..project
        };
        self.repo
            .compare_and_swap_project(phase, &updated)
            .map_err(|e| EngineError::from_repository(e, id))?;
        debug!(project = %id, quality_score = updated.quality_score, "metrics recomputed");
        Ok(updated)
    }

    fn load(&self, id: &EntityId) -> Result<Project, EngineError> {
        self.repo
            .project(id)
            .map_err(|e| EngineError::from_repository(e, id))
    }

    fn snapshot(&self, id: &EntityId) -> Result<(Project, ArtifactSet), EngineError> {
        self.repo
            .snapshot(id)
            .map_err(|e| EngineError::from_repository(e, id))
    }
}

fn ensure_open(project: &Project) -> Result<(), EngineError> {
    if project.is_completed() {
        return Err(EngineError::ProjectCompleted(project.id.clone()));
    }
    Ok(())
}

fn store_error(err: RepositoryError) -> EngineError {
    match err {
        RepositoryError::Timeout(msg) => EngineError::RepositoryTimeout(msg),
        other => EngineError::RepositoryUnavailable(other.to_string()),
    }
}
