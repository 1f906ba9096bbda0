//! Engine error taxonomy

use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::core::identity::EntityId;
use crate::core::phase::Phase;
use crate::core::repository::RepositoryError;

/// A single numeric field outside its declared domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// Artifact or project the field belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityId>,
    pub field: String,
    pub value: String,
    pub expected: String,
}

impl FieldViolation {
    pub fn new(
        owner: Option<&EntityId>,
        field: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.cloned(),
            field: field.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "{}.", owner)?;
        }
        write!(f, "{} = {} (expected {})", self.field, self.value, self.expected)
    }
}

/// Errors returned by the phase workflow engine
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("project not found: {0}")]
    #[diagnostic(
        code(dmaic::project_not_found),
        help("List known projects with `dmaic project list`")
    )]
    ProjectNotFound(EntityId),

    #[error("artifacts for {submitted} rejected: project is in {current}")]
    #[diagnostic(
        code(dmaic::phase_mismatch),
        help("Artifacts can only be submitted for the project's current phase")
    )]
    PhaseMismatch { current: Phase, submitted: Phase },

    #[error("{phase} gate not satisfied, missing: {}", .missing.join(", "))]
    #[diagnostic(
        code(dmaic::gate_not_satisfied),
        help("Run `dmaic gate <project>` for per-criterion recommendations")
    )]
    GateNotSatisfied {
        phase: Phase,
        missing: Vec<String>,
        recommendations: Vec<String>,
    },

    #[error("field out of range: {}", join_violations(.violations))]
    #[diagnostic(code(dmaic::invalid_field_range))]
    InvalidFieldRange { violations: Vec<FieldViolation> },

    #[error("project {0} is completed and accepts no further changes")]
    #[diagnostic(code(dmaic::project_completed))]
    ProjectCompleted(EntityId),

    #[error("project {project} moved from {expected} to {actual} concurrently")]
    #[diagnostic(
        code(dmaic::phase_conflict),
        help("Another writer changed the phase first; re-read the project status")
    )]
    PhaseConflict {
        project: EntityId,
        expected: Phase,
        actual: Phase,
    },

    #[error("artifact not found: {0}")]
    #[diagnostic(code(dmaic::artifact_not_found))]
    ArtifactNotFound(EntityId),

    #[error("artifact already stored: {0}")]
    #[diagnostic(
        code(dmaic::duplicate_artifact),
        help("Artifact ids are unique; omit `id` to have a fresh one assigned")
    )]
    DuplicateArtifact(EntityId),

    #[error("repository unavailable: {0}")]
    #[diagnostic(code(dmaic::repository_unavailable))]
    RepositoryUnavailable(String),

    #[error("repository timed out: {0}")]
    #[diagnostic(
        code(dmaic::repository_timeout),
        help("The store is busy; the operation had no effect and may be retried")
    )]
    RepositoryTimeout(String),
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    pub(crate) fn from_repository(err: RepositoryError, project: &EntityId) -> Self {
        match err {
            RepositoryError::ProjectNotFound => EngineError::ProjectNotFound(project.clone()),
            RepositoryError::ArtifactNotFound(id) => EngineError::ArtifactNotFound(id),
            RepositoryError::DuplicateArtifact(id) => EngineError::DuplicateArtifact(id),
            RepositoryError::PhaseConflict { expected, actual } => EngineError::PhaseConflict {
                project: project.clone(),
                expected,
                actual,
            },
            RepositoryError::Timeout(msg) => EngineError::RepositoryTimeout(msg),
            RepositoryError::Unavailable(msg) => EngineError::RepositoryUnavailable(msg),
        }
    }
}
