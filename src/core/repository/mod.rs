//! Artifact repository - the persistence boundary of the workflow engine
//!
//! The engine never touches storage directly. Every write that depends on
//! the project's phase carries the phase the caller observed, and the
//! repository applies it only if the stored phase still matches. This is
//! what serializes concurrent advances on the same project.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::{SqliteRepository, DEFAULT_BUSY_TIMEOUT};

use std::collections::HashSet;

use thiserror::Error;

use crate::core::identity::EntityId;
use crate::core::phase::Phase;
use crate::entities::{Artifact, ArtifactSet, Project, Solution, SolutionStatus};

/// Errors reported by repository implementations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("project not found")]
    ProjectNotFound,

    #[error("artifact not found: {0}")]
    ArtifactNotFound(EntityId),

    #[error("artifact already stored: {0}")]
    DuplicateArtifact(EntityId),

    #[error("stored phase is {actual}, expected {expected}")]
    PhaseConflict { expected: Phase, actual: Phase },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Storage capability set required by the engine
pub trait ArtifactRepository: Send + Sync {
    /// Store a new project record
    fn create_project(&self, project: &Project) -> Result<(), RepositoryError>;

    fn project(&self, id: &EntityId) -> Result<Project, RepositoryError>;

    fn list_projects(&self) -> Result<Vec<Project>, RepositoryError>;

    /// All artifacts of a project, in insertion order per kind
    fn artifacts(&self, id: &EntityId) -> Result<ArtifactSet, RepositoryError>;

    /// Project record and artifacts read together
    fn snapshot(&self, id: &EntityId) -> Result<(Project, ArtifactSet), RepositoryError> {
        let project = self.project(id)?;
        let artifacts = self.artifacts(id)?;
        Ok((project, artifacts))
    }

    /// Append artifacts if the stored phase equals `expected`. All or nothing.
    ///
    /// An id already stored, or repeated within the batch, fails with
    /// [`RepositoryError::DuplicateArtifact`]. Control checklists are
    /// upserted per project and exempt.
    fn insert_artifacts(
        &self,
        id: &EntityId,
        expected: Phase,
        artifacts: &[Artifact],
    ) -> Result<(), RepositoryError>;

    /// Set a solution's status if the stored phase equals `expected`
    fn update_solution_status(
        &self,
        id: &EntityId,
        expected: Phase,
        solution: &EntityId,
        status: SolutionStatus,
    ) -> Result<Solution, RepositoryError>;

    /// Replace the project record if the stored phase equals `expected`
    fn compare_and_swap_project(
        &self,
        expected: Phase,
        project: &Project,
    ) -> Result<(), RepositoryError>;
}

/// First id that appears twice in `artifacts`, checklists excluded
pub(crate) fn repeated_id(artifacts: &[Artifact]) -> Option<&EntityId> {
    let mut seen = HashSet::new();
    artifacts
        .iter()
        .filter(|a| !matches!(a, Artifact::ControlChecklist(_)))
        .map(Artifact::id)
        .find(|id| !seen.insert(*id))
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every repository implementation must share

    use super::*;
    use crate::core::entity::Level;
    use crate::entities::{
        ControlChecklist, NewProject, Requirement, RequirementCategory, RiskItem,
    };

    pub fn create_and_read_back(repo: &dyn ArtifactRepository) {
        let project = Project::new(NewProject {
            name: "Checkout latency".to_string(),
            business_case: "Cart abandonment".to_string(),
            deployment_target: Some("production-eu".to_string()),
            budget_limit: Some(25_000.0),
            timeline_days: Some(90),
        });
        repo.create_project(&project).unwrap();

        let loaded = repo.project(&project.id).unwrap();
        assert_eq!(loaded.id, project.id);
        assert_eq!(loaded.name, "Checkout latency");
        assert_eq!(loaded.deployment_target.as_deref(), Some("production-eu"));
        assert_eq!(loaded.budget_limit, Some(25_000.0));
        assert_eq!(loaded.phase, Phase::Define);
        assert_eq!(repo.list_projects().unwrap().len(), 1);
        assert!(repo.artifacts(&project.id).unwrap().is_empty());
    }

    pub fn unknown_project(repo: &dyn ArtifactRepository) {
        let id = EntityId::new(crate::core::identity::EntityPrefix::Prj);
        assert_eq!(repo.project(&id), Err(RepositoryError::ProjectNotFound));
        assert_eq!(
            repo.insert_artifacts(&id, Phase::Define, &[]),
            Err(RepositoryError::ProjectNotFound)
        );
    }

    pub fn insert_is_phase_conditional(repo: &dyn ArtifactRepository) {
        let project = Project::new(NewProject::named("p"));
        repo.create_project(&project).unwrap();

        let req = Artifact::Requirement(Requirement::new(
            "Checkout < 2s",
            RequirementCategory::NonFunctional,
            Level::High,
        ));
        repo.insert_artifacts(&project.id, Phase::Define, std::slice::from_ref(&req))
            .unwrap();

        let risk = Artifact::Risk(RiskItem::new("Pool exhaustion", 9, 6, 7));
        let err = repo
            .insert_artifacts(&project.id, Phase::Analyze, &[risk])
            .unwrap_err();
        assert_eq!(
            err,
            RepositoryError::PhaseConflict {
                expected: Phase::Analyze,
                actual: Phase::Define
            }
        );

        let stored = repo.artifacts(&project.id).unwrap();
        assert_eq!(stored.requirements.len(), 1);
        assert!(stored.risks.is_empty());
        assert_eq!(Artifact::Requirement(stored.requirements[0].clone()), req);
    }

    pub fn duplicate_ids_are_rejected(repo: &dyn ArtifactRepository) {
        let project = Project::new(NewProject::named("p"));
        repo.create_project(&project).unwrap();

        let req = Artifact::Requirement(Requirement::new(
            "Checkout < 2s",
            RequirementCategory::NonFunctional,
            Level::High,
        ));
        repo.insert_artifacts(&project.id, Phase::Define, std::slice::from_ref(&req))
            .unwrap();

        // Same file submitted again
        assert_eq!(
            repo.insert_artifacts(&project.id, Phase::Define, std::slice::from_ref(&req)),
            Err(RepositoryError::DuplicateArtifact(req.id().clone()))
        );

        // Repeated within one batch; the fresh item is not stored either
        let fresh = Artifact::Requirement(Requirement::new(
            "Cart persists",
            RequirementCategory::Functional,
            Level::Medium,
        ));
        let twice = Artifact::Requirement(Requirement::new(
            "Receipts emailed",
            RequirementCategory::Functional,
            Level::Low,
        ));
        let batch = [fresh, twice.clone(), twice.clone()];
        assert_eq!(
            repo.insert_artifacts(&project.id, Phase::Define, &batch),
            Err(RepositoryError::DuplicateArtifact(twice.id().clone()))
        );

        assert_eq!(repo.artifacts(&project.id).unwrap().requirements.len(), 1);
    }

    pub fn compare_and_swap(repo: &dyn ArtifactRepository) {
        let project = Project::new(NewProject::named("p"));
        repo.create_project(&project).unwrap();

        let mut advanced = project.clone();
        advanced.phase = Phase::Measure;
        advanced.completion = 20;
        advanced.quality_score = 39.5;
        repo.compare_and_swap_project(Phase::Define, &advanced).unwrap();

        // A second writer that still saw DEFINE loses
        let err = repo
            .compare_and_swap_project(Phase::Define, &advanced)
            .unwrap_err();
        assert_eq!(
            err,
            RepositoryError::PhaseConflict {
                expected: Phase::Define,
                actual: Phase::Measure
            }
        );

        let stored = repo.project(&project.id).unwrap();
        assert_eq!(stored.phase, Phase::Measure);
        assert_eq!(stored.completion, 20);
        assert_eq!(stored.quality_score, 39.5);
    }

    pub fn checklist_upsert(repo: &dyn ArtifactRepository) {
        let mut project = Project::new(NewProject::named("p"));
        repo.create_project(&project).unwrap();
        let start = project.phase;
        project.phase = Phase::Control;
        repo.compare_and_swap_project(start, &project).unwrap();

        let partial = ControlChecklist {
            monitoring: true,
            ..ControlChecklist::default()
        };
        repo.insert_artifacts(
            &project.id,
            Phase::Control,
            &[Artifact::ControlChecklist(partial)],
        )
        .unwrap();
        let full = ControlChecklist {
            monitoring: true,
            documentation: true,
            validation: true,
            training: true,
            ..ControlChecklist::default()
        };
        repo.insert_artifacts(
            &project.id,
            Phase::Control,
            &[Artifact::ControlChecklist(full.clone())],
        )
        .unwrap();

        let stored = repo.artifacts(&project.id).unwrap();
        assert_eq!(stored.count_for(Phase::Control), 1);
        assert!(stored.checklist.unwrap().is_complete());
    }

    pub fn solution_status(repo: &dyn ArtifactRepository) {
        let mut project = Project::new(NewProject::named("p"));
        repo.create_project(&project).unwrap();
        project.phase = Phase::Improve;
        repo.compare_and_swap_project(Phase::Define, &project).unwrap();

        let sol = crate::entities::Solution::new("Read replica", 8, 4, 3, 3);
        let sol_id = sol.id.clone();
        repo.insert_artifacts(&project.id, Phase::Improve, &[Artifact::Solution(sol)])
            .unwrap();

        let updated = repo
            .update_solution_status(&project.id, Phase::Improve, &sol_id, SolutionStatus::Approved)
            .unwrap();
        assert_eq!(updated.status, SolutionStatus::Approved);
        assert_eq!(
            repo.artifacts(&project.id).unwrap().solutions[0].status,
            SolutionStatus::Approved
        );

        let missing = EntityId::new(crate::core::identity::EntityPrefix::Sol);
        assert_eq!(
            repo.update_solution_status(
                &project.id,
                Phase::Improve,
                &missing,
                SolutionStatus::Approved
            ),
            Err(RepositoryError::ArtifactNotFound(missing.clone()))
        );
    }
}
