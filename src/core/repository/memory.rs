//! In-process repository backed by a locked map

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{repeated_id, ArtifactRepository, RepositoryError};
use crate::core::identity::EntityId;
use crate::core::phase::Phase;
use crate::entities::{Artifact, ArtifactSet, Project, Solution, SolutionStatus};

#[derive(Debug, Clone)]
struct Record {
    project: Project,
    artifacts: ArtifactSet,
    /// Creation order for stable listing
    seq: u64,
}

/// Repository that keeps everything in memory for the life of the process
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: RwLock<HashMap<EntityId, Record>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<EntityId, Record>>, RepositoryError> {
        self.records
            .read()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<EntityId, Record>>, RepositoryError> {
        self.records
            .write()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn check_phase(record: &Record, expected: Phase) -> Result<(), RepositoryError> {
    if record.project.phase != expected {
        return Err(RepositoryError::PhaseConflict {
            expected,
            actual: record.project.phase,
        });
    }
    Ok(())
}

impl ArtifactRepository for MemoryRepository {
    fn create_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        let seq = records.len() as u64;
        records.insert(
            project.id.clone(),
            Record {
                project: project.clone(),
                artifacts: ArtifactSet::default(),
                seq,
            },
        );
        Ok(())
    }

    fn project(&self, id: &EntityId) -> Result<Project, RepositoryError> {
        self.read()?
            .get(id)
            .map(|r| r.project.clone())
            .ok_or(RepositoryError::ProjectNotFound)
    }

    fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let records = self.read()?;
        let mut all: Vec<&Record> = records.values().collect();
        all.sort_by_key(|r| r.seq);
        Ok(all.into_iter().map(|r| r.project.clone()).collect())
    }

    fn artifacts(&self, id: &EntityId) -> Result<ArtifactSet, RepositoryError> {
        self.read()?
            .get(id)
            .map(|r| r.artifacts.clone())
            .ok_or(RepositoryError::ProjectNotFound)
    }

    fn snapshot(&self, id: &EntityId) -> Result<(Project, ArtifactSet), RepositoryError> {
        self.read()?
            .get(id)
            .map(|r| (r.project.clone(), r.artifacts.clone()))
            .ok_or(RepositoryError::ProjectNotFound)
    }

    fn insert_artifacts(
        &self,
        id: &EntityId,
        expected: Phase,
        artifacts: &[Artifact],
    ) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        check_phase(
            records.get(id).ok_or(RepositoryError::ProjectNotFound)?,
            expected,
        )?;
        if let Some(dup) = repeated_id(artifacts) {
            return Err(RepositoryError::DuplicateArtifact(dup.clone()));
        }
        if let Some(stored) = artifacts
            .iter()
            .map(Artifact::id)
            .find(|a| records.values().any(|r| r.artifacts.contains(a)))
        {
            return Err(RepositoryError::DuplicateArtifact(stored.clone()));
        }

        let record = records.get_mut(id).ok_or(RepositoryError::ProjectNotFound)?;
        for artifact in artifacts {
            record.artifacts.push(artifact.clone());
        }
        Ok(())
    }

    fn update_solution_status(
        &self,
        id: &EntityId,
        expected: Phase,
        solution: &EntityId,
        status: SolutionStatus,
    ) -> Result<Solution, RepositoryError> {
        let mut records = self.write()?;
        let record = records.get_mut(id).ok_or(RepositoryError::ProjectNotFound)?;
        check_phase(record, expected)?;
        let stored = record
            .artifacts
            .solutions
            .iter_mut()
            .find(|s| &s.id == solution)
            .ok_or_else(|| RepositoryError::ArtifactNotFound(solution.clone()))?;
        stored.status = status;
        Ok(stored.clone())
    }

    fn compare_and_swap_project(
        &self,
        expected: Phase,
        project: &Project,
    ) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        let record = records
            .get_mut(&project.id)
            .ok_or(RepositoryError::ProjectNotFound)?;
        check_phase(record, expected)?;
        record.project = project.clone();
        Ok(())
    }
}
