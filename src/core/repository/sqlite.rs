//! SQLite-backed artifact repository
//!
//! One table per artifact kind, each keyed to `projects(id)`. Phase-dependent
//! writes run inside a transaction that re-reads the stored phase first, and
//! the phase transition itself is a conditional `UPDATE ... WHERE phase = ?`.

use std::error::Error as StdError;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};

use super::{repeated_id, ArtifactRepository, RepositoryError};
use crate::core::identity::EntityId;
use crate::core::phase::Phase;
use crate::entities::{
    Artifact, ArtifactSet, Constraint, ControlChecklist, Kpi, Project, QualityTarget,
    Requirement, RiskItem, Solution, SolutionStatus,
};

/// Current schema version
pub(super) const SCHEMA_VERSION: i32 = 1;

/// Default time to wait on a locked database before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PROJECT_COLUMNS: &str = "id, name, business_case, deployment_target, budget_limit, \
    timeline_days, phase, completion, quality_score, risk_level, created, updated";

/// Durable repository stored in a single SQLite database file
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open or create a database at `path`
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(map_err)?;
        conn.busy_timeout(busy_timeout).map_err(map_err)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(map_err)?;
        Self::with_connection(conn)
    }

    /// Private database that disappears with the repository
    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory().map_err(map_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, RepositoryError> {
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn.lock().map_err(|_| {
            RepositoryError::Unavailable("database connection lock poisoned".to_string())
        })
    }
}

/// Busy/locked databases are timeouts; everything else is unavailability
pub(super) fn map_err(err: rusqlite::Error) -> RepositoryError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            RepositoryError::Timeout(err.to_string())
        }
        _ => RepositoryError::Unavailable(err.to_string()),
    }
}

fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn StdError + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: T::Err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_col(row, 0)?,
        name: row.get(1)?,
        business_case: row.get(2)?,
        deployment_target: row.get(3)?,
        budget_limit: row.get(4)?,
        timeline_days: row.get(5)?,
        phase: parse_col(row, 6)?,
        completion: row.get(7)?,
        quality_score: row.get(8)?,
        risk_level: parse_col(row, 9)?,
        created: time_col(row, 10)?,
        updated: time_col(row, 11)?,
    })
}

/// Write transaction holding the database write lock from BEGIN
fn write_tx(conn: &mut Connection) -> Result<Transaction<'_>, RepositoryError> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(map_err)
}

fn stored_phase(tx: &Transaction<'_>, id: &EntityId) -> Result<Phase, RepositoryError> {
    let raw: Option<String> = tx
        .query_row(
            "SELECT phase FROM projects WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_err)?;
    let raw = raw.ok_or(RepositoryError::ProjectNotFound)?;
    raw.parse().map_err(RepositoryError::Unavailable)
}

fn require_phase(
    tx: &Transaction<'_>,
    id: &EntityId,
    expected: Phase,
) -> Result<(), RepositoryError> {
    let actual = stored_phase(tx, id)?;
    if actual != expected {
        return Err(RepositoryError::PhaseConflict { expected, actual });
    }
    Ok(())
}

/// Table holding artifacts of this kind; `None` for the per-project checklist
fn artifact_table(artifact: &Artifact) -> Option<&'static str> {
    match artifact {
        Artifact::Requirement(_) => Some("requirements"),
        Artifact::QualityTarget(_) => Some("quality_targets"),
        Artifact::Constraint(_) => Some("constraints"),
        Artifact::Kpi(_) => Some("kpis"),
        Artifact::Risk(_) => Some("risk_items"),
        Artifact::Solution(_) => Some("solutions"),
        Artifact::ControlChecklist(_) => None,
    }
}

fn artifact_exists(tx: &Transaction<'_>, artifact: &Artifact) -> Result<bool, RepositoryError> {
    let Some(table) = artifact_table(artifact) else {
        return Ok(false);
    };
    tx.query_row(
        &format!("SELECT 1 FROM {} WHERE id = ?1", table),
        params![artifact.id().to_string()],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
    .map_err(map_err)
}

fn insert_artifact(
    tx: &Transaction<'_>,
    project: &str,
    artifact: &Artifact,
) -> rusqlite::Result<usize> {
    match artifact {
        Artifact::Requirement(a) => tx.execute(
            "INSERT INTO requirements (id, project_id, text, category, priority, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                a.id.to_string(),
                project,
                a.text,
                a.category.to_string(),
                a.priority.to_string(),
                a.created.to_rfc3339()
            ],
        ),
        Artifact::QualityTarget(a) => tx.execute(
            "INSERT INTO quality_targets
                (id, project_id, need, driver, characteristic, target, usl, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                a.id.to_string(),
                project,
                a.need,
                a.driver,
                a.characteristic,
                a.target,
                a.usl,
                a.created.to_rfc3339()
            ],
        ),
        Artifact::Constraint(a) => tx.execute(
            "INSERT INTO constraints (id, project_id, category, description, impact, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                a.id.to_string(),
                project,
                a.category.to_string(),
                a.description,
                a.impact.to_string(),
                a.created.to_rfc3339()
            ],
        ),
        Artifact::Kpi(a) => tx.execute(
            "INSERT INTO kpis (id, project_id, name, description, target, current, unit, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                a.id.to_string(),
                project,
                a.name,
                a.description,
                a.target,
                a.current,
                a.unit,
                a.created.to_rfc3339()
            ],
        ),
        Artifact::Risk(a) => tx.execute(
            "INSERT INTO risk_items
                (id, project_id, failure_mode, effects, causes, severity, occurrence, detection, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                a.id.to_string(),
                project,
                a.failure_mode,
                a.effects,
                a.causes,
                a.severity,
                a.occurrence,
                a.detection,
                a.created.to_rfc3339()
            ],
        ),
        Artifact::Solution(a) => tx.execute(
            "INSERT INTO solutions
                (id, project_id, title, description, approach, impact, effort, risk, cost, status, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                a.id.to_string(),
                project,
                a.title,
                a.description,
                a.approach.to_string(),
                a.impact,
                a.effort,
                a.risk,
                a.cost,
                a.status.to_string(),
                a.created.to_rfc3339()
            ],
        ),
        Artifact::ControlChecklist(a) => tx.execute(
            "INSERT INTO control_checklists
                (project_id, id, monitoring, documentation, validation, training, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(project_id) DO UPDATE SET
                id = excluded.id,
                monitoring = excluded.monitoring,
                documentation = excluded.documentation,
                validation = excluded.validation,
                training = excluded.training,
                updated = excluded.updated",
            params![
                project,
                a.id.to_string(),
                a.monitoring,
                a.documentation,
                a.validation,
                a.training,
                a.updated.to_rfc3339()
            ],
        ),
    }
}

/// Run `sql` with the project id bound as ?1 and collect the mapped rows
fn query_children<T>(
    conn: &Connection,
    sql: &str,
    project: &str,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![project], map)?;
    rows.collect()
}

fn load_artifacts(conn: &Connection, project: &str) -> rusqlite::Result<ArtifactSet> {
    let requirements = query_children(
        conn,
        "SELECT id, text, category, priority, created FROM requirements
         WHERE project_id = ?1 ORDER BY rowid",
        project,
        |row| {
            Ok(Requirement {
                id: parse_col(row, 0)?,
                text: row.get(1)?,
                category: parse_col(row, 2)?,
                priority: parse_col(row, 3)?,
                created: time_col(row, 4)?,
            })
        },
    )?;

    let quality_targets = query_children(
        conn,
        "SELECT id, need, driver, characteristic, target, usl, created FROM quality_targets
         WHERE project_id = ?1 ORDER BY rowid",
        project,
        |row| {
            Ok(QualityTarget {
                id: parse_col(row, 0)?,
                need: row.get(1)?,
                driver: row.get(2)?,
                characteristic: row.get(3)?,
                target: row.get(4)?,
                usl: row.get(5)?,
                created: time_col(row, 6)?,
            })
        },
    )?;

    let constraints = query_children(
        conn,
        "SELECT id, category, description, impact, created FROM constraints
         WHERE project_id = ?1 ORDER BY rowid",
        project,
        |row| {
            Ok(Constraint {
                id: parse_col(row, 0)?,
                category: parse_col(row, 1)?,
                description: row.get(2)?,
                impact: parse_col(row, 3)?,
                created: time_col(row, 4)?,
            })
        },
    )?;

    let kpis = query_children(
        conn,
        "SELECT id, name, description, target, current, unit, created FROM kpis
         WHERE project_id = ?1 ORDER BY rowid",
        project,
        |row| {
            Ok(Kpi {
                id: parse_col(row, 0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                target: row.get(3)?,
                current: row.get(4)?,
                unit: row.get(5)?,
                created: time_col(row, 6)?,
            })
        },
    )?;

    let risks = query_children(
        conn,
        "SELECT id, failure_mode, effects, causes, severity, occurrence, detection, created
         FROM risk_items WHERE project_id = ?1 ORDER BY rowid",
        project,
        |row| {
            Ok(RiskItem {
                id: parse_col(row, 0)?,
                failure_mode: row.get(1)?,
                effects: row.get(2)?,
                causes: row.get(3)?,
                severity: row.get(4)?,
                occurrence: row.get(5)?,
                detection: row.get(6)?,
                created: time_col(row, 7)?,
            })
        },
    )?;

    let solutions = query_children(
        conn,
        "SELECT id, title, description, approach, impact, effort, risk, cost, status, created
         FROM solutions WHERE project_id = ?1 ORDER BY rowid",
        project,
        solution_from_row,
    )?;

    let checklist = conn
        .query_row(
            "SELECT id, monitoring, documentation, validation, training, updated
             FROM control_checklists WHERE project_id = ?1",
            params![project],
            |row| {
                Ok(ControlChecklist {
                    id: parse_col(row, 0)?,
                    monitoring: row.get(1)?,
                    documentation: row.get(2)?,
                    validation: row.get(3)?,
                    training: row.get(4)?,
                    updated: time_col(row, 5)?,
                })
            },
        )
        .optional()?;

    Ok(ArtifactSet {
        requirements,
        quality_targets,
        constraints,
        kpis,
        risks,
        solutions,
        checklist,
    })
}

fn solution_from_row(row: &Row<'_>) -> rusqlite::Result<Solution> {
    Ok(Solution {
        id: parse_col(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        approach: parse_col(row, 3)?,
        impact: row.get(4)?,
        effort: row.get(5)?,
        risk: row.get(6)?,
        cost: row.get(7)?,
        status: parse_col(row, 8)?,
        created: time_col(row, 9)?,
    })
}

impl ArtifactRepository for SqliteRepository {
    fn create_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO projects ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PROJECT_COLUMNS
            ),
            params![
                project.id.to_string(),
                project.name,
                project.business_case,
                project.deployment_target,
                project.budget_limit,
                project.timeline_days,
                project.phase.to_string(),
                project.completion,
                project.quality_score,
                project.risk_level.to_string(),
                project.created.to_rfc3339(),
                project.updated.to_rfc3339()
            ],
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn project(&self, id: &EntityId) -> Result<Project, RepositoryError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
            params![id.to_string()],
            project_from_row,
        )
        .optional()
        .map_err(map_err)?
        .ok_or(RepositoryError::ProjectNotFound)
    }

    fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM projects ORDER BY created, rowid",
                PROJECT_COLUMNS
            ))
            .map_err(map_err)?;
        let rows = stmt.query_map([], project_from_row).map_err(map_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_err)
    }

    fn artifacts(&self, id: &EntityId) -> Result<ArtifactSet, RepositoryError> {
        Ok(self.snapshot(id)?.1)
    }

    fn snapshot(&self, id: &EntityId) -> Result<(Project, ArtifactSet), RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(map_err)?;
        let key = id.to_string();
        let project = tx
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                params![key],
                project_from_row,
            )
            .optional()
            .map_err(map_err)?
            .ok_or(RepositoryError::ProjectNotFound)?;
        let artifacts = load_artifacts(&tx, &key).map_err(map_err)?;
        tx.commit().map_err(map_err)?;
        Ok((project, artifacts))
    }

    fn insert_artifacts(
        &self,
        id: &EntityId,
        expected: Phase,
        artifacts: &[Artifact],
    ) -> Result<(), RepositoryError> {
        let mut conn = self.lock()?;
        let tx = write_tx(&mut conn)?;
        require_phase(&tx, id, expected)?;
        if let Some(dup) = repeated_id(artifacts) {
            return Err(RepositoryError::DuplicateArtifact(dup.clone()));
        }
        let key = id.to_string();
        for artifact in artifacts {
            if artifact_exists(&tx, artifact)? {
                return Err(RepositoryError::DuplicateArtifact(artifact.id().clone()));
            }
            insert_artifact(&tx, &key, artifact).map_err(map_err)?;
        }
        tx.commit().map_err(map_err)
    }

    fn update_solution_status(
        &self,
        id: &EntityId,
        expected: Phase,
        solution: &EntityId,
        status: SolutionStatus,
    ) -> Result<Solution, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = write_tx(&mut conn)?;
        require_phase(&tx, id, expected)?;
        let changed = tx
            .execute(
                "UPDATE solutions SET status = ?1 WHERE id = ?2 AND project_id = ?3",
                params![status.to_string(), solution.to_string(), id.to_string()],
            )
            .map_err(map_err)?;
        if changed == 0 {
            return Err(RepositoryError::ArtifactNotFound(solution.clone()));
        }
        let updated = tx
            .query_row(
                "SELECT id, title, description, approach, impact, effort, risk, cost, status, created
                 FROM solutions WHERE id = ?1",
                params![solution.to_string()],
                solution_from_row,
            )
            .map_err(map_err)?;
        tx.commit().map_err(map_err)?;
        Ok(updated)
    }

    fn compare_and_swap_project(
        &self,
        expected: Phase,
        project: &Project,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.lock()?;
        let tx = write_tx(&mut conn)?;
        let changed = tx
            .execute(
                "UPDATE projects SET
                    name = ?1, business_case = ?2, deployment_target = ?3, budget_limit = ?4,
                    timeline_days = ?5, phase = ?6, completion = ?7, quality_score = ?8,
                    risk_level = ?9, updated = ?10
                 WHERE id = ?11 AND phase = ?12",
                params![
                    project.name,
                    project.business_case,
                    project.deployment_target,
                    project.budget_limit,
                    project.timeline_days,
                    project.phase.to_string(),
                    project.completion,
                    project.quality_score,
                    project.risk_level.to_string(),
                    project.updated.to_rfc3339(),
                    project.id.to_string(),
                    expected.to_string()
                ],
            )
            .map_err(map_err)?;
        if changed == 0 {
            let actual = stored_phase(&tx, &project.id)?;
            return Err(RepositoryError::PhaseConflict { expected, actual });
        }
        tx.commit().map_err(map_err)
    }
}
