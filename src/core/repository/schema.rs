//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::sqlite::{SqliteRepository, SCHEMA_VERSION};
use super::RepositoryError;

impl SqliteRepository {
    /// Create tables if missing and record the schema version
    pub(super) fn init_schema(&self) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                business_case TEXT NOT NULL DEFAULT '',
                deployment_target TEXT,
                budget_limit REAL,
                timeline_days INTEGER,
                phase TEXT NOT NULL,
                completion INTEGER NOT NULL CHECK (completion BETWEEN 0 AND 100),
                quality_score REAL NOT NULL,
                risk_level TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL
            );

            -- DEFINE
            CREATE TABLE IF NOT EXISTS requirements (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                category TEXT NOT NULL,
                priority TEXT NOT NULL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_requirements_project ON requirements(project_id);

            CREATE TABLE IF NOT EXISTS quality_targets (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                need TEXT NOT NULL,
                driver TEXT NOT NULL,
                characteristic TEXT NOT NULL,
                target REAL,
                usl REAL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_quality_targets_project ON quality_targets(project_id);

            CREATE TABLE IF NOT EXISTS constraints (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                impact TEXT NOT NULL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_constraints_project ON constraints(project_id);

            -- MEASURE
            CREATE TABLE IF NOT EXISTS kpis (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                target REAL,
                current REAL,
                unit TEXT NOT NULL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_kpis_project ON kpis(project_id);

            -- ANALYZE (rpn is derived, never written)
            CREATE TABLE IF NOT EXISTS risk_items (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                failure_mode TEXT NOT NULL,
                effects TEXT NOT NULL,
                causes TEXT NOT NULL,
                severity INTEGER NOT NULL CHECK (severity BETWEEN 1 AND 10),
                occurrence INTEGER NOT NULL CHECK (occurrence BETWEEN 1 AND 10),
                detection INTEGER NOT NULL CHECK (detection BETWEEN 1 AND 10),
                rpn INTEGER GENERATED ALWAYS AS (severity * occurrence * detection) VIRTUAL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_risk_items_project ON risk_items(project_id);

            -- IMPROVE
            CREATE TABLE IF NOT EXISTS solutions (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                approach TEXT NOT NULL,
                impact INTEGER NOT NULL CHECK (impact BETWEEN 0 AND 10),
                effort INTEGER NOT NULL CHECK (effort BETWEEN 0 AND 10),
                risk INTEGER NOT NULL CHECK (risk BETWEEN 0 AND 10),
                cost INTEGER NOT NULL CHECK (cost BETWEEN 0 AND 10),
                status TEXT NOT NULL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_solutions_project ON solutions(project_id);

            -- CONTROL (one per project)
            CREATE TABLE IF NOT EXISTS control_checklists (
                project_id TEXT PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
                id TEXT NOT NULL,
                monitoring INTEGER NOT NULL,
                documentation INTEGER NOT NULL,
                validation INTEGER NOT NULL,
                training INTEGER NOT NULL,
                updated TEXT NOT NULL
            );
            "#,
        )
        .map_err(super::sqlite::map_err)?;

        let stored: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(super::sqlite::map_err)?;

        match stored {
            None => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )
                .map_err(super::sqlite::map_err)?;
            }
            Some(v) if v != SCHEMA_VERSION => {
                return Err(RepositoryError::Unavailable(format!(
                    "database schema version {} is not supported (expected {})",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }
}
