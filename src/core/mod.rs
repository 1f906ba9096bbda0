//! Core module - domain types, the workflow engine and its collaborators

pub mod config;
pub mod entity;
pub mod error;
pub mod gate;
pub mod identity;
pub mod metrics;
pub mod phase;
pub mod repository;
pub mod scoring;
pub mod workflow;
pub mod workspace;

pub use config::Config;
pub use entity::{Entity, Level};
pub use error::{EngineError, FieldViolation};
pub use gate::{GatePolicy, GateResult};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use metrics::MetricsReport;
pub use phase::Phase;
pub use repository::{ArtifactRepository, MemoryRepository, RepositoryError, SqliteRepository};
pub use scoring::{ScoringStrategy, SolutionRanking};
pub use workflow::{
    EngineConfig, PhaseAdvance, PhaseWorkflowEngine, ProjectStatus, SubmissionReceipt,
};
pub use workspace::{Workspace, WorkspaceError};
