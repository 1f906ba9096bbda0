//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks a workspace root
pub const WORKSPACE_DIR: &str = ".dmaic";

const DATABASE_FILE: &str = "dmaic.db";

/// A directory holding `.dmaic/` (config and project database)
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Parent of .dmaic/
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::create(root)
    }

    /// Initialize even if .dmaic/ exists; the config file is rewritten and
    /// an existing database is kept
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create(root)
    }

    fn create(root: PathBuf) -> Result<Self, WorkspaceError> {
        let ws = Self { root };
        std::fs::create_dir_all(ws.dmaic_dir())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(ws.config_path(), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Ok(ws)
    }

    fn default_config() -> &'static str {
        r#"# DMAIC Workspace Configuration

# How gate criteria combine into a verdict (strict, weighted)
# gate_policy: strict

# Fraction of criteria that must hold under the weighted policy
# gate_threshold: 0.8

# Solution scoring formula (linear, normalized_weighted)
# scoring: linear

# Database file, relative to the workspace root
# database: .dmaic/dmaic.db

# Milliseconds to wait on a locked database
# busy_timeout_ms: 5000

# Default output format (auto, yaml, json, tsv, csv, id)
# default_format: auto
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .dmaic configuration directory
    pub fn dmaic_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dmaic_dir().join("config.yaml")
    }

    /// Default database location
    pub fn database_path(&self) -> PathBuf {
        self.dmaic_dir().join(DATABASE_FILE)
    }
}

/// Errors that can occur while locating or creating a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a DMAIC workspace (searched from {searched_from:?}). Run 'dmaic init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("DMAIC workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
