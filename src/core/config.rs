//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::gate::{GatePolicy, DEFAULT_WEIGHTED_THRESHOLD};
use crate::core::repository::DEFAULT_BUSY_TIMEOUT;
use crate::core::scoring::ScoringStrategy;
use crate::core::workflow::EngineConfig;
use crate::core::workspace::Workspace;

/// Gate policy names accepted in config files and the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicyKind {
    #[default]
    Strict,
    Weighted,
}

impl std::str::FromStr for GatePolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(GatePolicyKind::Strict),
            "weighted" => Ok(GatePolicyKind::Weighted),
            _ => Err(format!("Invalid gate policy: {}. Use strict or weighted", s)),
        }
    }
}

/// DMAIC configuration with layered hierarchy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How gate criteria combine into a verdict
    pub gate_policy: Option<GatePolicyKind>,

    /// Pass fraction for the weighted policy (0.0-1.0)
    pub gate_threshold: Option<f64>,

    /// Solution scoring formula
    pub scoring: Option<ScoringStrategy>,

    /// Database file, relative to the workspace root unless absolute
    pub database: Option<PathBuf>,

    /// How long to wait on a locked database
    pub busy_timeout_ms: Option<u64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/dmaic/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.dmaic/config.yaml)
        if let Some(ws) = workspace {
            if let Some(local) = Self::read_file(&ws.config_path()) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dmaic")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable config file"
                );
                None
            }
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(policy) = var("DMAIC_GATE_POLICY").and_then(|v| v.parse().ok()) {
            self.gate_policy = Some(policy);
        }
        if let Some(threshold) = var("DMAIC_GATE_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.gate_threshold = Some(threshold);
        }
        if let Some(scoring) = var("DMAIC_SCORING").and_then(|v| v.parse().ok()) {
            self.scoring = Some(scoring);
        }
        if let Some(database) = var("DMAIC_DATABASE") {
            self.database = Some(PathBuf::from(database));
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.gate_policy.is_some() {
            self.gate_policy = other.gate_policy;
        }
        if other.gate_threshold.is_some() {
            self.gate_threshold = other.gate_threshold;
        }
        if other.scoring.is_some() {
            self.scoring = other.scoring;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.busy_timeout_ms.is_some() {
            self.busy_timeout_ms = other.busy_timeout_ms;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Strategies for the engine; out-of-range thresholds fall back to the default
    pub fn engine_config(&self) -> EngineConfig {
        let gate_policy = match self.gate_policy.unwrap_or_default() {
            GatePolicyKind::Strict => GatePolicy::Strict,
            GatePolicyKind::Weighted => {
                let threshold = match self.gate_threshold {
                    Some(t) if (0.0..=1.0).contains(&t) => t,
                    Some(t) => {
                        tracing::warn!(
                            threshold = t,
                            "gate_threshold outside 0..=1, using {}",
                            DEFAULT_WEIGHTED_THRESHOLD
                        );
                        DEFAULT_WEIGHTED_THRESHOLD
                    }
                    None => DEFAULT_WEIGHTED_THRESHOLD,
                };
                GatePolicy::Weighted { threshold }
            }
        };
        EngineConfig {
            gate_policy,
            scoring: self.scoring.unwrap_or_default(),
        }
    }

    /// Database location for a workspace
    pub fn database_path(&self, workspace: &Workspace) -> PathBuf {
        match &self.database {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => workspace.root().join(path),
            None => workspace.database_path(),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_strict_linear() {
        let config = Config::default();
        assert_eq!(config.engine_config(), EngineConfig::default());
        assert_eq!(config.busy_timeout(), DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn test_yaml_keys() {
        let config: Config = serde_yml::from_str(
            "gate_policy: weighted\ngate_threshold: 0.75\nscoring: normalized_weighted\nbusy_timeout_ms: 250\n",
        )
        .unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.gate_policy, GatePolicy::Weighted { threshold: 0.75 });
        assert_eq!(engine.scoring, ScoringStrategy::NormalizedWeighted);
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_out_of_range_threshold_uses_default() {
        let config = Config {
            gate_policy: Some(GatePolicyKind::Weighted),
            gate_threshold: Some(1.5),
            ..Config::default()
        };
        assert_eq!(config.engine_config().gate_policy, GatePolicy::weighted());
    }

    #[test]
    fn test_later_layers_win() {
        let mut config: Config =
            serde_yml::from_str("scoring: linear\ndefault_format: json\n").unwrap();
        config.merge(serde_yml::from_str("scoring: normalized_weighted\n").unwrap());
        assert_eq!(config.scoring, Some(ScoringStrategy::NormalizedWeighted));
        assert_eq!(config.default_format.as_deref(), Some("json"));

        let env: HashMap<&str, &str> = [
            ("DMAIC_GATE_POLICY", "weighted"),
            ("DMAIC_SCORING", "linear"),
            ("DMAIC_DATABASE", "/tmp/other.db"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.gate_policy, Some(GatePolicyKind::Weighted));
        assert_eq!(config.scoring, Some(ScoringStrategy::Linear));
        assert_eq!(config.database, Some(PathBuf::from("/tmp/other.db")));
    }

    #[test]
    fn test_unparseable_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|k| (k == "DMAIC_GATE_THRESHOLD").then(|| "lots".to_string()));
        assert_eq!(config.gate_threshold, None);
    }
}
