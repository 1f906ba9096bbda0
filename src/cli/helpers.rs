//! Shared helper functions for CLI commands
//!
//! Workspace and engine setup, project lookup, and the output writers used
//! by every command.

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::identity::EntityId;
use crate::core::repository::SqliteRepository;
use crate::core::workflow::PhaseWorkflowEngine;
use crate::core::workspace::Workspace;

/// Everything a command needs to talk to the engine
pub struct Session {
    pub workspace: Workspace,
    pub config: Config,
    pub engine: PhaseWorkflowEngine<SqliteRepository>,
}

impl Session {
    /// Locate the workspace, load config and open its database
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = match &global.workspace {
            Some(root) => Workspace::discover_from(root),
            None => Workspace::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;

        let config = Config::load(Some(&workspace));
        let db_path = config.database_path(&workspace);
        tracing::debug!(database = %db_path.display(), "opening project database");
        let repo = SqliteRepository::open(&db_path, config.busy_timeout())
            .map_err(|e| miette::miette!("cannot open {}: {}", db_path.display(), e))?;
        let engine = PhaseWorkflowEngine::new(repo, config.engine_config());

        Ok(Self {
            workspace,
            config,
            engine,
        })
    }

    /// Output format after applying the configured default
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        if global.format != OutputFormat::Auto {
            return global.format;
        }
        self.config
            .default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }

    /// Resolve a full project ID, a unique ID prefix, or an exact project name
    pub fn project_id(&self, query: &str) -> Result<EntityId> {
        if let Ok(id) = query.parse::<EntityId>() {
            return Ok(id);
        }

        let needle = query.to_uppercase();
        let projects = self.engine.list_projects()?;
        let matches: Vec<_> = projects
            .iter()
            .filter(|p| p.id.to_string().starts_with(&needle) || p.name == query)
            .collect();

        match matches.as_slice() {
            [one] => Ok(one.id.clone()),
            [] => Err(miette::miette!(
                help = "List known projects with `dmaic project list`",
                "no project matches '{}'",
                query
            )),
            many => Err(miette::miette!(
                "'{}' is ambiguous, it matches {} projects",
                query,
                many.len()
            )),
        }
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a serializable value as JSON or YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Print tabular rows; the first column is the row's ID for `--format id`
pub fn print_rows(format: OutputFormat, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    match format {
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = if format == OutputFormat::Csv { b',' } else { b'\t' };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(std::io::stdout());
            writer.write_record(header).into_diagnostic()?;
            for row in rows {
                writer.write_record(row).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Id => {
            for row in rows {
                if let Some(id) = row.first() {
                    println!("{}", id);
                }
            }
        }
        _ => {
            println!("{}", render_table(header, rows));
        }
    }
    Ok(())
}

/// Human table for terminal output
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::sharp()).to_string()
}

/// Render an optional number with fixed precision, "-" when absent
pub fn opt_num(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.prec$}", v, prec = precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("größenwahn", 7), "grö...");
    }

    #[test]
    fn test_opt_num() {
        assert_eq!(opt_num(Some(1.23456), 2), "1.23");
        assert_eq!(opt_num(None, 2), "-");
    }

    #[test]
    fn test_render_table_contains_cells() {
        let table = render_table(
            &["ID", "SCORE"],
            &[vec!["SOL-1".to_string(), "6.0".to_string()]],
        );
        assert!(table.contains("SOL-1"));
        assert!(table.contains("SCORE"));
    }
}
