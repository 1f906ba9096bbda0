//! `dmaic submit` command - Submit phase artifacts from a YAML or JSON file

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{print_structured, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::phase::Phase;
use crate::entities::Artifact;

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,

    /// Phase the artifacts belong to (must be the project's current phase)
    #[arg(long, short = 'p')]
    pub phase: Phase,

    /// Artifact file (YAML or JSON), or - for stdin
    #[arg(long, short = 'F')]
    pub file: PathBuf,
}

/// A file holds either a single artifact or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtifactBatch {
    Many(Vec<Artifact>),
    One(Artifact),
}

impl From<ArtifactBatch> for Vec<Artifact> {
    fn from(batch: ArtifactBatch) -> Self {
        match batch {
            ArtifactBatch::Many(all) => all,
            ArtifactBatch::One(one) => vec![one],
        }
    }
}

pub fn run(args: SubmitArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;
    let artifacts = read_artifacts(&args.file)?;

    let receipt = session
        .engine
        .submit_artifacts(&project, args.phase, artifacts)?;

    match session.format(global) {
        OutputFormat::Json => print_structured(&receipt, OutputFormat::Json)?,
        OutputFormat::Yaml => print_structured(&receipt, OutputFormat::Yaml)?,
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Accepted {} {} artifact(s) for {} ({} stored for this phase)",
                style("✓").green(),
                style(receipt.accepted).cyan(),
                receipt.phase,
                style(&receipt.project.to_string()).cyan(),
                receipt.artifact_count
            );
        }
    }
    Ok(())
}

fn read_artifacts(path: &Path) -> Result<Vec<Artifact>> {
    let (contents, is_json) = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        (buf, false)
    } else {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("cannot read {}: {}", path.display(), e))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        (contents, is_json)
    };
    parse_artifacts(&contents, is_json)
}

fn parse_artifacts(contents: &str, is_json: bool) -> Result<Vec<Artifact>> {
    let batch: ArtifactBatch = if is_json {
        serde_json::from_str(contents)
            .map_err(|e| miette::miette!("invalid artifact JSON: {}", e))?
    } else {
        serde_yml::from_str(contents)
            .map_err(|e| miette::miette!("invalid artifact YAML: {}", e))?
    };
    Ok(batch.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_list() {
        let yaml = r#"
- kind: requirement
  text: Checkout completes in under 2 seconds
  category: non_functional
  priority: high
- kind: quality_target
  need: Fast checkout
  driver: Latency
  characteristic: p95 checkout time (s)
  target: 2.0
  usl: 3.0
- kind: constraint
  category: business
  description: No downtime in peak season
  impact: high
"#;
        let artifacts = parse_artifacts(yaml, false).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts.iter().all(|a| a.phase() == Phase::Define));
    }

    #[test]
    fn test_parse_single_json_artifact() {
        let json = r#"{"kind": "risk", "failure_mode": "Pool exhaustion", "severity": 9, "occurrence": 6, "detection": 7}"#;
        let artifacts = parse_artifacts(json, true).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].phase(), Phase::Analyze);
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        assert!(parse_artifacts("- kind: widget\n  name: x\n", false).is_err());
    }
}
