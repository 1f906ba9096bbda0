//! `dmaic status` command - Project status dashboard

use chrono::Local;
use console::style;
use miette::Result;

use crate::cli::commands::gate::print_gate;
use crate::cli::commands::metrics::print_metrics;
use crate::cli::helpers::{
    opt_num, print_rows, print_structured, render_table, truncate_str, Session,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::phase::Phase;
use crate::entities::{Artifact, ArtifactSet, Project};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,

    /// Include every stored artifact
    #[arg(long)]
    pub artifacts: bool,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;
    let status = session.engine.status(&project, args.artifacts)?;

    match session.format(global) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&status, f),
        OutputFormat::Id => {
            println!("{}", status.project.id);
            Ok(())
        }
        f @ (OutputFormat::Csv | OutputFormat::Tsv) => {
            let p = &status.project;
            let row = vec![
                p.id.to_string(),
                p.name.clone(),
                p.phase.to_string(),
                p.completion.to_string(),
                format!("{:.2}", p.quality_score),
                p.risk_level.to_string(),
                status.gate.passed.to_string(),
                status.gate.missing.join(";"),
            ];
            let header = [
                "ID",
                "NAME",
                "PHASE",
                "COMPLETION",
                "QUALITY",
                "RISK",
                "GATE_PASSED",
                "MISSING",
            ];
            print_rows(f, &header, &[row])
        }
        OutputFormat::Auto => {
            let width = 64;
            print_header(&status.project, width);
            println!();
            print_metrics(&status.metrics);
            println!();
            print_gate(&status.gate, session.engine.config().gate_policy, global.quiet);
            if let Some(artifacts) = &status.artifacts {
                println!();
                print_artifacts(artifacts);
            }
            println!("{}", "═".repeat(width));
            Ok(())
        }
    }
}

fn print_header(project: &Project, width: usize) {
    println!("{}", style(&project.name).bold().underlined());
    println!("{}", "═".repeat(width));
    println!("{}: {}", style("ID").bold(), style(&project.id.to_string()).cyan());
    if !project.business_case.is_empty() {
        println!("{}: {}", style("Business case").bold(), project.business_case);
    }
    if let Some(target) = &project.deployment_target {
        println!("{}: {}", style("Deployment").bold(), target);
    }
    if let Some(budget) = project.budget_limit {
        println!("{}: {:.2}", style("Budget").bold(), budget);
    }
    if let Some(days) = project.timeline_days {
        println!("{}: {} days", style("Timeline").bold(), days);
    }
    println!();
    println!("{}", phase_track(project.phase));
    println!(
        "{}: {}%   {}: {}",
        style("Completion").bold(),
        project.completion,
        style("Updated").bold(),
        project
            .updated
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
}

/// One-line DEFINE > MEASURE > ... track with the current phase highlighted
fn phase_track(current: Phase) -> String {
    Phase::working()
        .iter()
        .map(|p| {
            if *p == current {
                style(format!("[{}]", p)).cyan().bold().to_string()
            } else if *p < current {
                style(p.to_string()).green().to_string()
            } else {
                style(p.to_string()).dim().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" > ")
        + if current.is_terminal() { " > COMPLETED" } else { "" }
}

fn print_artifacts(artifacts: &ArtifactSet) {
    println!("{}", style("ARTIFACTS").bold());
    if artifacts.is_empty() {
        println!("  {}", style("none recorded").dim());
        return;
    }

    let rows: Vec<Vec<String>> = artifacts
        .iter()
        .map(|a| {
            vec![
                a.id().to_string(),
                a.kind().to_string(),
                a.phase().to_string(),
                truncate_str(a.label(), 40),
                detail(&a),
                a.recorded().with_timezone(&Local).format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(&["ID", "KIND", "PHASE", "LABEL", "DETAIL", "RECORDED"], &rows)
    );
}

/// Kind-specific figure shown next to the label
fn detail(artifact: &Artifact) -> String {
    match artifact {
        Artifact::Requirement(r) => format!("{} priority", r.priority),
        Artifact::QualityTarget(q) => format!(
            "target {} / USL {}",
            opt_num(q.target, 2),
            opt_num(q.usl, 2)
        ),
        Artifact::Constraint(c) => format!("{}, {} impact", c.category, c.impact),
        Artifact::Kpi(k) => format!(
            "{} of {} {}",
            opt_num(k.current, 2),
            opt_num(k.target, 2),
            k.unit
        )
        .trim_end()
        .to_string(),
        Artifact::Risk(r) => format!("RPN {} {}", r.rpn(), r.rpn_label()),
        Artifact::Solution(s) => s.status.to_string(),
        Artifact::ControlChecklist(c) => {
            let done = c.flags().iter().filter(|(_, set)| *set).count();
            format!("{} of 4 done", done)
        }
    }
}
