//! `dmaic gate` command - Evaluate the current phase gate

use console::style;
use miette::Result;

use crate::cli::helpers::{print_rows, print_structured, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::gate::{GatePolicy, GateResult};

#[derive(clap::Args, Debug)]
pub struct GateArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,
}

pub fn run(args: GateArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;
    let gate = session.engine.evaluate_gate(&project)?;

    match session.format(global) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&gate, f),
        f @ (OutputFormat::Csv | OutputFormat::Tsv) => {
            let rows: Vec<Vec<String>> = gate
                .criteria
                .iter()
                .map(|c| {
                    vec![
                        c.name.clone(),
                        c.met.to_string(),
                        c.recommendation.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_rows(f, &["CRITERION", "MET", "RECOMMENDATION"], &rows)
        }
        OutputFormat::Id => {
            for name in &gate.missing {
                println!("{}", name);
            }
            Ok(())
        }
        OutputFormat::Auto => {
            print_gate(&gate, session.engine.config().gate_policy, global.quiet);
            Ok(())
        }
    }
}

/// Human-readable gate verdict, shared with `dmaic status`
pub fn print_gate(gate: &GateResult, policy: GatePolicy, quiet: bool) {
    let verdict = if gate.passed {
        style("PASSED").green().bold()
    } else {
        style("NOT SATISFIED").red().bold()
    };
    let policy = match policy {
        GatePolicy::Weighted { threshold } => format!("{} >= {:.2}", policy.name(), threshold),
        GatePolicy::Strict => policy.name().to_string(),
    };
    println!(
        "{} gate ({}): {}",
        style(gate.phase).bold(),
        style(policy).dim(),
        verdict
    );
    if quiet {
        return;
    }

    if gate.criteria.is_empty() {
        println!("  {}", style("No criteria (project completed)").dim());
        return;
    }
    for criterion in &gate.criteria {
        let mark = if criterion.met {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {}", mark, criterion.name);
        if let Some(hint) = &criterion.recommendation {
            println!("      {}", style(hint).dim());
        }
    }
}
