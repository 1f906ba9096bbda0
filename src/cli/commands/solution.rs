//! `dmaic solution` command - Candidate ranking and approval

use console::style;
use miette::Result;

use crate::cli::helpers::{print_rows, print_structured, truncate_str, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::entities::SolutionStatus;

#[derive(clap::Subcommand, Debug)]
pub enum SolutionCommands {
    /// Rank candidate solutions, best first
    Rank(RankArgs),

    /// Record a decision on a candidate (IMPROVE phase only)
    SetStatus(SetStatusArgs),
}

#[derive(clap::Args, Debug)]
pub struct RankArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,
}

#[derive(clap::Args, Debug)]
pub struct SetStatusArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,

    /// Solution ID (SOL-...)
    pub solution: String,

    /// New status (proposed, approved, implemented)
    pub status: SolutionStatus,
}

pub fn run(cmd: SolutionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SolutionCommands::Rank(args) => run_rank(args, global),
        SolutionCommands::SetStatus(args) => run_set_status(args, global),
    }
}

fn run_rank(args: RankArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;
    let ranking = session.engine.rank_solutions(&project)?;
    let format = session.format(global);

    if let f @ (OutputFormat::Json | OutputFormat::Yaml) = format {
        return print_structured(&ranking, f);
    }

    if ranking.ranked.is_empty() {
        if format == OutputFormat::Auto && !global.quiet {
            println!("No candidate solutions recorded.");
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = ranking
        .ranked
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.rank.to_string(),
                truncate_str(&r.title, 40),
                format!("{:.2}", r.score),
                r.status.to_string(),
            ]
        })
        .collect();
    print_rows(format, &["ID", "RANK", "TITLE", "SCORE", "STATUS"], &rows)?;

    if format == OutputFormat::Auto && !global.quiet {
        if let Some(best) = ranking.recommended() {
            println!(
                "Recommended ({}): {} {}",
                ranking.strategy.name(),
                style(&best.id.to_string()).cyan(),
                style(&best.title).yellow()
            );
        }
    }
    Ok(())
}

fn run_set_status(args: SetStatusArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;
    let solution = args
        .solution
        .parse::<EntityId>()
        .map_err(|e| miette::miette!("invalid solution ID '{}': {}", args.solution, e))?;

    let updated = session
        .engine
        .set_solution_status(&project, &solution, args.status)?;

    match session.format(global) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&updated, f)?,
        OutputFormat::Id => println!("{}", updated.id),
        _ if global.quiet => {}
        _ => {
            println!(
                "{} {} is now {}",
                style("✓").green(),
                style(&updated.id.to_string()).cyan(),
                style(updated.status).bold()
            );
        }
    }
    Ok(())
}
