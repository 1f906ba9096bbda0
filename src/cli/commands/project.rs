//! `dmaic project` command - Project creation and listing

use console::style;
use miette::Result;

use crate::cli::helpers::{print_rows, print_structured, truncate_str, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::NewProject;

#[derive(clap::Subcommand, Debug)]
pub enum ProjectCommands {
    /// Start a new project in the DEFINE phase
    New(NewArgs),

    /// List all projects
    List,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Why the project is worth doing
    #[arg(long, default_value = "")]
    pub business_case: String,

    /// Where the improved process will run
    #[arg(long)]
    pub deployment_target: Option<String>,

    /// Budget limit (must not be negative)
    #[arg(long)]
    pub budget: Option<f64>,

    /// Timeline in days (at least 1)
    #[arg(long)]
    pub timeline_days: Option<u32>,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::New(args) => run_new(args, global),
        ProjectCommands::List => run_list(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.engine.create_project(NewProject {
        name: args.name,
        business_case: args.business_case,
        deployment_target: args.deployment_target,
        budget_limit: args.budget,
        timeline_days: args.timeline_days,
    })?;

    match session.format(global) {
        OutputFormat::Id => println!("{}", project.id),
        OutputFormat::Json => print_structured(&project, OutputFormat::Json)?,
        OutputFormat::Yaml => print_structured(&project, OutputFormat::Yaml)?,
        _ if global.quiet => println!("{}", project.id),
        _ => {
            println!(
                "{} Created project {} ({})",
                style("✓").green(),
                style(&project.id.to_string()).cyan(),
                style(&project.name).yellow()
            );
            println!("   Phase: {}", project.phase);
        }
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let projects = session.engine.list_projects()?;
    let format = session.format(global);

    if projects.is_empty() {
        match format {
            OutputFormat::Json | OutputFormat::Yaml => println!("[]"),
            OutputFormat::Auto if !global.quiet => {
                println!("No projects found.");
                println!();
                println!(
                    "Create one with: {}",
                    style("dmaic project new --name <NAME>").yellow()
                );
            }
            _ => {}
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&projects, format),
        _ => {
            let rows: Vec<Vec<String>> = projects
                .iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        truncate_str(&p.name, 40),
                        p.phase.to_string(),
                        p.completion.to_string(),
                        format!("{:.1}", p.quality_score),
                        p.risk_level.to_string(),
                    ]
                })
                .collect();
            print_rows(
                format,
                &["ID", "NAME", "PHASE", "COMPLETION", "QUALITY", "RISK"],
                &rows,
            )?;
            if format == OutputFormat::Auto && !global.quiet {
                println!("{} project(s) found", style(projects.len()).cyan());
            }
            Ok(())
        }
    }
}
