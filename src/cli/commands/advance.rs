//! `dmaic advance` command - Move a project to its next phase

use console::style;
use miette::Result;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct AdvanceArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,
}

pub fn run(args: AdvanceArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;
    let advance = session.engine.advance_phase(&project)?;

    match session.format(global) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&advance, f)?,
        OutputFormat::Id => println!("{}", advance.phase),
        _ if global.quiet => println!("{}", advance.phase),
        _ => {
            println!(
                "{} {} advanced {} → {}",
                style("✓").green(),
                style(&advance.project.to_string()).cyan(),
                advance.from,
                style(advance.phase).bold()
            );
            println!("   Completion:    {}%", advance.completion);
            println!("   Quality score: {:.1}", advance.quality_score);
            println!("   Risk level:    {}", advance.risk_level);
        }
    }
    Ok(())
}
