//! `dmaic init` command - Initialize a new DMAIC workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::repository::SqliteRepository;
use crate::core::workspace::{Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the config even if .dmaic/ already exists (the database is kept)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    // Create directory if it doesn't exist
    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            // Create the database up front so schema problems surface here
            let config = Config::load(Some(&workspace));
            let db_path = config.database_path(&workspace);
            SqliteRepository::open(&db_path, config.busy_timeout())
                .map_err(|e| miette::miette!("cannot create {}: {}", db_path.display(), e))?;

            if global.quiet {
                return Ok(());
            }
            println!(
                "{} Initialized DMAIC workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!(
                "  {} Start a project",
                style("dmaic project new --name <NAME>").yellow()
            );
            println!(
                "  {} Record DEFINE artifacts",
                style("dmaic submit <PROJECT> --phase define --file define.yaml").yellow()
            );
            println!(
                "  {} Check what the gate still needs",
                style("dmaic gate <PROJECT>").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} DMAIC workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("dmaic init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
