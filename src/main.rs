use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use dmaic::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) so piping to
    // `head` or `grep -q` does not panic on a closed stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(global.verbose);

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Project(cmd) => commands::project::run(cmd, &global),
        Commands::Submit(args) => commands::submit::run(args, &global),
        Commands::Gate(args) => commands::gate::run(args, &global),
        Commands::Advance(args) => commands::advance::run(args, &global),
        Commands::Status(args) => commands::status::run(args, &global),
        Commands::Solution(cmd) => commands::solution::run(cmd, &global),
        Commands::Metrics(args) => commands::metrics::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the verbosity flag
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
