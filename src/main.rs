use clap::Parser;
use miette::Result;
use stash::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` or `grep -q` exits quietly.
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
        Commands::Init(args) => stash::cli::commands::init::run(args, &global),
        Commands::Wish(cmd) => stash::cli::commands::wish::run(cmd, &global),
        Commands::Bin(cmd) => stash::cli::commands::bin::run(cmd, &global),
        Commands::Sync(cmd) => stash::cli::commands::sync::run(cmd, &global),
        Commands::Completions(args) => stash::cli::commands::completions::run(args),
    }
}

/// Log to stderr. `STASH_LOG` wins over `RUST_LOG`, which wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "stash=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("STASH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
