//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = config::resolve_path(cli.config)?;
    let settings = config::load(&config_path, cli.cadir)?;
    debug!(
        config = %config_path.display(),
        cadir = %settings.cadir.display(),
        "loaded settings"
    );

    let ctx = commands::Context {
        config_path,
        settings,
        output_format: cli.output.unwrap_or_default(),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Getcert(args) => commands::getcert::execute(ctx, args).await,
        Commands::Sign(args) => commands::sign::execute(ctx, args).await,
        Commands::Clean(args) => commands::clean::execute(ctx, args).await,
        Commands::List(args) => commands::list::execute(ctx, args).await,
        Commands::Inspect(args) => commands::inspect::execute(ctx, args).await,
        Commands::Generate(args) => commands::generate::execute(ctx, args).await,
        Commands::Autosign(args) => commands::autosign::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}

/// Log to stderr, filtered by `RUST_LOG` or else by `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
