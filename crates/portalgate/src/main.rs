mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let debug_log = config::debug_log_enabled(&cli.global, &config::load_config_or_default());
    init_tracing(cli.global.verbose, debug_log);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `RUST_LOG` wins; otherwise `-v` count, with the profile's `debug_log`
/// raising portalgate's own crates to debug.
fn init_tracing(verbosity: u8, debug_log: bool) {
    let filter = match (verbosity, debug_log) {
        (0, false) => "warn",
        (0, true) => "warn,portalgate=debug,portalgate_core=debug,portalgate_api=debug",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Authorize(args) => commands::authorize::handle(&args, &cli.global).await,
        Command::Login => commands::login::handle(&cli.global).await,
        Command::Variants(args) => commands::variants::handle(&args, &cli.global),
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "portalgate", &mut std::io::stdout());
            Ok(())
        }
    }
}
