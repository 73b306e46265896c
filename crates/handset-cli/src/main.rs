//! Handset CLI: run device automation step scripts
//!
//! ## Usage
//!
//! ```bash
//! handset list                          # Show every step phrase
//! handset check login.steps             # Resolve steps without a device
//! handset run login.steps --mock        # Run against a mock device
//! handset run login.steps -c cloud.yaml # Run on a device cloud
//! ```

use clap::Parser;
use handset_cli::{handlers, logging, Cli, CliConfig, CliResult, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    config.apply_colors();
    logging::init_logging(config.verbosity);

    match cli.command {
        Commands::List(args) => handlers::run_list(&args),
        Commands::Check(args) => handlers::run_check(&config, &args),
        Commands::Run(args) => handlers::run_scenarios(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
}
