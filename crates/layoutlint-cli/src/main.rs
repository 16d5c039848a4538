//! Layoutlint CLI: lint rendered pages for layout defects
//!
//! ## Usage
//!
//! ```bash
//! layoutlint check https://shop.test/cart
//! layoutlint check --snapshot cart.json --format json
//! ```

use clap::Parser;
use layoutlint_cli::{
    handlers, init_logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the lint run found errors
fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(&config);

    match cli.command {
        Commands::Check(args) => handlers::check(&config, &args),
        Commands::Capture(args) => handlers::capture(&config, &args).map(|()| false),
        Commands::Rules => {
            handlers::list_rules(&config);
            Ok(false)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color))
}
