//! Layoutlint CLI library
//!
//! ## Usage
//!
//! ```bash
//! layoutlint check https://shop.test/cart          # Lint a live page
//! layoutlint check --snapshot cart.json            # Lint a recorded snapshot
//! layoutlint check --rule misalignment=off URL     # Override a rule
//! layoutlint capture https://shop.test -o cart.json
//! layoutlint rules
//! ```

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    BrowserArgs, CaptureArgs, CheckArgs, Cli, ColorArg, Commands, OutputFormat,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_json, Stylish};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr tracing subscriber; `RUST_LOG` wins over `-v`/`-q`
pub fn init_logging(config: &CliConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.verbosity.is_verbose())
                .with_ansi(config.color.should_color()),
        )
        .try_init();
}
