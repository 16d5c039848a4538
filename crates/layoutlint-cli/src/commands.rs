//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use layoutlint::Severity;
use std::path::PathBuf;

/// Layoutlint: find layout defects in rendered pages without reference screenshots
#[derive(Parser, Debug)]
#[command(name = "layoutlint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lint pages and recorded snapshots
    Check(CheckArgs),

    /// Record a page's layout snapshot for offline checks
    Capture(CaptureArgs),

    /// List built-in rules
    Rules,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Page URLs to lint (needs the `browser` feature)
    pub urls: Vec<String>,

    /// Recorded snapshot files to lint
    #[arg(short, long = "snapshot", value_name = "FILE")]
    pub snapshots: Vec<PathBuf>,

    /// Configuration file (defaults to .layoutlint.yaml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "stylish")]
    pub format: OutputFormat,

    /// Override a rule's severity, e.g. `--rule misalignment=off`
    #[arg(short, long = "rule", value_name = "ID=SEVERITY", value_parser = parse_rule_override)]
    pub rules: Vec<(String, Severity)>,

    /// Pages linted at the same time (overrides the configuration)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

impl CheckArgs {
    /// Whether anything was given to lint
    #[must_use]
    pub fn has_targets(&self) -> bool {
        !self.urls.is_empty() || !self.snapshots.is_empty()
    }
}

/// Arguments for the capture command
#[derive(Parser, Debug)]
pub struct CaptureArgs {
    /// Page URL
    pub url: String,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Configuration file (viewport and scope)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Options for the chromium instance
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Chromium executable
    #[arg(long, value_name = "PATH", env = "LAYOUTLINT_CHROMIUM")]
    pub chromium: Option<String>,
}

/// Output format for lint results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable, grouped per page
    #[default]
    Stylish,
    /// JSON array of results
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

fn parse_rule_override(s: &str) -> Result<(String, Severity), String> {
    let (id, severity) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=SEVERITY, got '{s}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing rule id in '{s}'"));
    }
    let severity = severity.parse::<Severity>().map_err(|e| e.to_string())?;
    Ok((id.to_string(), severity))
}
