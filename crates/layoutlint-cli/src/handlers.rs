//! Subcommand implementations

use crate::commands::{CaptureArgs, CheckArgs, OutputFormat};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render_json, Stylish};
use futures::future::BoxFuture;
use futures::FutureExt;
use layoutlint::{
    LintConfig, LintResult, LinterResult, Page, RuleRegistry, StaticPage, DEFAULT_CONFIG_FILE,
};
use std::path::Path;
use tracing::{error, info};

/// Load `path`, else `.layoutlint.yaml` in the working directory, else defaults
pub fn load_config(path: Option<&Path>) -> CliResult<LintConfig> {
    if let Some(path) = path {
        return Ok(LintConfig::from_path(path)?);
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.is_file() {
        info!(path = DEFAULT_CONFIG_FILE, "using configuration file");
        return Ok(LintConfig::from_path(default)?);
    }
    Ok(LintConfig::default())
}

/// Lint every target; returns whether anything failed or reported an error
pub fn check(config: &CliConfig, args: &CheckArgs) -> CliResult<bool> {
    if !args.has_targets() {
        return Err(CliError::invalid_argument(
            "nothing to lint; pass URLs or --snapshot files",
        ));
    }
    if args.concurrency == Some(0) {
        return Err(CliError::invalid_argument("--concurrency must be at least 1"));
    }

    let mut lint_config = load_config(args.config.as_deref())?;
    for (id, severity) in &args.rules {
        lint_config.set_severity(id.clone(), *severity);
    }
    if let Some(concurrency) = args.concurrency {
        lint_config.concurrency = concurrency;
    }

    let rt = tokio::runtime::Runtime::new()?;
    let (labels, results) = rt.block_on(lint_targets(&lint_config, args))?;

    let mut failed = false;
    let mut linted = Vec::with_capacity(results.len());
    for (label, result) in labels.iter().zip(results) {
        match result {
            Ok(result) => linted.push(result),
            Err(e) => {
                failed = true;
                error!(page = %label, error = %e, "page visit failed");
                eprintln!("Error: {label}: {e}");
            }
        }
    }

    let has_errors = linted.iter().any(LintResult::has_errors);
    match args.format {
        OutputFormat::Json => println!("{}", render_json(&linted)?),
        OutputFormat::Stylish => {
            if !config.verbosity.is_quiet() || has_errors {
                print!("{}", Stylish::new(config.color.should_color()).render(&linted));
            }
        }
    }
    Ok(failed || has_errors)
}

type Visit<'a> = BoxFuture<'a, LinterResult<Box<dyn Page>>>;

async fn lint_targets(
    lint_config: &LintConfig,
    args: &CheckArgs,
) -> CliResult<(Vec<String>, Vec<LinterResult<LintResult>>)> {
    let linter = lint_config.builder(RuleRegistry::builtin()).build()?;
    let labels: Vec<String> = args
        .urls
        .iter()
        .cloned()
        .chain(args.snapshots.iter().map(|p| p.display().to_string()))
        .collect();
    let snapshots = args.snapshots.iter().map(|path| open_snapshot(path));

    if args.urls.is_empty() {
        let results = linter
            .lint_all(snapshots.collect::<Vec<_>>(), lint_config.concurrency)
            .await;
        return Ok((labels, results));
    }

    #[cfg(feature = "browser")]
    {
        let browser = launch(lint_config, &args.browser).await?;
        let pages = args.urls.iter().map(|url| open_url(&browser, url));
        let results = linter
            .lint_all(pages.chain(snapshots).collect::<Vec<_>>(), lint_config.concurrency)
            .await;
        browser.close().await?;
        Ok((labels, results))
    }

    #[cfg(not(feature = "browser"))]
    {
        Err(CliError::FeatureDisabled { feature: "browser" })
    }
}

fn open_snapshot(path: &Path) -> Visit<'_> {
    async move { Ok(Box::new(StaticPage::from_path(path)?) as Box<dyn Page>) }.boxed()
}

#[cfg(feature = "browser")]
fn open_url<'a>(browser: &'a layoutlint::Browser, url: &'a str) -> Visit<'a> {
    async move { Ok(Box::new(browser.open(url).await?) as Box<dyn Page>) }.boxed()
}

#[cfg(feature = "browser")]
async fn launch(
    lint_config: &LintConfig,
    args: &crate::commands::BrowserArgs,
) -> CliResult<layoutlint::Browser> {
    let mut config = layoutlint::BrowserConfig::default()
        .with_viewport(lint_config.viewport)
        .with_reset(lint_config.reset)
        .with_headless(!args.headed);
    if args.no_sandbox {
        config = config.with_no_sandbox();
    }
    if let Some(path) = &args.chromium {
        config = config.with_chromium_path(path.clone());
    }
    Ok(layoutlint::Browser::launch(config).await?)
}

/// Record `args.url` as a snapshot file
pub fn capture(config: &CliConfig, args: &CaptureArgs) -> CliResult<()> {
    let lint_config = load_config(args.config.as_deref())?;

    #[cfg(feature = "browser")]
    {
        let rt = tokio::runtime::Runtime::new()?;
        let snapshot = rt.block_on(async {
            let browser = launch(&lint_config, &args.browser).await?;
            let mut page = browser.open(&args.url).await?;
            let scope = page.resolve_scope(&lint_config.scope_spec()).await?;
            let snapshot = page.snapshot(&scope).await;
            page.dispose_scope(scope).await?;
            page.close().await?;
            browser.close().await?;
            Ok::<_, CliError>(snapshot?)
        })?;
        std::fs::write(&args.output, serde_json::to_string_pretty(&snapshot)?)?;
        if !config.verbosity.is_quiet() {
            println!(
                "Captured {} element(s) from {} to {}",
                snapshot.len(),
                args.url,
                args.output.display()
            );
        }
        Ok(())
    }

    #[cfg(not(feature = "browser"))]
    {
        let _ = (config, lint_config);
        Err(CliError::FeatureDisabled { feature: "browser" })
    }
}

/// Print the built-in rules with their default severity
pub fn list_rules(config: &CliConfig) {
    let registry = RuleRegistry::builtin();
    let use_color = config.color.should_color();
    for rule in registry.iter() {
        let meta = rule.meta();
        let severity = console::style(format!("{:<5}", meta.severity.as_str())).bold();
        println!(
            "{:<26} {}  {}",
            rule.id(),
            severity.force_styling(use_color),
            meta.description
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use layoutlint::Severity;

    mod config_tests {
        use super::*;

        #[test]
        fn test_explicit_path() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("lint.yaml");
            std::fs::write(&path, "rules:\n  misalignment: error\nconcurrency: 2\n").unwrap();
            let config = load_config(Some(path.as_path())).unwrap();
            assert_eq!(config.concurrency, 2);
            assert_eq!(config.rules["misalignment"].severity(), Severity::Error);
        }

        #[test]
        fn test_missing_path_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            assert!(matches!(
                load_config(Some(dir.path().join("absent.yaml").as_path())),
                Err(CliError::Lint(_))
            ));
        }
    }

    mod check_tests {
        use super::*;
        use crate::commands::{Cli, Commands};
        use clap::Parser;

        fn check_args(argv: &[&str]) -> CheckArgs {
            let mut full = vec!["layoutlint", "check"];
            full.extend_from_slice(argv);
            let Commands::Check(args) = Cli::parse_from(full).command else {
                panic!("expected check");
            };
            args
        }

        #[test]
        fn test_requires_targets() {
            let err = check(&CliConfig::default(), &check_args(&[])).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }

        #[test]
        fn test_zero_concurrency_rejected() {
            let err = check(&CliConfig::default(), &check_args(&["-s", "a.json", "-j", "0"]))
                .unwrap_err();
            assert!(err.to_string().contains("concurrency"));
        }

        #[test]
        fn test_unknown_rule_override_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let config = dir.path().join("lint.yaml");
            std::fs::write(&config, "{}").unwrap();
            let err = check(
                &CliConfig::default(),
                &check_args(&[
                    "-s",
                    "a.json",
                    "-c",
                    config.to_str().unwrap(),
                    "--rule",
                    "no-such-rule=warn",
                ]),
            )
            .unwrap_err();
            assert!(err.to_string().contains("unknown rule 'no-such-rule'"));
        }
    }
}
