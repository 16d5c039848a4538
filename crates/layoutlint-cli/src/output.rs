//! Result formatting

use crate::error::CliResult;
use console::Style;
use layoutlint::{LintMessage, LintResult, Severity};
use std::fmt::Write;

/// Renders lint results for the terminal
#[derive(Debug, Clone, Copy)]
pub struct Stylish {
    use_color: bool,
}

impl Stylish {
    /// Create a renderer
    #[must_use]
    pub const fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, style: Style, text: impl std::fmt::Display) -> String {
        style.force_styling(self.use_color).apply_to(text).to_string()
    }

    fn severity(&self, severity: Severity) -> String {
        let label = format!("{:<5}", severity.as_str());
        let style = match severity {
            Severity::Error => Style::new().red(),
            Severity::Warn => Style::new().yellow(),
            Severity::Info | Severity::Off => Style::new().cyan(),
        };
        self.paint(style, label)
    }

    fn message(&self, out: &mut String, message: &LintMessage) {
        let _ = writeln!(
            out,
            "  {}  {}  {}",
            self.severity(message.severity),
            message.message,
            self.paint(Style::new().dim(), &message.rule_id)
        );
        let _ = writeln!(out, "         {}", message.location.element.selector);
        for relation in &message.relations {
            let _ = writeln!(
                out,
                "         {}: {}",
                relation.description, relation.location.element.selector
            );
        }
    }

    /// Render every result, grouped per page, followed by a summary line
    #[must_use]
    pub fn render(&self, results: &[LintResult]) -> String {
        let mut out = String::new();
        for result in results.iter().filter(|r| !r.messages.is_empty()) {
            let _ = writeln!(out, "{}", self.paint(Style::new().underlined(), &result.url));
            for message in &result.messages {
                self.message(&mut out, message);
            }
            out.push('\n');
        }
        out.push_str(&self.summary(results));
        out.push('\n');
        out
    }

    /// One-line totals across `results`
    #[must_use]
    pub fn summary(&self, results: &[LintResult]) -> String {
        let errors: usize = results.iter().map(|r| r.error_count).sum();
        let warnings: usize = results.iter().map(|r| r.warning_count).sum();
        let infos: usize = results.iter().map(|r| r.info_count).sum();
        let suppressed: usize = results.iter().map(|r| r.suppressed_messages.len()).sum();
        let total = errors + warnings + infos;

        if total == 0 {
            let mut line = format!("No layout problems in {} page(s)", results.len());
            if suppressed > 0 {
                let _ = write!(line, " ({suppressed} suppressed)");
            }
            return self.paint(Style::new().green().bold(), line);
        }

        let mut line = format!(
            "{total} problem(s) ({errors} error(s), {warnings} warning(s), {infos} info)"
        );
        if suppressed > 0 {
            let _ = write!(line, ", {suppressed} suppressed");
        }
        let style = if errors > 0 {
            Style::new().red().bold()
        } else {
            Style::new().yellow().bold()
        };
        self.paint(style, line)
    }
}

/// JSON array of results
pub fn render_json(results: &[LintResult]) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
