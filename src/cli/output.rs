//! Output formatting for deploy-check.
//!
//! Provides terminal, JSON, and JUnit XML output formatters.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output: color disabled via NO_COLOR or --no-color
//! - Errored runs: header, error line and summary, no phase sections
//! - Empty phase list: valid output with zero checks
//!
//! All formatters produce valid output for any ValidationResult input.

use crate::cli::args::OutputFormat;
use crate::engine::phase::PhaseResult;
use crate::engine::result::{OverallStatus, ValidationResult};

const RULE: &str = "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a validation result into a string
    fn format(&self, result: &ValidationResult) -> String;
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn status_badge(&self, status: OverallStatus) -> String {
        match status {
            OverallStatus::Passed => self.green("PASSED"),
            OverallStatus::Warning => self.yellow("WARNING"),
            OverallStatus::Failed => self.red("FAILED"),
            OverallStatus::Error => self.red("ERROR"),
        }
    }

    fn format_phase(&self, phase: &PhaseResult, output: &mut String) {
        let badge = if phase.is_passed() {
            self.green("[PASS]")
        } else {
            self.red("[FAIL]")
        };
        output.push_str(&format!(
            "{} {} ({}/{} checks, {}% required)\n",
            badge,
            phase.phase.as_str().to_uppercase(),
            phase.passed,
            phase.total,
            phase.phase.threshold_pct()
        ));

        for check in &phase.checks {
            if self.quiet && check.result.passed {
                continue;
            }
            let mark = if check.result.passed {
                self.green("ok ")
            } else {
                self.red("err")
            };
            let message = if self.verbose {
                format!("{} ({}ms)", check.result.message(), check.result.duration_ms)
            } else {
                check.result.message()
            };
            output.push_str(&format!("  {} {}: {}\n", mark, check.name, message));

            if self.verbose && !check.result.details.is_empty() {
                for (key, value) in &check.result.details {
                    output.push_str(&format!("        {} = {}\n", key, value));
                }
            }
        }
        output.push('\n');
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, result: &ValidationResult) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str("deploy-check validation report\n");
        output.push_str(&format!("URL: {}\n", result.url));
        output.push_str(&format!("Platform: {}\n", result.platform));
        output.push_str(&format!("Validation: {}\n", result.validation_id));
        output.push_str(&format!("Started: {}\n", result.start_time.to_rfc3339()));
        output.push_str(RULE);
        output.push_str("\n\n");

        if let Some(ref error) = result.error {
            output.push_str(&format!("{} {}\n\n", self.red("Error:"), error));
        }

        for phase in &result.phases {
            if self.quiet && phase.is_passed() {
                continue;
            }
            self.format_phase(phase, &mut output);
        }

        let summary = &result.summary;
        if !summary.issues.is_empty() && !self.quiet {
            output.push_str("ISSUES\n");
            for issue in &summary.issues {
                output.push_str(&format!("  - {}\n", issue));
            }
            output.push('\n');
        }
        if !summary.recommendations.is_empty() {
            output.push_str("RECOMMENDATIONS\n");
            for rec in &summary.recommendations {
                output.push_str(&format!("  - {}\n", rec));
            }
            output.push('\n');
        }

        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} ({} of {} phases passed, {} of {} checks passed)\n",
            self.status_badge(result.status),
            summary.phases_passed,
            summary.phases_total,
            summary.passed_checks,
            summary.total_checks
        ));
        output.push_str(&format!(
            "Total time: {:.1}s\n",
            result.duration_ms as f64 / 1000.0
        ));
        output.push_str(&format!(
            "Exit code: {} ({})\n",
            result.status.exit_code(),
            result.status
        ));
        output.push_str(RULE);

        output
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &ValidationResult) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        };
        rendered.unwrap_or_else(|e| {
            serde_json::json!({
                "validation_id": result.validation_id,
                "status": "error",
                "error": format!("failed to serialize result: {}", e),
            })
            .to_string()
        })
    }
}

/// JUnit XML formatter
pub struct JunitFormatter;

impl JunitFormatter {
    pub fn new() -> Self {
        JunitFormatter
    }

    fn escape_xml(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                '"' => result.push_str("&quot;"),
                '\'' => result.push_str("&apos;"),
                c => result.push(c),
            }
        }
        result
    }
}

impl Default for JunitFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JunitFormatter {
    fn format(&self, result: &ValidationResult) -> String {
        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let summary = &result.summary;
        let errors = if result.status == OverallStatus::Error { 1 } else { 0 };
        output.push_str(&format!(
            "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">\n",
            Self::escape_xml(&result.validation_id),
            summary.total_checks,
            summary.total_checks - summary.passed_checks,
            errors,
            result.duration_ms as f64 / 1000.0
        ));

        if let Some(ref error) = result.error {
            output.push_str("  <testsuite name=\"validation\" tests=\"1\" failures=\"0\" errors=\"1\">\n");
            output.push_str("    <testcase name=\"run\" classname=\"deploy-check.validation\">\n");
            output.push_str(&format!(
                "      <error message=\"{}\" />\n",
                Self::escape_xml(error)
            ));
            output.push_str("    </testcase>\n");
            output.push_str("  </testsuite>\n");
        }

        for phase in &result.phases {
            output.push_str(&format!(
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
                phase.phase,
                phase.total,
                phase.total - phase.passed,
                phase.duration_ms() as f64 / 1000.0
            ));

            for check in &phase.checks {
                output.push_str(&format!(
                    "    <testcase name=\"{}\" classname=\"deploy-check.{}\" time=\"{:.3}\"",
                    Self::escape_xml(&check.name),
                    phase.phase,
                    check.result.duration_ms as f64 / 1000.0
                ));

                if check.result.passed {
                    output.push_str(">\n");
                    output.push_str(&format!(
                        "      <system-out>{}</system-out>\n",
                        Self::escape_xml(&check.result.message())
                    ));
                } else {
                    output.push_str(">\n");
                    output.push_str(&format!(
                        "      <failure message=\"{}\" />\n",
                        Self::escape_xml(&check.result.message())
                    ));
                }
                output.push_str("    </testcase>\n");
            }

            output.push_str("  </testsuite>\n");
        }

        output.push_str("</testsuites>");
        output
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(
    format: OutputFormat,
    no_color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => {
            let color = !no_color && std::env::var_os("NO_COLOR").is_none();
            Box::new(TerminalFormatter::new(color, verbose, quiet))
        }
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Junit => Box::new(JunitFormatter::new()),
    }
}
