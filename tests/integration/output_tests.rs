//! Output formatting tests.
//!
//! Tests for terminal, JSON, and JUnit XML output formatters over results of
//! real runs against simulated deployments.

use crate::mocks::{MockSite, MockSiteConfig, SITE_URL};
use deploy_check::cli::args::OutputFormat;
use deploy_check::cli::output::{
    get_formatter, JsonFormatter, JunitFormatter, OutputFormatter, TerminalFormatter,
};
use deploy_check::engine::result::ValidationResult;
use deploy_check::{DeploymentConfig, OverallStatus, Settings, Validator};
use std::sync::Arc;

fn result_for(config: MockSiteConfig, url: &str) -> Arc<ValidationResult> {
    Validator::new(Arc::new(MockSite::new(config)), Settings::default())
        .validate_deployment(&DeploymentConfig::new(url))
}

// =============================================================================
// Terminal
// =============================================================================

#[test]
fn test_terminal_healthy_report() {
    let result = result_for(MockSiteConfig::healthy(), SITE_URL);
    let output = TerminalFormatter::new(false, false, false).format(&result);

    assert!(output.contains(&format!("URL: {}", SITE_URL)));
    assert!(output.contains("[PASS] CONNECTIVITY (4/4 checks, 100% required)"));
    assert!(output.contains("[PASS] SECURITY (5/5 checks, 90% required)"));
    assert!(output.contains("SUMMARY: PASSED (5 of 5 phases passed, 21 of 21 checks passed)"));
    assert!(output.contains("Exit code: 0 (passed)"));
    assert!(!output.contains("ISSUES"));
    assert!(!output.contains('\x1b'));
}

#[test]
fn test_terminal_lists_issues_and_recommendations() {
    let result = result_for(MockSiteConfig::weak_security(), SITE_URL);
    let output = TerminalFormatter::new(false, false, false).format(&result);

    assert!(output.contains("[FAIL] SECURITY (2/5 checks, 90% required)"));
    assert!(output.contains("ISSUES"));
    assert!(output.contains("security.server_disclosure: X-Powered-By discloses 'Express'"));
    assert!(output.contains("RECOMMENDATIONS"));
    assert!(output.contains("SUMMARY: WARNING"));
}

#[test]
fn test_terminal_quiet_hides_passing_phases() {
    let result = result_for(MockSiteConfig::weak_security(), SITE_URL);
    let output = TerminalFormatter::new(false, false, true).format(&result);

    assert!(!output.contains("CONNECTIVITY"));
    assert!(output.contains("SECURITY"));
    // passing checks inside a failing phase are hidden too
    assert!(!output.contains("https_enabled"));
    assert!(output.contains("security_headers"));
}

#[test]
fn test_terminal_verbose_shows_details() {
    let result = result_for(MockSiteConfig::healthy(), SITE_URL);
    let output = TerminalFormatter::new(false, true, false).format(&result);

    assert!(output.contains("addresses = "));
    assert!(output.contains("93.184.216.34"));
}

#[test]
fn test_terminal_color_codes() {
    let result = result_for(MockSiteConfig::healthy(), SITE_URL);
    let output = TerminalFormatter::new(true, false, false).format(&result);
    assert!(output.contains("\x1b[32m"));
}

#[test]
fn test_terminal_error_run() {
    let result = result_for(MockSiteConfig::healthy(), "not a url");
    let output = TerminalFormatter::new(false, false, false).format(&result);

    assert!(output.contains("Error: invalid config field 'url'"));
    assert!(output.contains("SUMMARY: ERROR"));
    assert!(output.contains("Exit code: 3 (error)"));
}

// =============================================================================
// JSON
// =============================================================================

#[test]
fn test_json_parses_back() {
    let result = result_for(MockSiteConfig::slow(), SITE_URL);
    let output = JsonFormatter::new(true).format(&result);

    let parsed: ValidationResult = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed, *result);
}

#[test]
fn test_json_shape() {
    let result = result_for(MockSiteConfig::healthy(), SITE_URL);
    let output = JsonFormatter::new(false).format(&result);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["status"], "passed");
    assert_eq!(value["platform"], "custom");
    assert_eq!(value["phases"].as_object().unwrap().len(), 5);
    assert_eq!(value["phases"]["connectivity"]["phase"], "connectivity");
    assert_eq!(value["phases"]["connectivity"]["checks"]["http_response"]["passed"], true);
    assert_eq!(value["phases"]["security"]["checks"].as_object().unwrap().len(), 5);
    // phases appear in run order
    let pos = |key: &str| output.find(&format!("\"{}\":{{", key)).unwrap();
    assert!(pos("connectivity") < pos("platform"));
    assert!(pos("health") < pos("performance"));
    assert!(pos("performance") < pos("security"));
    assert!(value.get("error").is_none());
    assert!(!output.contains('\n'));
}

#[test]
fn test_json_error_field() {
    let result = result_for(MockSiteConfig::panicking(), SITE_URL);
    let output = JsonFormatter::new(true).format(&result);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["status"], "error");
    assert!(value["error"].as_str().unwrap().contains("simulated transport fault"));
}

// =============================================================================
// JUnit
// =============================================================================

#[test]
fn test_junit_structure() {
    let result = result_for(MockSiteConfig::slow(), SITE_URL);
    let output = JunitFormatter::new().format(&result);

    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(output.contains("<testsuites name=\"validation_"));
    assert!(output.contains("tests=\"21\" failures=\"2\" errors=\"0\""));
    assert_eq!(output.matches("<testsuite ").count(), 5);
    assert_eq!(output.matches("<testcase ").count(), 21);
    assert_eq!(output.matches("<failure ").count(), 2);
    assert!(output.contains("classname=\"deploy-check.performance\""));
    assert!(output.ends_with("</testsuites>"));
}

#[test]
fn test_junit_escapes_messages() {
    let mut config = MockSiteConfig::weak_security();
    config.powered_by = Some("<Express & Co>".to_string());
    let result = result_for(config, SITE_URL);
    let output = JunitFormatter::new().format(&result);

    assert!(output.contains("&lt;Express &amp; Co&gt;"));
    assert!(!output.contains("<Express"));
}

#[test]
fn test_junit_error_run() {
    let result = result_for(MockSiteConfig::panicking(), SITE_URL);
    assert_eq!(result.status, OverallStatus::Error);
    let output = JunitFormatter::new().format(&result);

    assert!(output.contains("errors=\"1\""));
    assert!(output.contains("<error message=\"internal error: simulated transport fault\" />"));
    assert_eq!(output.matches("<testsuite ").count(), 1);
}

// =============================================================================
// Formatter selection
// =============================================================================

#[test]
fn test_get_formatter_matches_format() {
    let result = result_for(MockSiteConfig::healthy(), SITE_URL);

    let json = get_formatter(OutputFormat::Json, true, false, false).format(&result);
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

    let junit = get_formatter(OutputFormat::Junit, true, false, false).format(&result);
    assert!(junit.starts_with("<?xml"));

    let text = get_formatter(OutputFormat::Text, true, false, false).format(&result);
    assert!(text.contains("deploy-check validation report"));
    assert!(!text.contains('\x1b'));
}
