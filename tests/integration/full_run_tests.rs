//! Full run integration tests.
//!
//! Tests for complete validation runs against simulated deployments,
//! including the tiered status policy, events and the result store.

use crate::mocks::{MockSite, MockSiteConfig, SITE_URL};
use deploy_check::checks::platform::ROUTE_PROBE_PATH;
use deploy_check::engine::events::ValidationEvent;
use deploy_check::net::Method;
use deploy_check::{
    DeploymentConfig, OverallStatus, Phase, PhaseStatus, Platform, Settings, Validator,
};
use std::sync::{Arc, Mutex};

fn validator(config: MockSiteConfig) -> Validator {
    Validator::new(Arc::new(MockSite::new(config)), Settings::default())
}

fn run(config: MockSiteConfig) -> Arc<deploy_check::engine::result::ValidationResult> {
    validator(config).validate_deployment(&DeploymentConfig::new(SITE_URL))
}

fn phase_status(
    result: &deploy_check::engine::result::ValidationResult,
    phase: Phase,
) -> PhaseStatus {
    result.phase(phase).map(|p| p.status).unwrap_or(PhaseStatus::Failed)
}

// =============================================================================
// Overall status
// =============================================================================

#[test]
fn test_healthy_deployment_passes() {
    let result = run(MockSiteConfig::healthy());

    assert_eq!(result.status, OverallStatus::Passed);
    assert!(result.error.is_none());
    assert_eq!(result.phases.len(), 5);
    assert_eq!(result.summary.total_checks, 21);
    assert_eq!(result.summary.passed_checks, 21);
    assert_eq!(result.summary.phases_passed, 5);
    assert!(result.summary.issues.is_empty());
    assert!(result.summary.recommendations.is_empty());
}

#[test]
fn test_phases_run_in_fixed_order() {
    let result = run(MockSiteConfig::healthy());
    let order: Vec<Phase> = result.phases.iter().map(|p| p.phase).collect();
    assert_eq!(order, Phase::ALL.to_vec());
}

#[test]
fn test_matching_platform_fingerprint_passes() {
    let v = validator(MockSiteConfig::vercel());
    let config = DeploymentConfig::new(SITE_URL).with_platform(Platform::Vercel);
    let result = v.validate_deployment(&config);

    assert_eq!(result.status, OverallStatus::Passed);
    assert_eq!(result.platform, Platform::Vercel);
    assert!(result.phase(Phase::Platform).unwrap().check("platform_headers").unwrap().passed);
}

#[test]
fn test_wrong_platform_is_warning() {
    // 2 of 3 platform checks is below 80%, optional phases all pass
    let v = validator(MockSiteConfig::healthy());
    let config = DeploymentConfig::new(SITE_URL).with_platform(Platform::Netlify);
    let result = v.validate_deployment(&config);

    assert_eq!(phase_status(&result, Phase::Platform), PhaseStatus::Failed);
    assert_eq!(result.status, OverallStatus::Warning);
    assert_eq!(result.status.exit_code(), 2);
}

#[test]
fn test_wrong_platform_and_failing_optionals_fails() {
    let mut site = MockSiteConfig::slow();
    site.security_headers = false;
    site.powered_by = Some("PHP/8.1".to_string());

    let v = validator(site);
    let config = DeploymentConfig::new(SITE_URL).with_platform(Platform::Cloudflare);
    let result = v.validate_deployment(&config);

    assert_eq!(phase_status(&result, Phase::Connectivity), PhaseStatus::Passed);
    assert_eq!(phase_status(&result, Phase::Health), PhaseStatus::Passed);
    assert_eq!(phase_status(&result, Phase::Platform), PhaseStatus::Failed);
    assert_eq!(phase_status(&result, Phase::Performance), PhaseStatus::Failed);
    assert_eq!(phase_status(&result, Phase::Security), PhaseStatus::Failed);
    assert_eq!(result.status, OverallStatus::Failed);
}

#[test]
fn test_unreachable_deployment_fails() {
    let result = run(MockSiteConfig::unreachable());

    assert_eq!(result.status, OverallStatus::Failed);
    assert!(result.error.is_none());

    let connectivity = result.phase(Phase::Connectivity).unwrap();
    assert_eq!(connectivity.status, PhaseStatus::Failed);
    let http = connectivity.check("http_response").unwrap();
    assert!(!http.passed);
    assert!(http.error.as_deref().unwrap().contains("connection refused"));
    // DNS still answers
    assert!(connectivity.check("dns_resolution").unwrap().passed);
}

#[test]
fn test_missing_health_endpoints_fail() {
    let result = run(MockSiteConfig::no_health_endpoints());

    let health = result.phase(Phase::Health).unwrap();
    assert_eq!((health.passed, health.total), (1, 5));
    assert_eq!(health.status, PhaseStatus::Failed);
    assert_eq!(result.status, OverallStatus::Failed);
    assert!(result
        .summary
        .issues
        .iter()
        .any(|i| i.starts_with("health phase failed (1/5 checks passed, 80% required)")));
}

#[test]
fn test_single_unhealthy_report_stays_within_threshold() {
    let result = run(MockSiteConfig::health_reports_down());

    let health = result.phase(Phase::Health).unwrap();
    assert_eq!((health.passed, health.total), (4, 5));
    assert_eq!(health.status, PhaseStatus::Passed);

    let endpoint = health.check("health_endpoint").unwrap();
    assert!(!endpoint.passed);
    assert_eq!(endpoint.details["body"]["status"], "down");
    assert_eq!(result.status, OverallStatus::Passed);
}

#[test]
fn test_weak_security_is_warning() {
    let result = run(MockSiteConfig::weak_security());

    let security = result.phase(Phase::Security).unwrap();
    assert_eq!((security.passed, security.total), (2, 5));
    assert_eq!(result.status, OverallStatus::Warning);
    assert!(!result.summary.recommendations.is_empty());
}

#[test]
fn test_slow_deployment_is_warning() {
    let result = run(MockSiteConfig::slow());

    let performance = result.phase(Phase::Performance).unwrap();
    assert!(!performance.check("load_time").unwrap().passed);
    assert!(!performance.check("response_time").unwrap().passed);
    assert_eq!(performance.status, PhaseStatus::Failed);
    assert_eq!(result.status, OverallStatus::Warning);
}

#[test]
fn test_budgets_come_from_settings() {
    let mut settings = Settings::default();
    settings.performance.load_time_budget_ms = 5_000;
    settings.performance.response_time_budget_ms = 2_000;

    let v = Validator::new(Arc::new(MockSite::new(MockSiteConfig::slow())), settings);
    let result = v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    assert_eq!(phase_status(&result, Phase::Performance), PhaseStatus::Passed);
    assert_eq!(result.status, OverallStatus::Passed);
}

#[test]
fn test_plain_http_url_fails_connectivity() {
    let v = validator(MockSiteConfig::plain_http());
    let result = v.validate_deployment(&DeploymentConfig::new("http://app.example.com"));

    let redirect = result
        .phase(Phase::Connectivity)
        .unwrap()
        .check("https_redirect")
        .unwrap();
    assert!(!redirect.passed);
    assert_eq!(redirect.reason.as_deref(), Some("URL is not HTTPS"));

    let security = result.phase(Phase::Security).unwrap();
    assert!(!security.check("https_enabled").unwrap().passed);
    assert!(security.check("mixed_content").unwrap().passed);

    assert_eq!(result.status, OverallStatus::Failed);
}

#[test]
fn test_http_served_without_redirect_fails() {
    let result = run(MockSiteConfig::plain_http());

    let redirect = result
        .phase(Phase::Connectivity)
        .unwrap()
        .check("https_redirect")
        .unwrap();
    assert!(!redirect.passed);
    assert_eq!(redirect.status, Some(200));
    assert_eq!(result.status, OverallStatus::Failed);
}

#[test]
fn test_phase_subset_counts_missing_phases_as_failed() {
    let v = validator(MockSiteConfig::healthy()).with_phases(&[Phase::Security]);
    let result = v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    assert_eq!(result.phases.len(), 1);
    assert_eq!(phase_status(&result, Phase::Security), PhaseStatus::Passed);
    assert_eq!(result.status, OverallStatus::Failed);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_invalid_url_is_error() {
    let v = validator(MockSiteConfig::healthy());
    let result = v.validate_deployment(&DeploymentConfig::new("ftp://app.example.com"));

    assert_eq!(result.status, OverallStatus::Error);
    assert_eq!(result.status.exit_code(), 3);
    assert!(result.phases.is_empty());
    assert!(result.error.as_deref().unwrap().contains("unsupported scheme"));
}

#[test]
fn test_transport_panic_becomes_error_result() {
    let v = validator(MockSiteConfig::panicking());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    v.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    let result = v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    assert_eq!(result.status, OverallStatus::Error);
    assert!(result.phases.is_empty());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("simulated transport fault"));

    let stored = v.get_validation_results(&result.validation_id).unwrap();
    assert!(Arc::ptr_eq(&stored, &result));

    let events = events.lock().unwrap();
    assert_eq!(events.first().map(|e| e.name()), Some("validation:start"));
    match events.last() {
        Some(ValidationEvent::Error { validation_id, error }) => {
            assert_eq!(validation_id, &result.validation_id);
            assert!(error.contains("simulated transport fault"));
        }
        other => panic!("expected error event, got {:?}", other.map(|e| e.name())),
    }
    assert!(!events.iter().any(|e| e.name() == "validation:complete"));
}

// =============================================================================
// Timing and identity
// =============================================================================

#[test]
fn test_duration_matches_timestamps() {
    let result = run(MockSiteConfig::healthy());

    assert!(result.end_time >= result.start_time);
    let span = (result.end_time - result.start_time).num_milliseconds();
    assert_eq!(result.duration_ms as i64, span);
}

#[test]
fn test_stored_result_is_same_instance() {
    let v = validator(MockSiteConfig::healthy());
    let result = v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    let stored = v.get_validation_results(&result.validation_id).unwrap();
    assert!(Arc::ptr_eq(&stored, &result));
    assert!(v.get_validation_results("validation_0_unknown").is_none());
}

#[test]
fn test_store_evicts_oldest() {
    let mut settings = Settings::default();
    settings.store.capacity = 2;
    let v = Validator::new(Arc::new(MockSite::healthy()), settings);

    let config = DeploymentConfig::new(SITE_URL);
    let first = v.validate_deployment(&config);
    let second = v.validate_deployment(&config);
    let third = v.validate_deployment(&config);

    assert!(v.get_validation_results(&first.validation_id).is_none());
    assert_eq!(
        v.list_validations(),
        vec![second.validation_id.clone(), third.validation_id.clone()]
    );
}

#[test]
fn test_concurrent_runs_get_unique_ids() {
    let v = validator(MockSiteConfig::healthy());
    let config = DeploymentConfig::new(SITE_URL);

    let mut ids: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| v.validate_deployment(&config).validation_id.clone()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(v.list_validations().len(), 8);
    for id in &ids {
        assert_eq!(v.get_validation_results(id).unwrap().status, OverallStatus::Passed);
    }
}

#[test]
fn test_separate_validators_never_share_ids() {
    let first = validator(MockSiteConfig::healthy());
    let second = validator(MockSiteConfig::healthy());
    let config = DeploymentConfig::new(SITE_URL);

    let a = first.validate_deployment(&config);
    let b = second.validate_deployment(&config);
    assert_ne!(a.validation_id, b.validation_id);

    // each store only knows its own run
    assert!(first.get_validation_results(&b.validation_id).is_none());
    assert!(second.get_validation_results(&a.validation_id).is_none());
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn test_progress_events_follow_phase_order() {
    let v = validator(MockSiteConfig::healthy());
    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    v.subscribe(move |e| {
        if let ValidationEvent::Progress {
            phase,
            completed,
            total,
            ..
        } = e
        {
            sink.lock().unwrap().push((*phase, *completed, *total));
        }
    });

    v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    let progress = progress.lock().unwrap();
    assert_eq!(
        *progress,
        vec![
            (Phase::Connectivity, 1, 5),
            (Phase::Platform, 2, 5),
            (Phase::Health, 3, 5),
            (Phase::Performance, 4, 5),
            (Phase::Security, 5, 5),
        ]
    );
}

#[test]
fn test_complete_event_carries_stored_result() {
    let v = validator(MockSiteConfig::healthy());
    let completed = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&completed);
    v.subscribe(move |e| {
        if let ValidationEvent::Complete { result, .. } = e {
            *sink.lock().unwrap() = Some(Arc::clone(result));
        }
    });

    let result = v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    let from_event = completed.lock().unwrap().clone().unwrap();
    assert!(Arc::ptr_eq(&from_event, &result));
}

#[test]
fn test_panicking_listener_does_not_abort_run() {
    let v = validator(MockSiteConfig::healthy());
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    v.subscribe(|_| panic!("listener bug"));
    v.subscribe(move |_| *sink.lock().unwrap() += 1);

    let result = v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    assert_eq!(result.status, OverallStatus::Passed);
    // start, 5 progress, complete
    assert_eq!(*count.lock().unwrap(), 7);
}

#[test]
fn test_unsubscribed_listener_is_not_called() {
    let v = validator(MockSiteConfig::healthy());
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let id = v.subscribe(move |_| *sink.lock().unwrap() += 1);
    assert!(v.unsubscribe(id));
    assert!(!v.unsubscribe(id));

    v.validate_deployment(&DeploymentConfig::new(SITE_URL));
    assert_eq!(*count.lock().unwrap(), 0);
}

#[test]
fn test_requests_issued_by_full_run() {
    let site = Arc::new(MockSite::healthy());
    let v = Validator::new(site.clone(), Settings::default());
    v.validate_deployment(&DeploymentConfig::new(SITE_URL));

    let requests = site.requests();
    let preflight = requests
        .iter()
        .find(|r| r.method == Method::Options)
        .unwrap();
    assert!(preflight
        .headers
        .iter()
        .any(|(name, _)| name == "Origin"));

    let plain = requests
        .iter()
        .find(|r| r.url.starts_with("http://"))
        .unwrap();
    assert!(!plain.follow_redirects);

    assert!(requests
        .iter()
        .any(|r| r.url.ends_with(ROUTE_PROBE_PATH)));
}
