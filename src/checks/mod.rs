//! Probe modules, one per phase.
//!
//! - Connectivity: reachability, HTTPS redirect, DNS, CORS
//! - Platform: hosting fingerprint, SPA routing, compression
//! - Health: health endpoints and root content
//! - Performance: load time, response time, page weight, caching
//! - Security: HTTPS, security headers, HSTS, disclosure, mixed content
//!
//! # Graceful Degradation
//!
//! All probes follow these rules:
//! - Transport error: `passed: false` with `error` and the elapsed duration
//! - Unexpected status: `passed: false` with `status` and a `reason`
//! - Unparsable body: treated as opaque content, never an error on its own
//!
//! Probes never return `Err` and never retry.

pub mod connectivity;
pub mod health;
pub mod performance;
pub mod platform;
pub mod security;

use crate::engine::phase::{self, Phase, PhaseResult, Probe};
use crate::net::{HttpRequest, HttpResponse, Transport};
use crate::settings::Settings;
use crate::{CheckResult, DeploymentConfig};
use std::time::Instant;

/// Everything a probe needs for one run.
pub struct ProbeContext<'a> {
    pub transport: &'a dyn Transport,
    pub config: &'a DeploymentConfig,
    pub settings: &'a Settings,
}

impl ProbeContext<'_> {
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

/// Probes registered for a phase, in run order.
pub fn probes_for(phase: Phase) -> &'static [Probe] {
    match phase {
        Phase::Connectivity => &connectivity::PROBES[..],
        Phase::Platform => &platform::PROBES[..],
        Phase::Health => &health::PROBES[..],
        Phase::Performance => &performance::PROBES[..],
        Phase::Security => &security::PROBES[..],
    }
}

/// Run one phase.
pub fn run_phase(phase: Phase, ctx: &ProbeContext<'_>) -> PhaseResult {
    match phase {
        Phase::Connectivity => connectivity::validate_connectivity(ctx),
        Phase::Platform => platform::validate_platform(ctx),
        Phase::Health => health::validate_application_health(ctx),
        Phase::Performance => performance::validate_performance(ctx),
        Phase::Security => security::validate_security(ctx),
    }
}

pub(crate) fn run_registered(phase: Phase, ctx: &ProbeContext<'_>) -> PhaseResult {
    phase::run_probes(phase, probes_for(phase), ctx)
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Send a request; a transport error becomes the probe's failed result.
pub(crate) fn fetch(
    ctx: &ProbeContext<'_>,
    request: HttpRequest,
    start: Instant,
) -> Result<HttpResponse, CheckResult> {
    ctx.transport
        .send(&request)
        .map_err(|e| CheckResult::from_error(&e, elapsed_ms(start)))
}

/// GET an origin-relative path and pass on 2xx.
pub(crate) fn check_endpoint(ctx: &ProbeContext<'_>, path: &str) -> CheckResult {
    let start = Instant::now();
    let url = match crate::net::url::join_path(ctx.url(), path) {
        Ok(url) => url,
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };

    let response = match fetch(ctx, HttpRequest::get(url.as_str()), start) {
        Ok(r) => r,
        Err(failed) => return failed.with_detail("endpoint", url),
    };
    let duration_ms = elapsed_ms(start);

    let result = if response.is_success() {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(duration_ms, format!("{} returned HTTP {}", path, response.status))
    };
    result.with_status(response.status).with_detail("endpoint", url)
}
