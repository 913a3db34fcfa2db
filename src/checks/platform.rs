//! Platform probes.
//!
//! Confirms the deployment is actually served by the declared hosting
//! platform and that the platform is configured for the application type.

use super::{elapsed_ms, fetch, run_registered, ProbeContext};
use crate::engine::phase::{Phase, PhaseResult, Probe};
use crate::net::url;
use crate::net::HttpRequest;
use crate::{AppType, CheckResult, Platform};
use std::time::Instant;

/// Deep route that no application defines. SPAs should fall back to their
/// index page for it; everything else should answer 404.
pub const ROUTE_PROBE_PATH: &str = "/__deploy-check/route-probe";

pub static PROBES: [Probe; 3] = [
    Probe {
        name: "platform_headers",
        description: "Response carries the hosting platform's fingerprint header",
        run: check_platform_headers,
    },
    Probe {
        name: "spa_routing",
        description: "Unknown deep routes fall back (SPA) or return 404 (others)",
        run: check_spa_routing,
    },
    Probe {
        name: "compression",
        description: "Responses are compressed when the client accepts it",
        run: check_compression,
    },
];

/// Header (and optional value fragment) that identifies a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub header: &'static str,
    pub value_contains: Option<&'static str>,
}

pub fn fingerprint(platform: Platform) -> Option<Fingerprint> {
    match platform {
        Platform::Vercel => Some(Fingerprint {
            header: "x-vercel-id",
            value_contains: None,
        }),
        Platform::Netlify => Some(Fingerprint {
            header: "x-nf-request-id",
            value_contains: None,
        }),
        Platform::GithubPages => Some(Fingerprint {
            header: "server",
            value_contains: Some("github.com"),
        }),
        Platform::Cloudflare => Some(Fingerprint {
            header: "cf-ray",
            value_contains: None,
        }),
        Platform::Docker | Platform::Custom => None,
    }
}

pub fn validate_platform(ctx: &ProbeContext<'_>) -> PhaseResult {
    run_registered(Phase::Platform, ctx)
}

pub fn check_platform_headers(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let platform = ctx.config.platform;

    let expected = match fingerprint(platform) {
        Some(f) => f,
        None => {
            return CheckResult::pass(elapsed_ms(start))
                .with_reason(format!("no fingerprint required for {}", platform));
        }
    };

    let response = match fetch(ctx, HttpRequest::head(ctx.url()), start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let matched = response.header(expected.header).is_some_and(|value| {
        expected
            .value_contains
            .map(|needle| value.to_ascii_lowercase().contains(needle))
            .unwrap_or(true)
    });

    let result = if matched {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(
            duration_ms,
            format!("{} fingerprint header '{}' not found", platform, expected.header),
        )
    };
    result
        .with_status(response.status)
        .with_detail("platform", platform.as_str())
        .with_detail("header", expected.header)
}

pub fn check_spa_routing(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let route = match url::join_path(ctx.url(), ROUTE_PROBE_PATH) {
        Ok(u) => u,
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };

    let response = match fetch(ctx, HttpRequest::get(route.as_str()), start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let app_type = ctx.config.app_type;
    let result = match app_type {
        AppType::Spa if response.is_success() => CheckResult::pass(duration_ms),
        AppType::Spa => CheckResult::fail(
            duration_ms,
            format!("deep route returned HTTP {}, expected SPA fallback", response.status),
        ),
        _ if response.status == 404 => CheckResult::pass(duration_ms),
        _ => CheckResult::fail(
            duration_ms,
            format!("unknown route returned HTTP {}, expected 404", response.status),
        ),
    };
    result
        .with_status(response.status)
        .with_detail("app_type", app_type.as_str())
}

pub fn check_compression(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let request = HttpRequest::get(ctx.url()).header("Accept-Encoding", "gzip, br");
    let response = match fetch(ctx, request, start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    match response.header("content-encoding") {
        Some(encoding) => CheckResult::pass(duration_ms)
            .with_status(response.status)
            .with_detail("encoding", encoding),
        None => CheckResult::fail(duration_ms, "response is not compressed")
            .with_status(response.status),
    }
}
