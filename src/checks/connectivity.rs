//! Connectivity probes.
//!
//! The target must answer, resolve, redirect plain HTTP to HTTPS and respond
//! to a CORS preflight. Every check must pass.

use super::{elapsed_ms, fetch, run_registered, ProbeContext};
use crate::engine::phase::{Phase, PhaseResult, Probe};
use crate::net::url;
use crate::net::HttpRequest;
use crate::{CheckResult, DeployCheckError};
use serde_json::Value;
use std::time::Instant;

/// Origin sent with the CORS preflight
const PREFLIGHT_ORIGIN: &str = "https://deploy-check.invalid";

pub static PROBES: [Probe; 4] = [
    Probe {
        name: "http_response",
        description: "Target answers GET with a 2xx or 3xx status",
        run: check_http_response,
    },
    Probe {
        name: "https_redirect",
        description: "Plain HTTP redirects to HTTPS",
        run: check_https_redirect,
    },
    Probe {
        name: "dns_resolution",
        description: "Host name resolves to at least one address",
        run: check_dns_resolution,
    },
    Probe {
        name: "cors_configuration",
        description: "CORS preflight is answered without a server error",
        run: check_cors_configuration,
    },
];

pub fn validate_connectivity(ctx: &ProbeContext<'_>) -> PhaseResult {
    run_registered(Phase::Connectivity, ctx)
}

pub fn check_http_response(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let response = match fetch(ctx, HttpRequest::get(ctx.url()), start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    if response.is_success() || response.is_redirect() {
        CheckResult::pass(duration_ms).with_status(response.status)
    } else {
        CheckResult::fail(duration_ms, format!("unexpected HTTP {}", response.status))
            .with_status(response.status)
    }
}

/// Non-HTTPS targets fail immediately without any request.
pub fn check_https_redirect(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    if !url::is_https(ctx.url()) {
        return CheckResult::fail(elapsed_ms(start), "URL is not HTTPS");
    }

    let plain = match url::with_scheme(ctx.url(), "http") {
        Ok(u) => u,
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };

    let response = match ctx.transport.send(&HttpRequest::get(plain.as_str()).no_redirects()) {
        Ok(r) => r,
        // HTTPS-only hosts may not listen on port 80 at all
        Err(DeployCheckError::Connect { .. }) => {
            return CheckResult::pass(elapsed_ms(start))
                .with_reason("plain HTTP port closed")
                .with_detail("http_url", plain);
        }
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };
    let duration_ms = elapsed_ms(start);

    let location = response.header("location").unwrap_or_default().to_string();
    let result = if response.is_redirect() && location.starts_with("https://") {
        CheckResult::pass(duration_ms)
    } else if response.is_redirect() {
        CheckResult::fail(duration_ms, format!("redirects to non-HTTPS location '{}'", location))
    } else {
        CheckResult::fail(duration_ms, "plain HTTP is served without redirect")
    };

    let result = result.with_status(response.status);
    if location.is_empty() {
        result
    } else {
        result.with_detail("location", location)
    }
}

pub fn check_dns_resolution(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let host = match url::host(ctx.url()) {
        Ok(h) => h,
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };

    match ctx.transport.resolve(&host) {
        Ok(addrs) => {
            let addresses: Vec<Value> = addrs.iter().map(|a| Value::from(a.to_string())).collect();
            CheckResult::pass(elapsed_ms(start))
                .with_detail("host", host)
                .with_detail("addresses", addresses)
        }
        Err(e) => CheckResult::from_error(&e, elapsed_ms(start)).with_detail("host", host),
    }
}

pub fn check_cors_configuration(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let request = HttpRequest::options(ctx.url())
        .header("Origin", PREFLIGHT_ORIGIN)
        .header("Access-Control-Request-Method", "GET");

    let response = match fetch(ctx, request, start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let result = if response.status < 500 {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(duration_ms, format!("preflight returned HTTP {}", response.status))
    };

    let result = result.with_status(response.status);
    match response.header("access-control-allow-origin") {
        Some(origin) => result.with_detail("allow_origin", origin),
        None => result,
    }
}
