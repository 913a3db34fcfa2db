//! Security posture probes.
//!
//! Checks HTTPS, the common hardening headers, HSTS strength, server
//! fingerprint disclosure and mixed content in the served page.

use super::{elapsed_ms, fetch, run_registered, ProbeContext};
use crate::engine::phase::{Phase, PhaseResult, Probe};
use crate::net::url;
use crate::net::{HttpRequest, HttpResponse};
use crate::CheckResult;
use serde_json::Value;
use std::time::Instant;

/// Headers counted by `security_headers`
pub const SECURITY_HEADERS: [&str; 5] = [
    "strict-transport-security",
    "x-content-type-options",
    "x-frame-options",
    "content-security-policy",
    "referrer-policy",
];

/// Minimum of `SECURITY_HEADERS` that must be present
pub const MIN_SECURITY_HEADERS: usize = 3;

/// 180 days
pub const MIN_HSTS_MAX_AGE: u64 = 15_552_000;

pub static PROBES: [Probe; 5] = [
    Probe {
        name: "https_enabled",
        description: "Deployment URL uses HTTPS",
        run: check_https_enabled,
    },
    Probe {
        name: "security_headers",
        description: "At least 3 of the standard security headers are set",
        run: check_security_headers,
    },
    Probe {
        name: "hsts",
        description: "Strict-Transport-Security with max-age of at least 180 days",
        run: check_hsts,
    },
    Probe {
        name: "server_disclosure",
        description: "No X-Powered-By and no versioned Server header",
        run: check_server_disclosure,
    },
    Probe {
        name: "mixed_content",
        description: "HTTPS page does not load subresources over HTTP",
        run: check_mixed_content,
    },
];

pub fn validate_security(ctx: &ProbeContext<'_>) -> PhaseResult {
    run_registered(Phase::Security, ctx)
}

fn load_page(ctx: &ProbeContext<'_>) -> Result<(HttpResponse, Instant), CheckResult> {
    let start = Instant::now();
    fetch(ctx, HttpRequest::get(ctx.url()), start).map(|r| (r, start))
}

pub fn check_https_enabled(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    if url::is_https(ctx.url()) {
        CheckResult::pass(elapsed_ms(start))
    } else {
        CheckResult::fail(elapsed_ms(start), "URL is not HTTPS")
    }
}

pub fn check_security_headers(ctx: &ProbeContext<'_>) -> CheckResult {
    let (response, start) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let (present, missing): (Vec<&str>, Vec<&str>) = SECURITY_HEADERS
        .iter()
        .copied()
        .partition(|h| response.has_header(h));

    let result = if present.len() >= MIN_SECURITY_HEADERS {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(
            duration_ms,
            format!(
                "{} of {} security headers present, {} required",
                present.len(),
                SECURITY_HEADERS.len(),
                MIN_SECURITY_HEADERS
            ),
        )
    };

    let to_json = |v: &[&str]| Value::from(v.iter().map(|s| Value::from(*s)).collect::<Vec<_>>());
    result
        .with_status(response.status)
        .with_detail("present", to_json(&present))
        .with_detail("missing", to_json(&missing))
}

/// `max-age` directive of a Strict-Transport-Security value.
pub fn hsts_max_age(value: &str) -> Option<u64> {
    value.split(';').find_map(|directive| {
        let (key, val) = directive.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("max-age") {
            val.trim().trim_matches('"').parse().ok()
        } else {
            None
        }
    })
}

pub fn check_hsts(ctx: &ProbeContext<'_>) -> CheckResult {
    let (response, start) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let header = match response.header("strict-transport-security") {
        Some(h) => h.to_string(),
        None => {
            return CheckResult::fail(duration_ms, "Strict-Transport-Security header missing")
                .with_status(response.status);
        }
    };

    let result = match hsts_max_age(&header) {
        Some(age) if age >= MIN_HSTS_MAX_AGE => CheckResult::pass(duration_ms),
        Some(age) => CheckResult::fail(
            duration_ms,
            format!("HSTS max-age {} below {}", age, MIN_HSTS_MAX_AGE),
        ),
        None => CheckResult::fail(duration_ms, "HSTS header has no valid max-age"),
    };
    result
        .with_status(response.status)
        .with_detail("header", header)
}

/// True when a Server value carries a version, e.g. `nginx/1.18.0`.
fn server_is_versioned(value: &str) -> bool {
    value
        .split('/')
        .skip(1)
        .any(|part| part.starts_with(|c: char| c.is_ascii_digit()))
}

pub fn check_server_disclosure(ctx: &ProbeContext<'_>) -> CheckResult {
    let (response, start) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let result = if let Some(powered_by) = response.header("x-powered-by") {
        CheckResult::fail(duration_ms, format!("X-Powered-By discloses '{}'", powered_by))
    } else if let Some(server) = response.header("server").filter(|s| server_is_versioned(s)) {
        CheckResult::fail(duration_ms, format!("Server header discloses version '{}'", server))
    } else {
        CheckResult::pass(duration_ms)
    };
    result.with_status(response.status)
}

/// Count `src="http://` and `href="http://` references, either quote style.
fn insecure_references(body: &str) -> usize {
    let lower = body.to_ascii_lowercase();
    ["src=\"http://", "src='http://", "href=\"http://", "href='http://"]
        .iter()
        .map(|pattern| lower.matches(pattern).count())
        .sum()
}

pub fn check_mixed_content(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    if !url::is_https(ctx.url()) {
        return CheckResult::pass(elapsed_ms(start)).with_reason("not applicable over plain HTTP");
    }

    let (response, start) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let count = insecure_references(&response.body_text());
    let result = if count == 0 {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(duration_ms, format!("{} insecure subresource reference(s)", count))
    };
    result
        .with_status(response.status)
        .with_detail("insecure_references", count as u64)
}
