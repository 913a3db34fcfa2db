//! Application health probes.

use super::{check_endpoint, elapsed_ms, fetch, run_registered, ProbeContext};
use crate::engine::phase::{Phase, PhaseResult, Probe};
use crate::net::url;
use crate::net::HttpRequest;
use crate::CheckResult;
use serde_json::Value;
use std::time::Instant;

/// `status` values in a health body that mean the service is down
const UNHEALTHY_STATES: [&str; 3] = ["unhealthy", "down", "error"];

pub static PROBES: [Probe; 5] = [
    Probe {
        name: "health_endpoint",
        description: "GET /health succeeds and does not report unhealthy",
        run: check_health_endpoint,
    },
    Probe {
        name: "frontend_health",
        description: "GET /health.html succeeds",
        run: check_frontend_health,
    },
    Probe {
        name: "api_health",
        description: "GET /api/health succeeds",
        run: check_api_health,
    },
    Probe {
        name: "api_status",
        description: "GET /api/status succeeds",
        run: check_api_status,
    },
    Probe {
        name: "root_content",
        description: "GET / succeeds with a non-empty body",
        run: check_root_content,
    },
];

pub fn validate_application_health(ctx: &ProbeContext<'_>) -> PhaseResult {
    run_registered(Phase::Health, ctx)
}

pub fn check_health_endpoint(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let endpoint = match url::join_path(ctx.url(), "/health") {
        Ok(u) => u,
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };

    let response = match fetch(ctx, HttpRequest::get(endpoint.as_str()), start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    if !response.is_success() {
        return CheckResult::fail(duration_ms, format!("/health returned HTTP {}", response.status))
            .with_status(response.status);
    }

    // Non-JSON bodies are fine; a JSON body may carry a status field
    let body: Option<Value> = serde_json::from_slice(&response.body).ok();
    let reported = body
        .as_ref()
        .and_then(|b| b.get("status"))
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase);

    let result = match reported {
        Some(ref state) if UNHEALTHY_STATES.contains(&state.as_str()) => {
            CheckResult::fail(duration_ms, format!("health endpoint reports '{}'", state))
        }
        _ => CheckResult::pass(duration_ms),
    };

    let result = result.with_status(response.status);
    match body {
        Some(body) => result.with_detail("body", body),
        None => result,
    }
}

pub fn check_frontend_health(ctx: &ProbeContext<'_>) -> CheckResult {
    check_endpoint(ctx, "/health.html")
}

pub fn check_api_health(ctx: &ProbeContext<'_>) -> CheckResult {
    check_endpoint(ctx, "/api/health")
}

pub fn check_api_status(ctx: &ProbeContext<'_>) -> CheckResult {
    check_endpoint(ctx, "/api/status")
}

pub fn check_root_content(ctx: &ProbeContext<'_>) -> CheckResult {
    let start = Instant::now();
    let root = match url::join_path(ctx.url(), "/") {
        Ok(u) => u,
        Err(e) => return CheckResult::from_error(&e, elapsed_ms(start)),
    };

    let response = match fetch(ctx, HttpRequest::get(root.as_str()), start) {
        Ok(r) => r,
        Err(failed) => return failed,
    };
    let duration_ms = elapsed_ms(start);

    let result = if !response.is_success() {
        CheckResult::fail(duration_ms, format!("/ returned HTTP {}", response.status))
    } else if response.body.iter().all(u8::is_ascii_whitespace) {
        CheckResult::fail(duration_ms, "root page body is empty")
    } else {
        CheckResult::pass(duration_ms)
    };

    let result = result
        .with_status(response.status)
        .with_detail("bytes", response.body.len() as u64);
    match response.header("content-type") {
        Some(content_type) => result.with_detail("content_type", content_type),
        None => result,
    }
}
