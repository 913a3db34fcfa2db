//! Performance probes.
//!
//! Budgets come from `[performance]` in the settings file. Timings are those
//! measured by the transport, not wall-clock time around the probe.

use super::{elapsed_ms, fetch, run_registered, ProbeContext};
use crate::engine::phase::{Phase, PhaseResult, Probe};
use crate::net::{HttpRequest, HttpResponse};
use crate::CheckResult;
use std::time::Instant;

pub static PROBES: [Probe; 4] = [
    Probe {
        name: "load_time",
        description: "Full page load within the load time budget",
        run: check_load_time,
    },
    Probe {
        name: "response_time",
        description: "Response headers within the response time budget",
        run: check_response_time,
    },
    Probe {
        name: "page_size",
        description: "Page body within the size budget",
        run: check_page_size,
    },
    Probe {
        name: "caching_headers",
        description: "Cache-Control or ETag present",
        run: check_caching_headers,
    },
];

pub fn validate_performance(ctx: &ProbeContext<'_>) -> PhaseResult {
    run_registered(Phase::Performance, ctx)
}

fn load_page(ctx: &ProbeContext<'_>) -> Result<(HttpResponse, u64), CheckResult> {
    let start = Instant::now();
    let response = fetch(ctx, HttpRequest::get(ctx.url()), start)?;
    if !response.is_success() {
        return Err(
            CheckResult::fail(elapsed_ms(start), format!("page returned HTTP {}", response.status))
                .with_status(response.status),
        );
    }
    Ok((response, elapsed_ms(start)))
}

pub fn check_load_time(ctx: &ProbeContext<'_>) -> CheckResult {
    let budget = ctx.settings.performance.load_time_budget_ms;
    let (response, duration_ms) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };

    let result = if response.total_ms <= budget {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(
            duration_ms,
            format!("page loaded in {}ms, budget {}ms", response.total_ms, budget),
        )
    };
    result
        .with_status(response.status)
        .with_detail("load_time_ms", response.total_ms)
        .with_detail("budget_ms", budget)
}

pub fn check_response_time(ctx: &ProbeContext<'_>) -> CheckResult {
    let budget = ctx.settings.performance.response_time_budget_ms;
    let (response, duration_ms) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };

    let result = if response.headers_ms <= budget {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(
            duration_ms,
            format!("first response after {}ms, budget {}ms", response.headers_ms, budget),
        )
    };
    result
        .with_status(response.status)
        .with_detail("response_time_ms", response.headers_ms)
        .with_detail("budget_ms", budget)
}

pub fn check_page_size(ctx: &ProbeContext<'_>) -> CheckResult {
    let budget = ctx.settings.performance.max_page_bytes;
    let (response, duration_ms) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };

    let size = response.body.len() as u64;
    let result = if size <= budget {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(duration_ms, format!("page is {} bytes, budget {} bytes", size, budget))
    };
    result
        .with_status(response.status)
        .with_detail("bytes", size)
        .with_detail("budget_bytes", budget)
}

pub fn check_caching_headers(ctx: &ProbeContext<'_>) -> CheckResult {
    let (response, duration_ms) = match load_page(ctx) {
        Ok(v) => v,
        Err(failed) => return failed,
    };

    let cache_control = response.header("cache-control").map(str::to_string);
    let etag = response.has_header("etag");

    let result = if cache_control.is_some() || etag {
        CheckResult::pass(duration_ms)
    } else {
        CheckResult::fail(duration_ms, "neither Cache-Control nor ETag is set")
    };
    let result = result.with_status(response.status).with_detail("etag", etag);
    match cache_control {
        Some(value) => result.with_detail("cache_control", value),
        None => result,
    }
}
