//! Phases and phase aggregation.
//!
//! A phase runs its probes serially and passes when
//! `passed / total >= threshold`. Thresholds are fixed per phase.

use crate::checks::ProbeContext;
use crate::{CheckResult, DeployCheckError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// One named group of related checks, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Connectivity,
    Platform,
    Health,
    Performance,
    Security,
}

/// Weight of a phase in the overall status policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTier {
    /// Must pass for the run to pass
    Critical,
    /// Decides between the lenient and strict optional cutoffs
    Important,
    /// Counted as a pass rate
    Optional,
}

impl Phase {
    /// All phases in the fixed run order.
    pub const ALL: [Phase; 5] = [
        Phase::Connectivity,
        Phase::Platform,
        Phase::Health,
        Phase::Performance,
        Phase::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Connectivity => "connectivity",
            Phase::Platform => "platform",
            Phase::Health => "health",
            Phase::Performance => "performance",
            Phase::Security => "security",
        }
    }

    /// Pass threshold as a percentage of checks.
    pub fn threshold_pct(&self) -> u32 {
        match self {
            Phase::Connectivity => 100,
            Phase::Platform => 80,
            Phase::Health => 80,
            Phase::Performance => 70,
            Phase::Security => 90,
        }
    }

    pub fn tier(&self) -> PhaseTier {
        match self {
            Phase::Connectivity | Phase::Health => PhaseTier::Critical,
            Phase::Platform => PhaseTier::Important,
            Phase::Performance | Phase::Security => PhaseTier::Optional,
        }
    }

    /// Fixed remediation hint used in run summaries.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Phase::Connectivity => {
                "Verify the deployment URL is reachable, DNS points at the host and HTTP redirects to HTTPS"
            }
            Phase::Platform => {
                "Review platform configuration: SPA fallback routing, compression and platform headers"
            }
            Phase::Health => {
                "Expose /health and /api/health endpoints and make sure backing services report healthy"
            }
            Phase::Performance => {
                "Reduce page weight, enable caching headers and check server response times"
            }
            Phase::Security => {
                "Serve over HTTPS and add HSTS, Content-Security-Policy, X-Frame-Options and X-Content-Type-Options headers"
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = DeployCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| DeployCheckError::InvalidConfig {
                field: "phase".to_string(),
                message: format!(
                    "unknown phase '{}'. Valid phases: connectivity, platform, health, performance, security",
                    s
                ),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Passed,
    Failed,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStatus::Passed => write!(f, "passed"),
            PhaseStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A probe result under its name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCheck {
    pub name: String,
    pub result: CheckResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub passed: u32,
    pub total: u32,
    /// Checks in the order they ran. Serialized as an object keyed by
    /// check name, keys in run order.
    #[serde(with = "checks_by_name")]
    pub checks: Vec<NamedCheck>,
}

mod checks_by_name {
    use super::NamedCheck;
    use crate::CheckResult;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(checks: &Vec<NamedCheck>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(checks.len()))?;
        for check in checks {
            map.serialize_entry(&check.name, &check.result)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<NamedCheck>, D::Error> {
        struct ChecksVisitor;

        impl<'de> Visitor<'de> for ChecksVisitor {
            type Value = Vec<NamedCheck>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of check name to check result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut checks = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, result)) = access.next_entry::<String, CheckResult>()? {
                    checks.push(NamedCheck { name, result });
                }
                Ok(checks)
            }
        }

        deserializer.deserialize_map(ChecksVisitor)
    }
}

impl PhaseResult {
    /// Aggregate probe results against the phase threshold.
    pub fn from_checks(phase: Phase, checks: Vec<NamedCheck>) -> Self {
        let total = checks.len() as u32;
        let passed = checks.iter().filter(|c| c.result.passed).count() as u32;
        PhaseResult {
            phase,
            status: phase_status(phase, passed, total),
            passed,
            total,
            checks,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == PhaseStatus::Passed
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name).map(|c| &c.result)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &NamedCheck> {
        self.checks.iter().filter(|c| !c.result.passed)
    }

    pub fn duration_ms(&self) -> u64 {
        self.checks.iter().map(|c| c.result.duration_ms).sum()
    }
}

/// `Passed` iff `passed / total` meets the phase threshold. Empty phases fail.
pub fn phase_status(phase: Phase, passed: u32, total: u32) -> PhaseStatus {
    if total == 0 {
        return PhaseStatus::Failed;
    }
    // Integer form of passed/total >= pct/100
    if u64::from(passed) * 100 >= u64::from(total) * u64::from(phase.threshold_pct()) {
        PhaseStatus::Passed
    } else {
        PhaseStatus::Failed
    }
}

/// A registered probe with its execution function
pub struct Probe {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&ProbeContext<'_>) -> CheckResult,
}

/// Run probes serially and aggregate them into a phase result.
pub fn run_probes(phase: Phase, probes: &[Probe], ctx: &ProbeContext<'_>) -> PhaseResult {
    let start = Instant::now();
    let checks: Vec<NamedCheck> = probes
        .iter()
        .map(|probe| {
            let result = (probe.run)(ctx);
            debug!(
                phase = %phase,
                check = probe.name,
                passed = result.passed,
                duration_ms = result.duration_ms,
                "probe finished"
            );
            NamedCheck {
                name: probe.name.to_string(),
                result,
            }
        })
        .collect();

    let result = PhaseResult::from_checks(phase, checks);
    debug!(
        phase = %phase,
        passed = result.passed,
        total = result.total,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "phase aggregated"
    );
    result
}
