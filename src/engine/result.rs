//! Run results and the overall status policy.
//!
//! Collects phase results, derives the overall status and a textual summary.

use crate::engine::phase::{Phase, PhaseResult, PhaseTier};
use crate::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall outcome of a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Passed,
    Warning,
    Failed,
    /// The run itself could not complete
    Error,
}

impl OverallStatus {
    /// Process exit code for this status.
    pub fn exit_code(&self) -> u8 {
        match self {
            OverallStatus::Passed => 0,
            OverallStatus::Failed => 1,
            OverallStatus::Warning => 2,
            OverallStatus::Error => 3,
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Passed => write!(f, "passed"),
            OverallStatus::Warning => write!(f, "warning"),
            OverallStatus::Failed => write!(f, "failed"),
            OverallStatus::Error => write!(f, "error"),
        }
    }
}

/// Summary statistics plus issues and recommendations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_checks: u32,
    pub passed_checks: u32,
    pub phases_passed: u32,
    pub phases_total: u32,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ValidationSummary {
    /// Derive the summary from phase results. Only failed phases contribute
    /// issues and recommendations.
    pub fn from_phases(phases: &[PhaseResult]) -> Self {
        let mut summary = ValidationSummary::default();

        for phase in phases {
            summary.phases_total += 1;
            summary.total_checks += phase.total;
            summary.passed_checks += phase.passed;

            if phase.is_passed() {
                summary.phases_passed += 1;
                continue;
            }

            summary.issues.push(format!(
                "{} phase failed ({}/{} checks passed, {}% required)",
                phase.phase,
                phase.passed,
                phase.total,
                phase.phase.threshold_pct()
            ));
            for check in phase.failed_checks() {
                summary
                    .issues
                    .push(format!("{}.{}: {}", phase.phase, check.name, check.result.message()));
            }
            summary
                .recommendations
                .push(phase.phase.recommendation().to_string());
        }

        summary
    }
}

/// Result of one validation run. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub validation_id: String,
    pub platform: Platform,
    pub url: String,
    /// In run order. Serialized as an object keyed by phase name.
    #[serde(with = "phases_by_name")]
    pub phases: Vec<PhaseResult>,
    pub status: OverallStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub summary: ValidationSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// Build a completed result. `duration_ms` is derived from the two
    /// timestamps so the pair can never disagree. An `end_time` earlier than
    /// `start_time` (wall clock stepped back) is raised to `start_time`.
    pub fn completed(
        validation_id: String,
        platform: Platform,
        url: String,
        phases: Vec<PhaseResult>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let status = calculate_overall_status(&phases);
        let summary = ValidationSummary::from_phases(&phases);
        let end_time = end_time.max(start_time);
        ValidationResult {
            validation_id,
            platform,
            url,
            phases,
            status,
            start_time,
            end_time,
            duration_ms: elapsed_ms(start_time, end_time),
            summary,
            error: None,
        }
    }

    /// Build a result for a run that aborted.
    pub fn errored(
        validation_id: String,
        platform: Platform,
        url: String,
        error: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let end_time = end_time.max(start_time);
        ValidationResult {
            validation_id,
            platform,
            url,
            phases: Vec::new(),
            status: OverallStatus::Error,
            start_time,
            end_time,
            duration_ms: elapsed_ms(start_time, end_time),
            summary: ValidationSummary {
                issues: vec![format!("validation aborted: {}", error)],
                ..Default::default()
            },
            error: Some(error),
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

mod phases_by_name {
    use crate::engine::phase::PhaseResult;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(phases: &Vec<PhaseResult>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(phases.len()))?;
        for phase in phases {
            map.serialize_entry(&phase.phase, phase)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PhaseResult>, D::Error> {
        struct PhasesVisitor;

        impl<'de> Visitor<'de> for PhasesVisitor {
            type Value = Vec<PhaseResult>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of phase name to phase result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut phases = Vec::with_capacity(access.size_hint().unwrap_or(0));
                // the key repeats each value's `phase`
                while let Some((_, result)) = access.next_entry::<String, PhaseResult>()? {
                    phases.push(result);
                }
                Ok(phases)
            }
        }

        deserializer.deserialize_map(PhasesVisitor)
    }
}

/// `end` must not precede `start`.
fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds() as u64
}

/// Tiered overall status.
///
/// 1. `connectivity` and `health` must both pass, else `Failed`.
/// 2. `r` = fraction of optional phases (`performance`, `security`) passed.
/// 3. With `platform` passed: `r >= 0.8` passed, otherwise warning.
/// 4. With `platform` failed: `r >= 0.5` warning, otherwise failed.
///
/// Phases that did not run count as not passed.
pub fn calculate_overall_status(phases: &[PhaseResult]) -> OverallStatus {
    let passed = |phase: Phase| phases.iter().any(|p| p.phase == phase && p.is_passed());

    let critical_ok = Phase::ALL
        .iter()
        .filter(|p| p.tier() == PhaseTier::Critical)
        .all(|p| passed(*p));
    if !critical_ok {
        return OverallStatus::Failed;
    }

    let optional: Vec<Phase> = Phase::ALL
        .iter()
        .copied()
        .filter(|p| p.tier() == PhaseTier::Optional)
        .collect();
    let optional_total = optional.len() as u32;
    let optional_passed = optional.iter().filter(|p| passed(**p)).count() as u32;

    let rate_at_least = |pct: u32| optional_passed * 100 >= optional_total * pct;

    if passed(Phase::Platform) {
        if rate_at_least(80) {
            OverallStatus::Passed
        } else {
            OverallStatus::Warning
        }
    } else if rate_at_least(50) {
        OverallStatus::Warning
    } else {
        OverallStatus::Failed
    }
}
