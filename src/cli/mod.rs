//! Command-line interface.
//!
//! Argument parsing, output formatting and the check listing.

pub mod args;
pub mod output;

use crate::checks::probes_for;
use crate::engine::phase::{Phase, PhaseTier};

/// Render the phase and check catalogue shown by `deploy-check list`.
pub fn check_list() -> String {
    let mut out = String::from("Available checks:\n");
    for phase in Phase::ALL {
        let tier = match phase.tier() {
            PhaseTier::Critical => "critical",
            PhaseTier::Important => "important",
            PhaseTier::Optional => "optional",
        };
        out.push('\n');
        out.push_str(&format!(
            "{} ({}, {}% of checks must pass):\n",
            phase.as_str().to_uppercase(),
            tier,
            phase.threshold_pct()
        ));
        for probe in probes_for(phase) {
            out.push_str(&format!("  {:<20} {}\n", probe.name, probe.description));
        }
    }
    out
}
