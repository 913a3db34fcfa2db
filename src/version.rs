//! Build metadata embedded by `build.rs`.
//!
//! `deploy-check version` prints it as a single line, or as JSON with
//! `--json` so CI pipelines can record which validator produced a report.

use serde::Serialize;
use std::fmt;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short git hash, absent when built outside a checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_date: Option<&'static str>,
    /// Target triple, or the bare architecture when the build script did not run
    pub target: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rustc: Option<&'static str>,
}

impl BuildInfo {
    /// Metadata of the running binary.
    pub fn current() -> Self {
        BuildInfo {
            name: NAME,
            version: VERSION,
            commit: option_env!("DEPLOY_CHECK_GIT_HASH"),
            build_date: option_env!("DEPLOY_CHECK_BUILD_DATE").map(date_only),
            target: option_env!("DEPLOY_CHECK_TARGET").unwrap_or(std::env::consts::ARCH),
            rustc: option_env!("DEPLOY_CHECK_RUSTC_VERSION"),
        }
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    pub fn to_json(&self) -> String {
        // only static strings and options; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Keeps the `YYYY-MM-DD` prefix of an RFC 3339 timestamp.
fn date_only(timestamp: &'static str) -> &'static str {
    timestamp.get(..10).unwrap_or(timestamp)
}

/// `deploy-check 0.1.0 (3f2a9c1 2026-10-19) x86_64-unknown-linux-gnu`
impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)?;
        match (self.commit, self.build_date) {
            (Some(commit), Some(date)) => write!(f, " ({} {})", commit, date)?,
            (Some(commit), None) => write!(f, " ({})", commit)?,
            (None, Some(date)) => write!(f, " ({})", date)?,
            (None, None) => {}
        }
        write!(f, " {}", self.target)?;
        if let Some(rustc) = self.rustc {
            write!(f, ", rustc {}", rustc)?;
        }
        Ok(())
    }
}

/// Default `User-Agent` for outgoing requests.
pub fn user_agent() -> String {
    BuildInfo::current().user_agent()
}
