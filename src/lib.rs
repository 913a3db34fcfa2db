//! deploy-check library
//!
//! Post-deployment validation for web applications.
//!
//! A validation run probes a deployed URL in five fixed phases:
//! - Connectivity: HTTP response, HTTPS redirect, DNS resolution, CORS preflight
//! - Platform: hosting platform fingerprint, SPA routing fallback, compression
//! - Health: `/health`, `/health.html`, `/api/health`, `/api/status`, root content
//! - Performance: load time, response time, page weight, caching headers
//! - Security: HTTPS, security headers, HSTS, server disclosure, mixed content
//!
//! Each phase has a fixed pass threshold, and the overall status follows a
//! tiered policy (connectivity and health are critical).
//!
//! # Example
//!
//! ```no_run
//! use deploy_check::{run_validation, DeploymentConfig, Settings};
//!
//! let config = DeploymentConfig::new("https://example.com");
//! let result = run_validation(&config, Settings::default()).expect("Validation failed");
//! println!("Overall status: {}", result.status);
//! ```

pub mod checks;
pub mod cli;
pub mod engine;
pub mod net;
pub mod settings;
pub mod version;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use engine::orchestrator::DeploymentValidator;
use engine::result::ValidationResult;

// Re-exports for public API
pub use engine::orchestrator::DeploymentValidator as Validator;
pub use engine::phase::{Phase, PhaseResult, PhaseStatus};
pub use engine::result::{OverallStatus, ValidationSummary};
pub use settings::Settings;

/// Result of a single probe.
///
/// Probe-specific fields (addresses, header lists, timings) are kept in
/// `details` so that every probe shares one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    /// HTTP status code of the probed response, if a response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl CheckResult {
    pub fn pass(duration_ms: u64) -> Self {
        CheckResult {
            passed: true,
            status: None,
            duration_ms,
            error: None,
            reason: None,
            details: Map::new(),
        }
    }

    /// A failed probe with an explanatory reason (the target answered, but wrongly).
    pub fn fail(duration_ms: u64, reason: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            reason: Some(reason.into()),
            ..CheckResult::pass(duration_ms)
        }
    }

    /// A failed probe caused by a transport error.
    pub fn from_error(error: &DeployCheckError, duration_ms: u64) -> Self {
        CheckResult {
            passed: false,
            error: Some(error.to_string()),
            ..CheckResult::pass(duration_ms)
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Short human-readable explanation of the outcome.
    pub fn message(&self) -> String {
        if let Some(ref error) = self.error {
            return error.clone();
        }
        if let Some(ref reason) = self.reason {
            return reason.clone();
        }
        match self.status {
            Some(status) => format!("HTTP {}", status),
            None if self.passed => "ok".to_string(),
            None => "check failed".to_string(),
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "{}: {} ({}ms)", label, self.message(), self.duration_ms)
    }
}

/// Hosting platform of the deployment under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Vercel,
    Netlify,
    GithubPages,
    Cloudflare,
    Docker,
    #[default]
    Custom,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Vercel => "vercel",
            Platform::Netlify => "netlify",
            Platform::GithubPages => "github-pages",
            Platform::Cloudflare => "cloudflare",
            Platform::Docker => "docker",
            Platform::Custom => "custom",
        }
    }

    /// Parse a platform name. Unknown names map to `Custom`.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vercel" => Platform::Vercel,
            "netlify" => Platform::Netlify,
            "github-pages" | "github_pages" | "ghpages" | "gh-pages" => Platform::GithubPages,
            "cloudflare" | "cloudflare-pages" => Platform::Cloudflare,
            "docker" => Platform::Docker,
            _ => Platform::Custom,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of application served at the deployment URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    #[default]
    Spa,
    Static,
    Fullstack,
    Api,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Spa => "spa",
            AppType::Static => "static",
            AppType::Fullstack => "fullstack",
            AppType::Api => "api",
        }
    }
}

impl FromStr for AppType {
    type Err = DeployCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spa" => Ok(AppType::Spa),
            "static" => Ok(AppType::Static),
            "fullstack" => Ok(AppType::Fullstack),
            "api" => Ok(AppType::Api),
            other => Err(DeployCheckError::InvalidConfig {
                field: "type".to_string(),
                message: format!(
                    "unknown application type '{}'. Valid types: spa, static, fullstack, api",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of the deployment to validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub platform: Platform,
    pub url: String,
    #[serde(rename = "type")]
    pub app_type: AppType,
    pub name: String,
    pub version: String,
    pub environment: String,
}

impl DeploymentConfig {
    /// Config for `url` with defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        DeploymentConfig {
            platform: Platform::Custom,
            url: url.into(),
            app_type: AppType::Spa,
            name: String::new(),
            version: String::new(),
            environment: "production".to_string(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_app_type(mut self, app_type: AppType) -> Self {
        self.app_type = app_type;
        self
    }

    /// Reject configs a run cannot start from: empty, unparsable or
    /// non-HTTP(S) URLs.
    pub fn validate(&self) -> Result<(), DeployCheckError> {
        net::url::parse_target(&self.url).map(|_| ())
    }
}

/// Error types for deploy-check operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeployCheckError {
    /// The deployment config cannot be validated
    #[error("invalid config field '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// The connection could not be established
    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    /// The request exceeded the configured timeout
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Any other HTTP-level failure
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// Host name could not be resolved
    #[error("DNS resolution for {host} failed: {message}")]
    Dns { host: String, message: String },

    #[error("I/O error in {context}: {message}")]
    Io { context: String, message: String },

    #[error("parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Unexpected failure inside a run
    #[error("internal error: {0}")]
    Internal(String),
}

/// Validate a deployment with the production HTTP transport.
///
/// This is the main entry point for one-shot validation. For repeated runs,
/// subscriptions or stored results, build a [`DeploymentValidator`] directly.
///
/// # Example
///
/// ```no_run
/// use deploy_check::{run_validation, DeploymentConfig, Platform, Settings};
///
/// let config = DeploymentConfig::new("https://my-app.vercel.app")
///     .with_platform(Platform::Vercel);
///
/// match run_validation(&config, Settings::default()) {
///     Ok(result) => println!("{}: {}", result.validation_id, result.status),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_validation(
    config: &DeploymentConfig,
    settings: Settings,
) -> Result<Arc<ValidationResult>, DeployCheckError> {
    let validator = DeploymentValidator::with_http(settings)?;
    Ok(validator.validate_deployment(config))
}
