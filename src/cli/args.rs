//! Command line arguments.

use crate::engine::phase::Phase;
use crate::settings::Settings;
use crate::{AppType, DeployCheckError, DeploymentConfig, Platform};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deploy-check - post-deployment validation for web applications
#[derive(Parser, Debug)]
#[command(name = "deploy-check")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXIT CODES:\n    0   Validation passed\n    1   Validation failed\n    2   Passed with warnings\n    3   Runtime error")]
pub struct Cli {
    /// Include per-check details and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a deployed URL
    Validate(ValidateArgs),
    /// List phases, checks and thresholds
    List,
    /// Print version information
    Version {
        /// Print build metadata as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
    /// JUnit XML for CI/CD integration
    Junit,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    /// Deployment URL
    pub url: String,

    /// Hosting platform (vercel, netlify, github-pages, cloudflare, docker, custom)
    #[arg(long, default_value = "custom")]
    pub platform: String,

    /// Application type (spa, static, fullstack, api)
    #[arg(long = "app-type", default_value = "spa")]
    pub app_type: String,

    /// Application name, informational
    #[arg(long)]
    pub name: Option<String>,

    /// Application version, informational
    #[arg(long = "app-version")]
    pub app_version: Option<String>,

    #[arg(long, default_value = "production")]
    pub environment: String,

    /// Run only these phases (repeatable)
    #[arg(long = "phase", value_name = "PHASE", value_parser = parse_phase)]
    pub phases: Vec<Phase>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only output failed phases and checks
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Per-request timeout in milliseconds
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Settings file (TOML). Defaults to ./deploy-check.toml if present
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_phase(s: &str) -> Result<Phase, String> {
    s.parse::<Phase>().map_err(|e| e.to_string())
}

impl ValidateArgs {
    pub fn deployment_config(&self) -> Result<DeploymentConfig, DeployCheckError> {
        let app_type: AppType = self.app_type.parse()?;
        Ok(DeploymentConfig {
            platform: Platform::parse_lossy(&self.platform),
            url: self.url.clone(),
            app_type,
            name: self.name.clone().unwrap_or_default(),
            version: self.app_version.clone().unwrap_or_default(),
            environment: self.environment.clone(),
        })
    }

    /// Apply command-line overrides on top of file settings.
    pub fn apply_overrides(&self, mut settings: Settings) -> Result<Settings, DeployCheckError> {
        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms == 0 {
                return Err(DeployCheckError::InvalidConfig {
                    field: "timeout".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            settings.http.timeout_ms = timeout_ms;
        }
        Ok(settings)
    }
}
