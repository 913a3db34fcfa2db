//! Runtime settings.
//!
//! Loaded from an optional TOML file; every field has a default so a partial
//! file (or none at all) is valid. Command-line flags are applied on top by
//! the CLI.
//!
//! ```toml
//! [http]
//! timeout_ms = 10000
//!
//! [performance]
//! load_time_budget_ms = 2500
//! ```

use crate::DeployCheckError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "deploy-check.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    pub performance: PerformanceBudget,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout_ms: 30000,
            user_agent: crate::version::user_agent(),
        }
    }
}

/// Limits used by the performance phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceBudget {
    pub load_time_budget_ms: u64,
    pub response_time_budget_ms: u64,
    pub max_page_bytes: u64,
}

impl Default for PerformanceBudget {
    fn default() -> Self {
        PerformanceBudget {
            load_time_budget_ms: 3000,
            response_time_budget_ms: 1000,
            max_page_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Maximum number of results kept in memory
    pub capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings { capacity: 100 }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DeployCheckError> {
        let content = fs::read_to_string(path).map_err(|e| DeployCheckError::Io {
            context: format!("reading {}", path.display()),
            message: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            DeployCheckError::Parse { message, .. } => DeployCheckError::Parse {
                context: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, DeployCheckError> {
        let settings: Settings = toml::from_str(content).map_err(|e| DeployCheckError::Parse {
            context: "settings".to_string(),
            message: e.to_string(),
        })?;
        settings.check()?;
        Ok(settings)
    }

    /// Load `explicit` if given, else `deploy-check.toml` in `dir` if present,
    /// else defaults.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<Self, DeployCheckError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Settings::default())
        }
    }

    fn check(&self) -> Result<(), DeployCheckError> {
        if self.http.timeout_ms == 0 {
            return Err(DeployCheckError::InvalidConfig {
                field: "http.timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.store.capacity == 0 {
            return Err(DeployCheckError::InvalidConfig {
                field: "store.capacity".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
