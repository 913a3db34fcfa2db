//! URL helpers for deployment targets.

use crate::DeployCheckError;
use reqwest::Url;

/// Parse a deployment URL, accepting only `http` and `https` with a host.
pub fn parse_target(url: &str) -> Result<Url, DeployCheckError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(DeployCheckError::InvalidConfig {
            field: "url".to_string(),
            message: "URL is empty".to_string(),
        });
    }

    let parsed = Url::parse(trimmed).map_err(|e| DeployCheckError::InvalidConfig {
        field: "url".to_string(),
        message: format!("'{}' is not a valid URL: {}", trimmed, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(DeployCheckError::InvalidConfig {
                field: "url".to_string(),
                message: format!("unsupported scheme '{}', expected http or https", other),
            })
        }
    }

    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(DeployCheckError::InvalidConfig {
            field: "url".to_string(),
            message: format!("'{}' has no host", trimmed),
        });
    }

    Ok(parsed)
}

pub fn is_https(url: &str) -> bool {
    parse_target(url).map(|u| u.scheme() == "https").unwrap_or(false)
}

/// Host name of the target, without port.
pub fn host(url: &str) -> Result<String, DeployCheckError> {
    let parsed = parse_target(url)?;
    Ok(parsed.host_str().unwrap_or_default().to_string())
}

/// Resolve an absolute path (e.g. `/health`) against the target's origin.
pub fn join_path(url: &str, path: &str) -> Result<String, DeployCheckError> {
    let parsed = parse_target(url)?;
    parsed
        .join(path)
        .map(|u| u.to_string())
        .map_err(|e| DeployCheckError::Parse {
            context: format!("joining {} onto {}", path, url),
            message: e.to_string(),
        })
}

/// The same URL with its scheme replaced.
pub fn with_scheme(url: &str, scheme: &str) -> Result<String, DeployCheckError> {
    let mut parsed = parse_target(url)?;
    parsed
        .set_scheme(scheme)
        .map_err(|_| DeployCheckError::Parse {
            context: format!("switching {} to {}", url, scheme),
            message: "scheme change not permitted".to_string(),
        })?;
    Ok(parsed.to_string())
}
