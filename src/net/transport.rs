//! HTTP and DNS transport.
//!
//! # Graceful Degradation
//!
//! - Connection refused / unreachable: `DeployCheckError::Connect`
//! - Timeout: `DeployCheckError::Timeout` carrying the configured budget
//! - Non-UTF8 header values: dropped from `HttpResponse::headers`
//! - Body read failure: `DeployCheckError::Http`
//!
//! The transport never retries. Callers decide what a failure means.

use crate::settings::HttpSettings;
use crate::DeployCheckError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::debug;

/// HTTP method used by probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
        }
    }
}

/// A single outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub follow_redirects: bool,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            follow_redirects: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url)
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self::new(Method::Options, url)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// A received response. Header names are lowercase.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// URL after redirects
    pub final_url: String,
    /// Time until the status line and headers arrived
    pub headers_ms: u64,
    /// Time until the whole body was read
    pub total_ms: u64,
}

impl HttpResponse {
    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network seam used by every probe.
pub trait Transport: Send + Sync {
    /// Perform one request. No retries.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DeployCheckError>;

    /// Resolve a host name to its addresses.
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, DeployCheckError>;
}

/// Production transport backed by a blocking reqwest client.
pub struct ReqwestTransport {
    following: Client,
    non_following: Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, DeployCheckError> {
        let build = |policy: Policy| {
            Client::builder()
                .timeout(Duration::from_millis(settings.timeout_ms))
                .user_agent(settings.user_agent.clone())
                .redirect(policy)
                .build()
                .map_err(|e| DeployCheckError::Http {
                    url: String::new(),
                    message: format!("failed to build HTTP client: {}", e),
                })
        };

        Ok(ReqwestTransport {
            following: build(Policy::limited(10))?,
            non_following: build(Policy::none())?,
            timeout_ms: settings.timeout_ms,
        })
    }

    fn map_error(&self, url: &str, err: reqwest::Error) -> DeployCheckError {
        if err.is_timeout() {
            DeployCheckError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else if err.is_connect() {
            DeployCheckError::Connect {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            DeployCheckError::Http {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DeployCheckError> {
        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.non_following
        };

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        };

        let mut builder = client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let start = Instant::now();
        let response = builder
            .send()
            .map_err(|e| self.map_error(&request.url, e))?;
        let headers_ms = start.elapsed().as_millis() as u64;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .map_err(|e| self.map_error(&request.url, e))?
            .to_vec();
        let total_ms = start.elapsed().as_millis() as u64;

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            total_ms,
            "http request complete"
        );

        Ok(HttpResponse {
            status,
            headers,
            body,
            final_url,
            headers_ms,
            total_ms,
        })
    }

    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, DeployCheckError> {
        let addrs: Vec<IpAddr> = (host, 0u16)
            .to_socket_addrs()
            .map_err(|e| DeployCheckError::Dns {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .map(|a| a.ip())
            .collect();

        if addrs.is_empty() {
            return Err(DeployCheckError::Dns {
                host: host.to_string(),
                message: "No addresses returned".to_string(),
            });
        }

        Ok(addrs)
    }
}
