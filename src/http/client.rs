//! HTTP executor
//!
//! Executes request descriptors against the transport and wraps the
//! result into a response envelope. This layer does not retry: transport
//! failures and non-2xx statuses map to typed errors and surface to the
//! caller, which decides whether to abort the whole iteration.

use super::request::RequestDescriptor;
use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base URL joined onto relative request paths
    pub base_url: Option<String>,
    /// Transport timeout (opaque to pagination strategies)
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("paginate-cdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExecutorConfig {
    /// Create a new config builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

/// Builder for executor config
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}

/// One HTTP response: status, headers, and body bytes.
///
/// Owned exclusively by the call that produced it and dropped on every
/// exit path; pagination control fields may be read from the headers
/// even when the body came from the cache.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body bytes
    pub body: Bytes,
}

impl ResponseEnvelope {
    /// Create an envelope from its parts
    pub fn new(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Whether the status is exactly 200 (the only cacheable status)
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP executor wrapping a shared reqwest client
pub struct HttpExecutor {
    client: Client,
    config: ExecutorConfig,
}

impl HttpExecutor {
    /// Create an executor with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with custom configuration
    pub fn with_config(config: ExecutorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Execute one request descriptor.
    ///
    /// 2xx responses return an envelope; other statuses map to
    /// [`Error::HttpStatus`] carrying the response body as cause.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope> {
        let full_url = self.build_url(descriptor.url());
        debug!("Executing {} {}", descriptor.method(), full_url);

        let mut req = self
            .client
            .request(descriptor.method().into(), &full_url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in descriptor.headers() {
            req = req.header(key.as_str(), value.as_str());
        }
        if !descriptor.query().is_empty() {
            req = req.query(descriptor.query());
        }
        if let Some(body) = descriptor.body() {
            req = req.json(body);
        }

        let response = req.send().await.map_err(Error::Http)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::Http)?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(ResponseEnvelope::new(status.as_u16(), headers, body))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
