//! HTTP request/response types for the remote concept and encyclopedia endpoints.
//!
//! Every call entlink makes is a GET; the executor turns transport failures and
//! non-2xx statuses into [`LinkerError`] and leaves body interpretation to the
//! caller (`get_json` for OpenAlex, `get_text` for HTML).
//!
//! # Example
//!
//! ```rust,ignore
//! use entlink_core::http::{HttpExecutor, HttpRequest};
//!
//! let executor = HttpExecutor::default();
//! let request = HttpRequest::get("https://api.openalex.org/concepts/C41008148")
//!     .header("Accept", "application/json");
//!
//! let response = executor.execute(request).await?;
//! println!("Status: {}", response.status);
//! ```

use crate::error::{LinkerError, Result};
use entlink_config::NetworkConfig;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Target URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Add a header (builder pattern).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the timeout (builder pattern).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Check if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| LinkerError::Parse(format!("JSON from {}: {}", self.url, e)))
    }

    fn error_for_status(self, requested: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(LinkerError::Status {
                status: self.status,
                url: requested.to_string(),
            })
        }
    }
}

/// HTTP executor using reqwest.
#[derive(Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new(&NetworkConfig::default())
    }
}

impl HttpExecutor {
    /// Create an executor from network settings.
    ///
    /// Falls back to a plain client if the configured one cannot be built
    /// (for example a user agent with invalid header characters).
    pub fn new(config: &NetworkConfig) -> Self {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = match builder.build() {
            Ok(client) => client,
            Err(e) => {
                debug!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            }
        };

        Self { client }
    }

    /// Execute a GET request, returning the response whatever its status.
    pub async fn execute(&self, req: HttpRequest) -> Result<HttpResponse> {
        trace!("GET {}", req.url);

        let mut builder = self.client.get(&req.url);
        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LinkerError::Network(format!("request to {} timed out", req.url))
            } else {
                LinkerError::Network(e.to_string())
            }
        })?;

        let url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LinkerError::Network(format!("failed to read body: {}", e)))?;

        debug!("GET {} -> {} ({} bytes)", req.url, status, body.len());

        Ok(HttpResponse {
            url,
            status,
            body,
        })
    }

    /// GET a JSON document, failing on non-2xx status or malformed body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        self.execute(request).await?.error_for_status(url)?.json()
    }

    /// GET a text document (HTML), failing on non-2xx status.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let request = HttpRequest::get(url).header("Accept", "text/html");
        Ok(self.execute(request).await?.error_for_status(url)?.body)
    }
}
