//! HTTP seam between the gate logic and the network.
//!
//! Everything above this module talks to an [`HttpTransport`]; production code
//! uses [`ReqwestTransport`], tests substitute a scripted implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::debug;

use crate::core::config::ServerConfig;
use crate::core::errors::{Result, SonarGateError};

/// Authorization scheme attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Basic base64(token:)`
    Basic(String),
    /// `Bearer token`
    Bearer(String),
}

impl Authorization {
    /// Scheme name, safe to log
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Basic(_) => "Basic",
            Self::Bearer(_) => "Bearer",
        }
    }

    /// Full header value
    pub fn header_value(&self) -> String {
        match self {
            Self::Basic(token) => format!("Basic {}", STANDARD.encode(format!("{token}:"))),
            Self::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(<redacted>)", self.scheme())
    }
}

/// Outbound GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL including query string
    pub url: String,
    /// Credential for this attempt, if any
    pub authorization: Option<Authorization>,
}

impl HttpRequest {
    /// Unauthenticated GET
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: None,
        }
    }

    /// Attach a credential
    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }
}

/// Fully drained response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Body text; empty when the server sent nothing
    pub body: String,
}

impl HttpResponse {
    /// Build a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 or 403
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Body with only whitespace counts as empty
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Performs one physical request and returns the drained response.
///
/// Non-2xx statuses are returned, not raised; only failures to get a response
/// at all are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a GET request
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the configured timeouts
    pub fn new(server: &ServerConfig) -> Result<Self> {
        Self::with_timeouts(server.http_timeout(), server.connect_timeout())
    }

    /// Build a client with explicit timeouts
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("sonargate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SonarGateError::transport("<client>", e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .get(&request.url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(authorization) = &request.authorization {
            let mut value = HeaderValue::from_str(&authorization.header_value()).map_err(|_| {
                SonarGateError::transport(&request.url, "token contains invalid header characters")
            })?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        // Read the whole body so the connection can be reused.
        let body = response.text().await?;

        debug!(
            url = %request.url,
            status,
            scheme = request.authorization.as_ref().map(Authorization::scheme),
            body_len = body.len(),
            "HTTP response received"
        );

        Ok(HttpResponse { status, body })
    }
}
