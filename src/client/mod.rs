//! Web API access: transport, credential negotiation and the three lookups
//! a gate run needs (locate, task status, verdict).

pub mod auth;
pub mod locator;
pub mod quality_gate;
pub mod task_status;
pub mod transport;

use std::sync::Arc;

use url::Url;

use crate::core::config::ServerConfig;
use crate::core::errors::{Result, SonarGateError};

pub use auth::AuthNegotiator;
pub use locator::TaskLocator;
pub use quality_gate::{QualityGateFetcher, VerdictQuery};
pub use task_status::{TaskStatusClient, TaskStatusSource};
pub use transport::{Authorization, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Authorized JSON GETs against an analysis server.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct SonarClient {
    negotiator: AuthNegotiator,
    token: String,
}

impl SonarClient {
    /// Create a client over any transport
    pub fn new(transport: Arc<dyn HttpTransport>, token: impl Into<String>) -> Self {
        Self {
            negotiator: AuthNegotiator::new(transport),
            token: token.into(),
        }
    }

    /// Create a client backed by `reqwest` using the server settings
    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(server)?;
        Ok(Self::new(Arc::new(transport), server.token()))
    }

    /// GET a URL and return its non-empty body
    pub async fn get_body(&self, url: &str) -> Result<String> {
        let response = self.negotiator.authorized_get(url, &self.token).await?;
        if response.is_empty() {
            return Err(SonarGateError::empty_response(url));
        }
        Ok(response.body)
    }
}

impl std::fmt::Debug for SonarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarClient")
            .field("negotiator", &self.negotiator)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Join an API path onto a host and encode the query pairs
pub fn endpoint<K, V>(host: &str, path: &str, query: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let base = format!("{}/{}", host.trim().trim_end_matches('/'), path.trim_start_matches('/'));
    let url = Url::parse_with_params(
        &base,
        query.iter().map(|(k, v)| (k.as_ref(), v.as_ref())),
    )
    .map_err(|e| {
        SonarGateError::config_field(format!("Invalid server URL '{host}': {e}"), "server.host")
    })?;
    Ok(url.to_string())
}
