//! Credential negotiation: Basic first, one Bearer retry on rejection.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::transport::{Authorization, HttpRequest, HttpResponse, HttpTransport};
use crate::core::errors::{Result, SonarGateError};

/// Wraps a transport and applies the two-scheme credential policy.
///
/// At most two physical requests are made per call, and nothing about a
/// successful scheme is remembered between calls.
#[derive(Clone)]
pub struct AuthNegotiator {
    transport: Arc<dyn HttpTransport>,
}

impl AuthNegotiator {
    /// Create a negotiator over a transport
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Perform an authorized GET.
    ///
    /// A 2xx from either attempt is returned as-is. A 401/403 on the Bearer
    /// retry becomes [`SonarGateError::Auth`]; any other non-2xx from either
    /// attempt becomes [`SonarGateError::Upstream`].
    pub async fn authorized_get(&self, url: &str, token: &str) -> Result<HttpResponse> {
        let basic = self
            .attempt(url, Authorization::Basic(token.to_string()))
            .await?;
        if basic.is_success() {
            return Ok(basic);
        }
        if !basic.is_auth_rejection() {
            return Err(SonarGateError::upstream(url, basic.status, &basic.body));
        }

        info!(
            url,
            status = basic.status,
            "Basic credentials rejected, retrying with Bearer"
        );

        let bearer = self
            .attempt(url, Authorization::Bearer(token.to_string()))
            .await?;
        if bearer.is_success() {
            Ok(bearer)
        } else if bearer.is_auth_rejection() {
            Err(SonarGateError::auth(url, bearer.status))
        } else {
            Err(SonarGateError::upstream(url, bearer.status, &bearer.body))
        }
    }

    async fn attempt(&self, url: &str, authorization: Authorization) -> Result<HttpResponse> {
        debug!(url, scheme = authorization.scheme(), "Sending request");
        let request = HttpRequest::get(url).with_authorization(authorization);
        self.transport.send(&request).await
    }
}

impl std::fmt::Debug for AuthNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthNegotiator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedTransport;
    use crate::core::errors::ErrorKind;

    const URL: &str = "https://sonar.example.com/api/ce/task?id=AX1";

    #[tokio::test]
    async fn test_basic_success_makes_one_request() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::new(
            200,
            r#"{"task":{}}"#,
        ))]));
        let negotiator = AuthNegotiator::new(transport.clone());

        let response = negotiator.authorized_get(URL, "tok").await.unwrap();
        assert_eq!(response.status, 200);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_ref().unwrap().scheme(), "Basic");
    }

    #[tokio::test]
    async fn test_rejected_basic_retries_with_bearer() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(HttpResponse::new(401, "")),
            Ok(HttpResponse::new(200, "{}")),
        ]));
        let negotiator = AuthNegotiator::new(transport.clone());

        let response = negotiator.authorized_get(URL, "tok").await.unwrap();
        assert_eq!(response.body, "{}");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].authorization,
            Some(Authorization::Basic("tok".to_string()))
        );
        assert_eq!(
            requests[1].authorization,
            Some(Authorization::Bearer("tok".to_string()))
        );
        assert!(requests.iter().all(|r| r.url == URL));
    }

    #[tokio::test]
    async fn test_double_rejection_is_auth_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(HttpResponse::new(403, "")),
            Ok(HttpResponse::new(401, "")),
        ]));
        let negotiator = AuthNegotiator::new(transport.clone());

        let err = negotiator.authorized_get(URL, "tok").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(matches!(err, SonarGateError::Auth { status: 401, .. }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::new(
            503,
            "maintenance",
        ))]));
        let negotiator = AuthNegotiator::new(transport.clone());

        let err = negotiator.authorized_get(URL, "tok").await.unwrap_err();
        assert!(matches!(err, SonarGateError::Upstream { status: 503, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_bearer_server_error_is_upstream() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(HttpResponse::new(401, "")),
            Ok(HttpResponse::new(500, "")),
        ]));
        let negotiator = AuthNegotiator::new(transport.clone());

        let err = negotiator.authorized_get(URL, "tok").await.unwrap_err();
        assert!(matches!(err, SonarGateError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(
            SonarGateError::transport(URL, "connection refused"),
        )]));
        let negotiator = AuthNegotiator::new(transport.clone());

        let err = negotiator.authorized_get(URL, "tok").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(transport.requests().len(), 1);
    }
}
