//! Finds the analysis a gate run should judge when no fresh scan descriptor is used.

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::{endpoint, SonarClient};
use crate::core::errors::{Result, SonarGateError};
use crate::core::model::{AnalysisTaskRef, QualityVerdict, ScanTarget};

const ANALYSES_SEARCH_PATH: &str = "/api/project_analyses/search";
const PROJECT_STATUS_PATH: &str = "/api/qualitygates/project_status";

#[derive(Debug, Deserialize)]
struct AnalysesPage {
    #[serde(default)]
    analyses: Vec<AnalysisEntry>,
}

#[derive(Debug, Deserialize)]
struct AnalysisEntry {
    key: String,
    #[serde(default)]
    date: Option<String>,
}

/// Locates analysis tasks on the server.
#[derive(Debug, Clone)]
pub struct TaskLocator {
    client: SonarClient,
}

impl TaskLocator {
    /// Create a locator sharing the given client
    pub fn new(client: SonarClient) -> Self {
        Self { client }
    }

    /// Most recent analysis of a project.
    ///
    /// An empty body is [`SonarGateError::EmptyResponse`]; a valid page with no
    /// analyses is [`SonarGateError::EmptyResult`].
    pub async fn locate_latest_task(
        &self,
        host: &str,
        project_slug: &str,
    ) -> Result<AnalysisTaskRef> {
        let url = endpoint(
            host,
            ANALYSES_SEARCH_PATH,
            &[("project", project_slug), ("ps", "1")],
        )?;
        let body = self.client.get_body(&url).await?;

        let page: AnalysesPage = serde_json::from_str(&body)
            .map_err(|e| SonarGateError::decode_json("project analyses page", e))?;

        let latest = page
            .analyses
            .into_iter()
            .next()
            .ok_or_else(|| SonarGateError::empty_result(project_slug))?;

        info!(
            project = project_slug,
            analysis = %latest.key,
            date = latest.date.as_deref().unwrap_or("unknown"),
            "Located latest analysis"
        );
        Ok(AnalysisTaskRef::analysis(latest.key))
    }

    /// Latest analysis of a branch or pull request.
    ///
    /// The target's quality status is queried once to confirm the server knows
    /// it; the returned reference is keyed by the target, so the verdict is
    /// fetched again later through the same endpoint. A bare project target
    /// falls back to [`Self::locate_latest_task`].
    pub async fn locate_by_target(
        &self,
        target: &ScanTarget,
        host: &str,
        project_slug: &str,
    ) -> Result<AnalysisTaskRef> {
        let Some((name, value)) = target.qualifier() else {
            return self.locate_latest_task(host, project_slug).await;
        };

        let url = endpoint(
            host,
            PROJECT_STATUS_PATH,
            &[(name, value), ("projectKey", project_slug)],
        )?;
        let body = self.client.get_body(&url).await?;
        let verdict = QualityVerdict::from_json(&body)?;

        debug!(
            target = %target,
            status = verdict.status(),
            "Target has a quality gate status"
        );
        Ok(AnalysisTaskRef::target_scoped(target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::testing::ScriptedTransport;
    use crate::client::HttpResponse;
    use crate::core::errors::ErrorKind;
    use crate::core::model::TaskRefSource;

    const HOST: &str = "https://sonar.example.com";

    fn locator(transport: &Arc<ScriptedTransport>) -> TaskLocator {
        TaskLocator::new(SonarClient::new(transport.clone(), "tok"))
    }

    #[tokio::test]
    async fn test_latest_task_uses_first_analysis() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&[
            r#"{"paging":{"pageIndex":1,"pageSize":1,"total":12},
                "analyses":[{"key":"AXan1","date":"2026-01-02T10:00:00+0000","events":[]}]}"#,
        ]));

        let task = locator(&transport)
            .locate_latest_task(HOST, "org:app")
            .await
            .unwrap();

        assert_eq!(task.id(), "AXan1");
        assert_eq!(task.analysis_id(), Some("AXan1"));
        assert_eq!(
            transport.urls(),
            vec![format!("{HOST}/api/project_analyses/search?project=org%3Aapp&ps=1")]
        );
    }

    #[tokio::test]
    async fn test_no_analyses_is_empty_result() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&[r#"{"analyses":[]}"#]));
        let err = locator(&transport)
            .locate_latest_task(HOST, "app")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
        assert!(matches!(err, SonarGateError::EmptyResult { ref project } if project == "app"));
    }

    #[tokio::test]
    async fn test_empty_body_is_distinct_from_empty_result() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&[""]));
        let err = locator(&transport)
            .locate_latest_task(HOST, "app")
            .await
            .unwrap_err();
        assert!(matches!(err, SonarGateError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_malformed_page_is_decode_error() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&["<html>login</html>"]));
        let err = locator(&transport)
            .locate_latest_task(HOST, "app")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_locate_pull_request() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&[
            r#"{"projectStatus":{"status":"OK","conditions":[]}}"#,
        ]));
        let target = ScanTarget::resolve("app", Some("main"), Some("42"));

        let task = locator(&transport)
            .locate_by_target(&target, HOST, "app")
            .await
            .unwrap();

        assert_eq!(task.id(), "42");
        assert_eq!(task.source(), &TaskRefSource::TargetScoped(target));
        assert_eq!(
            transport.urls(),
            vec![format!(
                "{HOST}/api/qualitygates/project_status?pullRequest=42&projectKey=app"
            )]
        );
    }

    #[tokio::test]
    async fn test_locate_project_target_falls_back_to_search() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&[
            r#"{"analyses":[{"key":"AXmain"}]}"#,
        ]));
        let target = ScanTarget::resolve("app", None, None);

        let task = locator(&transport)
            .locate_by_target(&target, HOST, "app")
            .await
            .unwrap();
        assert_eq!(task.analysis_id(), Some("AXmain"));
    }

    #[tokio::test]
    async fn test_unknown_branch_surfaces_upstream_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::new(
            404,
            r#"{"errors":[{"msg":"Branch 'nope' not found"}]}"#,
        ))]));
        let target = ScanTarget::resolve("app", Some("nope"), None);

        let err = locator(&transport)
            .locate_by_target(&target, HOST, "app")
            .await
            .unwrap_err();
        assert!(matches!(err, SonarGateError::Upstream { status: 404, .. }));
    }
}
