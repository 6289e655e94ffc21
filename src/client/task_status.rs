//! Compute engine task status lookups.

use async_trait::async_trait;
use tracing::debug;

use crate::client::{endpoint, SonarClient};
use crate::core::errors::Result;
use crate::core::model::{AnalysisTaskRef, TaskDetails, TaskRefSource};

const CE_TASK_PATH: &str = "/api/ce/task";

/// Something that can report the current status of an analysis task.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    /// Fetch the task's current details
    async fn task_status(&self, task: &AnalysisTaskRef) -> Result<TaskDetails>;
}

/// Reads task status from `/api/ce/task`.
#[derive(Debug, Clone)]
pub struct TaskStatusClient {
    client: SonarClient,
    host: String,
}

impl TaskStatusClient {
    /// Create a status client for a host
    pub fn new(client: SonarClient, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    /// Status URL: the scanner-reported one when present, else built from the id
    pub fn status_url(&self, task: &AnalysisTaskRef) -> Result<String> {
        match task.source() {
            TaskRefSource::ComputeEngine {
                task_url: Some(url),
            } if !url.trim().is_empty() => Ok(url.trim().to_string()),
            _ => endpoint(&self.host, CE_TASK_PATH, &[("id", task.id())]),
        }
    }
}

#[async_trait]
impl TaskStatusSource for TaskStatusClient {
    async fn task_status(&self, task: &AnalysisTaskRef) -> Result<TaskDetails> {
        let url = self.status_url(task)?;
        let body = self.client.get_body(&url).await?;
        let details = TaskDetails::from_json(&body)?;
        debug!(task = task.id(), status = %details.status, "Task status");
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::testing::ScriptedTransport;
    use crate::core::model::TaskStatus;

    const HOST: &str = "https://sonar.example.com";

    #[tokio::test]
    async fn test_status_from_task_id() {
        let transport = Arc::new(ScriptedTransport::ok_bodies(&[
            r#"{"task":{"id":"AXce","status":"SUCCESS","analysisId":"AXan"}}"#,
        ]));
        let source = TaskStatusClient::new(SonarClient::new(transport.clone(), "tok"), HOST);

        let details = source
            .task_status(&AnalysisTaskRef::compute_engine("AXce", None))
            .await
            .unwrap();

        assert_eq!(details.status, TaskStatus::Success);
        assert_eq!(details.analysis_id.as_deref(), Some("AXan"));
        assert_eq!(transport.urls(), vec![format!("{HOST}/api/ce/task?id=AXce")]);
    }

    #[test]
    fn test_reported_task_url_wins() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let source = TaskStatusClient::new(SonarClient::new(transport, "tok"), HOST);
        let task = AnalysisTaskRef::compute_engine(
            "AXce",
            Some("https://ce.example.com/api/ce/task?id=AXce".to_string()),
        );
        assert_eq!(
            source.status_url(&task).unwrap(),
            "https://ce.example.com/api/ce/task?id=AXce"
        );
    }
}
