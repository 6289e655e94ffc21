//! Scanner task descriptor (`report-task.txt`) parsing.
//!
//! The scanner writes one `key=value` pair per line after submitting an
//! analysis. Values may themselves contain `=`.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::core::errors::{Result, SonarGateError};
use crate::core::model::AnalysisTaskRef;

/// Fields read from a scanner task descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDescriptor {
    /// `projectKey`
    pub project_key: Option<String>,
    /// `serverUrl`
    pub server_url: String,
    /// `dashboardUrl`
    pub dashboard_url: Option<String>,
    /// `ceTaskId`
    pub ce_task_id: String,
    /// `ceTaskUrl`
    pub ce_task_url: Option<String>,
}

impl ScanDescriptor {
    /// Read and parse a descriptor file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SonarGateError::descriptor(
                path.display().to_string(),
                format!("cannot read scanner descriptor: {e}"),
            )
        })?;
        let descriptor = Self::parse(&content)
            .map_err(|message| SonarGateError::descriptor(path.display().to_string(), message))?;
        debug!(
            path = %path.display(),
            task = %descriptor.ce_task_id,
            "Loaded scanner descriptor"
        );
        Ok(descriptor)
    }

    /// Parse descriptor text; the error is a human-readable reason
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut entries: HashMap<&str, &str> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim(), value.trim());
            }
        }

        let optional = |key: &str| {
            entries
                .get(key)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };
        let required = |key: &str| optional(key).ok_or_else(|| format!("missing '{key}'"));

        Ok(Self {
            project_key: optional("projectKey"),
            server_url: required("serverUrl")?,
            dashboard_url: optional("dashboardUrl"),
            ce_task_id: required("ceTaskId")?,
            ce_task_url: optional("ceTaskUrl"),
        })
    }

    /// Compute engine task this descriptor points at
    pub fn task_ref(&self) -> AnalysisTaskRef {
        AnalysisTaskRef::compute_engine(self.ce_task_id.clone(), self.ce_task_url.clone())
    }
}
