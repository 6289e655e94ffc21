//! Quality gate verdict retrieval.

use tracing::info;

use crate::client::{endpoint, SonarClient};
use crate::core::errors::Result;
use crate::core::model::{QualityVerdict, ScanTarget};

const PROJECT_STATUS_PATH: &str = "/api/qualitygates/project_status";

/// Which key the verdict endpoint is queried by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictQuery {
    /// A specific analysis
    Analysis(String),
    /// The latest analysis of a scan target
    Target(ScanTarget),
}

impl VerdictQuery {
    /// Prefer the analysis key when one is known, else fall back to the target
    pub fn select(analysis_key: Option<&str>, target: &ScanTarget) -> Self {
        match analysis_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Self::Analysis(key.to_string()),
            None => Self::Target(target.clone()),
        }
    }

    /// Query string pairs
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Analysis(key) => vec![("analysisId", key.clone())],
            Self::Target(target) => target.status_query(),
        }
    }
}

/// Fetches quality gate verdicts.
#[derive(Debug, Clone)]
pub struct QualityGateFetcher {
    client: SonarClient,
}

impl QualityGateFetcher {
    /// Create a fetcher sharing the given client
    pub fn new(client: SonarClient) -> Self {
        Self { client }
    }

    /// Fetch the verdict for an analysis key, or for the target when no key is given
    pub async fn fetch_verdict(
        &self,
        host: &str,
        analysis_key: Option<&str>,
        target: &ScanTarget,
    ) -> Result<QualityVerdict> {
        self.fetch(host, &VerdictQuery::select(analysis_key, target))
            .await
    }

    /// Fetch the verdict for an explicit query
    pub async fn fetch(&self, host: &str, query: &VerdictQuery) -> Result<QualityVerdict> {
        let pairs = query.query_pairs();
        let url = endpoint(host, PROJECT_STATUS_PATH, pairs.as_slice())?;
        let body = self.client.get_body(&url).await?;
        let verdict = QualityVerdict::from_json(&body)?;

        info!(
            status = verdict.status(),
            conditions = verdict.conditions().len(),
            "Quality gate verdict received"
        );
        Ok(verdict)
    }
}
