//! Report generation for quality gate verdicts.
//!
//! [`build_report`] turns a verdict into a JUnit document and a
//! [`SummaryRecord`]. It performs no I/O; the `write_*` helpers persist the
//! results.

pub mod junit;
pub mod summary;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use url::Url;

use crate::core::errors::{Result, ResultExt, SonarGateError};
use crate::core::model::{QualityVerdict, ScanTarget};

pub use junit::{parse_junit_counts, JunitCounts, JunitTestCase, JunitTestSuite, JunitTestSuites};
pub use summary::{RateCategory, SummaryRecord};

/// What a report is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportScope {
    /// Project display name
    pub project_name: String,
    /// Dashboard link for the scan target
    pub dashboard_url: String,
    /// Time stamped on the suite
    pub generated_at: DateTime<Utc>,
}

impl ReportScope {
    /// Scope stamped with the current time
    pub fn new(project_name: impl Into<String>, dashboard_url: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            dashboard_url: dashboard_url.into(),
            generated_at: Utc::now(),
        }
    }

    /// Override the generation time
    pub fn at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// JUnit rendering plus summary counts of one verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// JUnit document model
    pub junit: JunitTestSuites,
    /// Counts and success rate
    pub summary: SummaryRecord,
}

impl Report {
    /// Serialized JUnit XML
    pub fn junit_xml(&self) -> Result<String> {
        self.junit.to_xml()
    }
}

/// Build the report for a verdict
pub fn build_report(verdict: &QualityVerdict, scope: &ReportScope) -> Report {
    let summary = SummaryRecord::from_verdict(verdict);

    let cases = verdict
        .conditions()
        .iter()
        .map(|condition| JunitTestCase {
            name: condition.metric_key.clone(),
            classname: condition.rule_description(),
            time: 0,
            failure: (!condition.is_ok()).then(|| condition.violation_detail()),
        })
        .collect();

    let suite = JunitTestSuite {
        package: scope.project_name.clone(),
        name: scope.dashboard_url.clone(),
        tests: summary.total,
        errors: summary.errors,
        failures: summary.failed,
        time: 0,
        timestamp: scope
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, false),
        cases,
    };

    Report {
        junit: JunitTestSuites {
            suites: vec![suite],
        },
        summary,
    }
}

/// Dashboard link for a scan target: `{host}/dashboard?id=…[&pullRequest=…|&branch=…]`
pub fn dashboard_url(host: &str, target: &ScanTarget) -> Result<String> {
    let base = format!("{}/dashboard", host.trim().trim_end_matches('/'));
    let mut url = Url::parse(&base).map_err(|e| {
        SonarGateError::config_field(format!("Invalid server URL '{host}': {e}"), "server.host")
    })?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("id", target.project_key());
        if let Some((name, value)) = target.qualifier() {
            query.append_pair(name, value);
        }
    }
    Ok(url.to_string())
}

/// Write the JUnit document, creating parent directories as needed
pub async fn write_junit_report(report: &Report, path: &Path) -> Result<()> {
    let xml = report.junit_xml()?;
    write_file(path, xml.as_bytes()).await
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    status: &'a str,
    expected_status: &'a str,
    passed: bool,
    category: &'static str,
    values: std::collections::BTreeMap<&'static str, String>,
    summary: &'a SummaryRecord,
}

/// Write the summary values as JSON for later pipeline steps
pub async fn write_summary_json(
    report: &Report,
    verdict: &QualityVerdict,
    expected_status: &str,
    path: &Path,
) -> Result<()> {
    let file = SummaryFile {
        status: verdict.status(),
        expected_status,
        passed: verdict.matches(expected_status),
        category: report.summary.category().label(),
        values: report.summary.named_values().into_iter().collect(),
        summary: &report.summary,
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| SonarGateError::report(format!("Failed to serialize summary: {e}")))?;
    write_file(path, json.as_bytes()).await
}

async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }
    tokio::fs::write(path, content).await.map_err(|e| {
        SonarGateError::io(format!("Failed to write report: {}", path.display()), e)
    })
}
