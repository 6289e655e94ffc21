//! End-to-end gate run: locate, wait, fetch, report.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{
    HttpTransport, QualityGateFetcher, SonarClient, TaskLocator, TaskStatusClient,
};
use crate::core::config::{GateConfig, VerdictScope};
use crate::core::errors::Result;
use crate::core::model::{AnalysisTaskRef, ScanTarget, TaskRefSource};
use crate::core::pipeline::outcome::{GateDecision, GateOutcome};
use crate::core::pipeline::waiter::TaskWaiter;
use crate::io::descriptor::ScanDescriptor;
use crate::io::reports::{
    build_report, dashboard_url, write_junit_report, write_summary_json, ReportScope,
};

/// Progress callback function type
pub type ProgressCallback = Box<dyn Fn(&str, f64) + Send + Sync>;

/// A located task together with the server it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    /// Task to judge
    pub task: AnalysisTaskRef,
    /// Server base URL, from the descriptor or the configuration
    pub host: String,
    /// Dashboard link reported by the scanner, if any
    pub dashboard_url: Option<String>,
    /// Whether the task came from a local scan descriptor
    pub from_descriptor: bool,
}

/// Runs the quality gate for one configuration.
pub struct GateRunner {
    config: GateConfig,
    client: SonarClient,
}

impl GateRunner {
    /// Runner talking to the configured server over HTTP
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;
        let client = SonarClient::from_config(&config.server)?;
        Ok(Self { config, client })
    }

    /// Runner over a caller-supplied transport
    pub fn with_transport(config: GateConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        let client = SonarClient::new(transport, config.server.token());
        Ok(Self { config, client })
    }

    /// Configuration in use
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the gate without progress reporting
    pub async fn run(&self) -> Result<GateOutcome> {
        self.run_with_progress(None).await
    }

    /// Run the gate, reporting stage changes to `progress`
    pub async fn run_with_progress(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<GateOutcome> {
        let report_progress = |message: &str, percent: f64| {
            if let Some(ref callback) = progress {
                callback(message, percent);
            }
        };
        let target = self.config.scan_target();
        let expected = self.config.gate.expected_status.as_str();

        report_progress("Locating analysis task...", 0.0);
        let resolved = self.resolve_task(&target).await?;
        info!(task = %resolved.task, host = %resolved.host, "Resolved analysis task");

        if resolved.from_descriptor && !self.config.scan.wait_for_quality_gate {
            info!("Quality gate wait disabled; verdict not evaluated");
            report_progress("Skipped quality gate evaluation", 100.0);
            return Ok(GateOutcome::not_evaluated(resolved.task, expected));
        }

        let mut task_details = None;
        let mut analysis_key = resolved.task.analysis_id().map(str::to_string);
        if resolved.task.requires_wait() {
            report_progress("Waiting for analysis task...", 20.0);
            let source = TaskStatusClient::new(self.client.clone(), resolved.host.clone());
            let details = TaskWaiter::from_settings(&self.config.gate)
                .wait_for_completion(&source, &resolved.task)
                .await?;
            if details.analysis_id.is_none() {
                warn!(
                    task = %resolved.task,
                    "Task finished without an analysis id; querying by target"
                );
            }
            analysis_key = details.analysis_id.clone();
            task_details = Some(details);
        }

        if self.config.gate.scope == VerdictScope::Target
            || matches!(resolved.task.source(), TaskRefSource::TargetScoped(_))
        {
            analysis_key = None;
        }

        report_progress("Fetching quality gate verdict...", 70.0);
        let verdict = QualityGateFetcher::new(self.client.clone())
            .fetch_verdict(&resolved.host, analysis_key.as_deref(), &target)
            .await?;

        report_progress("Writing reports...", 90.0);
        let dashboard = match resolved.dashboard_url.clone() {
            Some(url) => url,
            None => dashboard_url(&resolved.host, &target)?,
        };
        let scope = ReportScope::new(self.config.project.display_name(), dashboard.clone());
        let report = build_report(&verdict, &scope);

        let junit_path = self.config.output.junit_path.clone();
        write_junit_report(&report, &junit_path).await?;
        info!(path = %junit_path.display(), "JUnit report written");

        if let Some(summary_path) = &self.config.output.summary_path {
            write_summary_json(&report, &verdict, expected, summary_path).await?;
            info!(path = %summary_path.display(), "Summary written");
        }

        let decision = if verdict.matches(expected) {
            GateDecision::Passed
        } else {
            GateDecision::Failed
        };
        info!(
            status = verdict.status(),
            expected,
            decision = decision.label(),
            "Quality gate evaluated"
        );
        report_progress("Quality gate evaluated", 100.0);

        Ok(GateOutcome {
            task: resolved.task,
            task_details,
            verdict: Some(verdict),
            report: Some(report),
            expected_status: expected.to_string(),
            dashboard_url: Some(dashboard),
            junit_path: Some(junit_path),
            decision,
        })
    }

    /// Find the task to judge.
    ///
    /// Remote lookups prefer a pull request, then a branch, then an explicit
    /// task id, then the project's latest analysis. Otherwise the local scan
    /// descriptor names the task and the server.
    pub async fn resolve_task(&self, target: &ScanTarget) -> Result<ResolvedTask> {
        let scan = &self.config.scan;
        if !scan.locates_remotely() {
            let descriptor = ScanDescriptor::load(&scan.descriptor_location()).await?;
            return Ok(ResolvedTask {
                task: descriptor.task_ref(),
                host: descriptor.server_url.trim_end_matches('/').to_string(),
                dashboard_url: descriptor.dashboard_url.clone(),
                from_descriptor: true,
            });
        }

        let host = self.config.server.base_url().to_string();
        let slug = target.project_key();
        let locator = TaskLocator::new(self.client.clone());

        let task = if target.qualifier().is_some() {
            locator.locate_by_target(target, &host, slug).await?
        } else if let Some(task_id) = scan.explicit_task_id() {
            AnalysisTaskRef::compute_engine(task_id, None)
        } else {
            locator.locate_latest_task(&host, slug).await?
        };

        Ok(ResolvedTask {
            task,
            host,
            dashboard_url: None,
            from_descriptor: false,
        })
    }
}

impl std::fmt::Debug for GateRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
