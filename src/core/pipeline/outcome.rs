//! Result of a gate run.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::config::QualityGateSettings;
use crate::core::model::{AnalysisTaskRef, QualityVerdict, TaskDetails};
use crate::io::reports::Report;

/// Final decision of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Verdict status matched the expectation
    Passed,
    /// Verdict status differed from the expectation
    Failed,
    /// The run was told not to wait for a verdict
    NotEvaluated,
}

impl GateDecision {
    /// Human label
    pub fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::NotEvaluated => "NOT EVALUATED",
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Task the run judged
    pub task: AnalysisTaskRef,
    /// Terminal task details when the run waited on a compute engine task
    pub task_details: Option<TaskDetails>,
    /// Verdict, absent when not evaluated
    pub verdict: Option<QualityVerdict>,
    /// Report built from the verdict
    pub report: Option<Report>,
    /// Status the verdict was compared with
    pub expected_status: String,
    /// Dashboard link for the scan target
    pub dashboard_url: Option<String>,
    /// Where the JUnit document was written
    pub junit_path: Option<PathBuf>,
    /// Decision
    pub decision: GateDecision,
}

impl GateOutcome {
    /// Outcome for a run that skipped the verdict
    pub fn not_evaluated(task: AnalysisTaskRef, expected_status: impl Into<String>) -> Self {
        Self {
            task,
            task_details: None,
            verdict: None,
            report: None,
            expected_status: expected_status.into(),
            dashboard_url: None,
            junit_path: None,
            decision: GateDecision::NotEvaluated,
        }
    }

    /// Whether the run counts as passing
    pub fn passed(&self) -> bool {
        self.decision != GateDecision::Failed
    }

    /// Process exit code under the given enforcement settings
    pub fn exit_code(&self, settings: &QualityGateSettings) -> i32 {
        if self.decision == GateDecision::Failed && settings.enforce {
            settings.error_exit_code
        } else {
            0
        }
    }
}
