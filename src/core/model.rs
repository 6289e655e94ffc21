//! Domain types shared by the locator, waiter, fetcher and report builder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SonarGateError};

/// Metric-key prefix the server uses for conditions on new code.
pub const NEW_CODE_PREFIX: &str = "new_";

/// Condition status that counts as passing.
pub const CONDITION_OK: &str = "OK";

/// Replace path separators in a project key the way the server expects them.
pub fn normalize_project_key(key: &str) -> String {
    key.trim().replace('/', ":")
}

/// What is being analyzed. Exactly one discriminator is active per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanTarget {
    /// The project's main branch
    Project {
        /// Project key
        project_key: String,
    },
    /// A named branch of the project
    Branch {
        /// Project key
        project_key: String,
        /// Branch name
        branch: String,
    },
    /// A pull request decorated by the server
    PullRequest {
        /// Project key
        project_key: String,
        /// Pull request key
        pull_request: String,
    },
}

impl ScanTarget {
    /// Pick the active discriminator: pull request, then branch, then the bare project.
    ///
    /// Blank values count as unset.
    pub fn resolve(project_key: &str, branch: Option<&str>, pull_request: Option<&str>) -> Self {
        let project_key = normalize_project_key(project_key);
        let non_blank = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(pull_request) = non_blank(pull_request) {
            Self::PullRequest {
                project_key,
                pull_request,
            }
        } else if let Some(branch) = non_blank(branch) {
            Self::Branch {
                project_key,
                branch,
            }
        } else {
            Self::Project { project_key }
        }
    }

    /// Project key shared by every discriminator
    pub fn project_key(&self) -> &str {
        match self {
            Self::Project { project_key }
            | Self::Branch { project_key, .. }
            | Self::PullRequest { project_key, .. } => project_key,
        }
    }

    /// Query parameter naming the discriminator, with its value, if not the bare project
    pub fn qualifier(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::Project { .. } => None,
            Self::Branch { branch, .. } => Some(("branch", branch.as_str())),
            Self::PullRequest { pull_request, .. } => {
                Some(("pullRequest", pull_request.as_str()))
            }
        }
    }

    /// Query pairs selecting this target on the quality-status endpoint
    pub fn status_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some((name, value)) = self.qualifier() {
            pairs.push((name, value.to_string()));
        }
        pairs.push(("projectKey", self.project_key().to_string()));
        pairs
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project { project_key } => write!(f, "project {project_key}"),
            Self::Branch {
                project_key,
                branch,
            } => write!(f, "branch {branch} of {project_key}"),
            Self::PullRequest {
                project_key,
                pull_request,
            } => write!(f, "pull request {pull_request} of {project_key}"),
        }
    }
}

/// Where an [`AnalysisTaskRef`] came from, which decides how the verdict is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRefSource {
    /// Compute engine task (fresh scan descriptor or explicit id); must be waited on
    ComputeEngine {
        /// Status URL reported by the scanner, if any
        task_url: Option<String>,
    },
    /// Analysis key returned by the analyses search; already complete
    AnalysisSearch,
    /// Branch or pull-request scoped lookup; the verdict is keyed by the target
    TargetScoped(ScanTarget),
}

/// Opaque handle on a completed-or-running analysis task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTaskRef {
    id: String,
    source: TaskRefSource,
}

impl AnalysisTaskRef {
    /// Reference a compute engine task
    pub fn compute_engine(id: impl Into<String>, task_url: Option<String>) -> Self {
        Self {
            id: id.into(),
            source: TaskRefSource::ComputeEngine { task_url },
        }
    }

    /// Reference a finished analysis by key
    pub fn analysis(key: impl Into<String>) -> Self {
        Self {
            id: key.into(),
            source: TaskRefSource::AnalysisSearch,
        }
    }

    /// Reference the latest analysis of a branch or pull request
    pub fn target_scoped(target: ScanTarget) -> Self {
        let id = target
            .qualifier()
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| target.project_key().to_string());
        Self {
            id,
            source: TaskRefSource::TargetScoped(target),
        }
    }

    /// Identifier as known to the server
    pub fn id(&self) -> &str {
        &self.id
    }

    /// How this reference was produced
    pub fn source(&self) -> &TaskRefSource {
        &self.source
    }

    /// Whether the task may still be running and has to be polled
    pub fn requires_wait(&self) -> bool {
        matches!(self.source, TaskRefSource::ComputeEngine { .. })
    }

    /// Analysis id usable directly as a verdict key, if this reference is one
    pub fn analysis_id(&self) -> Option<&str> {
        match self.source {
            TaskRefSource::AnalysisSearch => Some(&self.id),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisTaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Compute engine task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Queued
    Pending,
    /// Being processed
    InProgress,
    /// Finished; a verdict is available
    Success,
    /// Finished without a verdict
    #[serde(alias = "FAILED")]
    Error,
    /// Cancelled by an administrator
    Canceled,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Only SUCCESS and ERROR end the wait
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Wire spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute engine task details from `/api/ce/task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    /// Task id
    #[serde(default)]
    pub id: String,
    /// Task type, usually `REPORT`
    #[serde(default, rename = "type")]
    pub task_type: String,
    /// Component the task ran for
    #[serde(default)]
    pub component_key: Option<String>,
    /// Analysis produced by the task, set once it succeeds
    #[serde(default)]
    pub analysis_id: Option<String>,
    /// Current status
    pub status: TaskStatus,
    /// Submission timestamp
    #[serde(default)]
    pub submitted_at: Option<String>,
    /// Completion timestamp
    #[serde(default)]
    pub executed_at: Option<String>,
    /// Processing duration
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
    /// Number of scanner warnings
    #[serde(default)]
    pub warning_count: u32,
    /// Scanner warnings
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    task: TaskDetails,
}

impl TaskDetails {
    /// Decode a `{"task": {...}}` payload
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str::<TaskEnvelope>(body)
            .map(|envelope| envelope.task)
            .map_err(|e| SonarGateError::decode_json("compute engine task", e))
    }
}

/// One evaluated quality gate rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCondition {
    /// Pass/fail status; the only field control decisions look at
    pub status: String,
    /// Metric the rule applies to
    pub metric_key: String,
    /// Comparator, e.g. `GT` or `LT`
    #[serde(default)]
    pub comparator: String,
    /// Threshold that fails the rule
    #[serde(default)]
    pub error_threshold: String,
    /// Threshold that warns (older servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<String>,
    /// Measured value
    #[serde(default)]
    pub actual_value: String,
    /// Leak period the rule was evaluated on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_index: Option<u32>,
}

impl QualityCondition {
    /// Whether the condition passed
    pub fn is_ok(&self) -> bool {
        self.status == CONDITION_OK
    }

    /// Whether the condition is about code introduced since the baseline
    pub fn is_new_code(&self) -> bool {
        self.metric_key.starts_with(NEW_CODE_PREFIX)
    }

    /// Rule description shown for every condition
    pub fn rule_description(&self) -> String {
        format!(
            "Violate if {} is {} {}",
            self.actual_value, self.comparator, self.error_threshold
        )
    }

    /// Failure detail attached to a failed condition
    pub fn violation_detail(&self) -> String {
        format!(
            "Violated: {} is {} {}",
            self.actual_value, self.comparator, self.error_threshold
        )
    }
}

/// Aggregate gate verdict. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityVerdict {
    status: String,
    conditions: Vec<QualityCondition>,
    #[serde(default)]
    ignored_conditions: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectStatusEnvelope {
    project_status: QualityVerdict,
}

impl QualityVerdict {
    /// Build a verdict from its parts
    pub fn new(status: impl Into<String>, conditions: Vec<QualityCondition>) -> Self {
        Self {
            status: status.into(),
            conditions,
            ignored_conditions: false,
        }
    }

    /// Decode a `{"projectStatus": {...}}` payload.
    ///
    /// Unknown fields such as period metadata are ignored; a missing or
    /// malformed `status` or `conditions` is a decode error.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str::<ProjectStatusEnvelope>(body)
            .map(|envelope| envelope.project_status)
            .map_err(|e| SonarGateError::decode_json("quality gate status", e))
    }

    /// Aggregate status, compared verbatim with the expected value
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Evaluated conditions in server order
    pub fn conditions(&self) -> &[QualityCondition] {
        &self.conditions
    }

    /// Whether the server skipped some conditions (small new-code period)
    pub fn ignored_conditions(&self) -> bool {
        self.ignored_conditions
    }

    /// Exact, case-sensitive comparison with the configured expectation
    pub fn matches(&self, expected: &str) -> bool {
        self.status == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_target_precedence() {
        let target = ScanTarget::resolve("org/app", Some("develop"), Some("42"));
        assert_eq!(
            target,
            ScanTarget::PullRequest {
                project_key: "org:app".to_string(),
                pull_request: "42".to_string()
            }
        );

        let target = ScanTarget::resolve("app", Some("develop"), Some("  "));
        assert_eq!(target.qualifier(), Some(("branch", "develop")));

        let target = ScanTarget::resolve("app", None, None);
        assert_eq!(target.qualifier(), None);
        assert_eq!(target.project_key(), "app");
    }

    #[test]
    fn test_status_query_pairs() {
        let target = ScanTarget::resolve("app", Some("main"), None);
        assert_eq!(
            target.status_query(),
            vec![("branch", "main".to_string()), ("projectKey", "app".to_string())]
        );
        let target = ScanTarget::resolve("app", None, None);
        assert_eq!(target.status_query(), vec![("projectKey", "app".to_string())]);
    }

    #[test]
    fn test_task_ref_sources() {
        let ce = AnalysisTaskRef::compute_engine("AXce", None);
        assert!(ce.requires_wait());
        assert_eq!(ce.analysis_id(), None);

        let analysis = AnalysisTaskRef::analysis("AXan");
        assert!(!analysis.requires_wait());
        assert_eq!(analysis.analysis_id(), Some("AXan"));

        let scoped = AnalysisTaskRef::target_scoped(ScanTarget::resolve("app", None, Some("7")));
        assert_eq!(scoped.id(), "7");
        assert!(!scoped.requires_wait());
    }

    #[test]
    fn test_task_status_decoding() {
        let task = TaskDetails::from_json(
            r#"{"task":{"id":"AX1","type":"REPORT","status":"IN_PROGRESS","unknown":1}}"#,
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(!task.status.is_terminal());

        let task = TaskDetails::from_json(r#"{"task":{"status":"FAILED"}}"#).unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert!(task.status.is_terminal());

        let task = TaskDetails::from_json(r#"{"task":{"status":"CANCELED"}}"#).unwrap();
        assert!(!task.status.is_terminal());

        let task = TaskDetails::from_json(r#"{"task":{"status":"ARCHIVED"}}"#).unwrap();
        assert_eq!(task.status, TaskStatus::Unknown);
    }

    #[test]
    fn test_task_without_status_is_decode_error() {
        let err = TaskDetails::from_json(r#"{"task":{"id":"AX1"}}"#).unwrap_err();
        assert!(matches!(err, SonarGateError::Decode { .. }));
    }

    #[test]
    fn test_verdict_decoding_is_lenient() {
        let verdict = QualityVerdict::from_json(
            r#"{
                "projectStatus": {
                    "status": "ERROR",
                    "ignoredConditions": false,
                    "periods": [{"index": 1, "mode": "previous_version"}],
                    "conditions": [
                        {"status": "ERROR", "metricKey": "new_bugs", "comparator": "GT",
                         "periodIndex": 1, "errorThreshold": "0", "actualValue": "5"},
                        {"status": "OK", "metricKey": "coverage"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(verdict.status(), "ERROR");
        assert_eq!(verdict.conditions().len(), 2);
        assert_eq!(verdict.conditions()[0].period_index, Some(1));
        assert!(verdict.conditions()[0].is_new_code());
        assert_eq!(verdict.conditions()[1].actual_value, "");
    }

    #[test]
    fn test_verdict_requires_status_and_conditions() {
        for body in [
            r#"{"projectStatus":{"conditions":[]}}"#,
            r#"{"projectStatus":{"status":"OK"}}"#,
            r#"{"projectStatus":{"status":"OK","conditions":{}}}"#,
            r#"{"errors":[{"msg":"Project not found"}]}"#,
        ] {
            let err = QualityVerdict::from_json(body).unwrap_err();
            assert!(matches!(err, SonarGateError::Decode { .. }), "{body}");
        }
    }

    #[test]
    fn test_verdict_matches_exactly() {
        let verdict = QualityVerdict::new("OK", Vec::new());
        assert!(verdict.matches("OK"));
        assert!(!verdict.matches("ok"));
        assert!(!verdict.matches("ERROR"));
    }

    #[test]
    fn test_condition_details() {
        let condition = QualityCondition {
            status: "ERROR".to_string(),
            metric_key: "new_bugs".to_string(),
            comparator: "GT".to_string(),
            error_threshold: "0".to_string(),
            warning_threshold: None,
            actual_value: "5".to_string(),
            period_index: None,
        };
        assert_eq!(condition.violation_detail(), "Violated: 5 is GT 0");
        assert_eq!(condition.rule_description(), "Violate if 5 is GT 0");
        assert!(!condition.is_ok());
    }
}
