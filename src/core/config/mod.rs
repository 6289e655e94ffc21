//! Configuration types and management for sonargate-rs.
//!
//! A [`GateConfig`] is assembled from defaults, an optional YAML file and the
//! command line. The library only consumes the finished value; it never reads
//! the process environment itself.

pub mod validation;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SonarGateError};
use crate::core::model::{normalize_project_key, ScanTarget};

pub use validation::{
    validate_bounded_i32, validate_http_url, validate_non_empty, validate_optional_non_empty,
    validate_positive_u64,
};

/// Scanner output directory, relative to the workspace
pub const SCANNER_WORK_DIR: &str = ".scannerwork";

/// Descriptor file the scanner leaves behind
pub const DESCRIPTOR_FILE_NAME: &str = "report-task.txt";

/// Main configuration for a quality gate run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Server connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Project identity and scan target
    #[serde(default)]
    pub project: ProjectConfig,

    /// Where the analysis task comes from
    #[serde(default)]
    pub scan: ScanConfig,

    /// Gate evaluation and enforcement
    #[serde(default)]
    pub gate: QualityGateSettings,

    /// Report destinations
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration construction and I/O methods for [`GateConfig`].
impl GateConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SonarGateError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            SonarGateError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Active scan target derived from the project section
    pub fn scan_target(&self) -> ScanTarget {
        self.project.target()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.project.validate()?;
        self.scan.validate()?;
        self.gate.validate()?;
        Ok(())
    }
}

/// Server connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the analysis server
    #[serde(default)]
    pub host: String,

    /// Access token; sent as Basic first, then Bearer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Whole-request timeout in seconds
    #[serde(default = "ServerConfig::default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(default = "ServerConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: None,
            http_timeout_secs: Self::default_http_timeout_secs(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
        }
    }
}

// Tokens must not end up in logs through `{:?}`.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl ServerConfig {
    const fn default_http_timeout_secs() -> u64 {
        10
    }

    const fn default_connect_timeout_secs() -> u64 {
        5
    }

    /// Host without trailing slashes, ready to have API paths appended
    pub fn base_url(&self) -> &str {
        self.host.trim().trim_end_matches('/')
    }

    /// Token, or an empty string when unset
    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    /// Whole-request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate server settings
    pub fn validate(&self) -> Result<()> {
        validate_http_url(&self.host, "server.host")?;
        validate_non_empty(self.token(), "server.token")?;
        validate_positive_u64(self.http_timeout_secs, "server.http_timeout_secs")?;
        validate_positive_u64(self.connect_timeout_secs, "server.connect_timeout_secs")?;
        Ok(())
    }
}

/// Project identity and scan target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project key; `/` is normalized to `:`
    #[serde(default)]
    pub key: String,

    /// Display name used as the JUnit package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Branch being analyzed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Pull request being analyzed; wins over `branch`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<String>,
}

impl ProjectConfig {
    /// Normalized project key
    pub fn normalized_key(&self) -> String {
        normalize_project_key(&self.key)
    }

    /// Name shown in reports, falling back to the key
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.key.trim())
    }

    /// Resolve the active scan target
    pub fn target(&self) -> ScanTarget {
        ScanTarget::resolve(
            &self.key,
            self.branch.as_deref(),
            self.pull_request.as_deref(),
        )
    }

    /// Validate project settings
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.key, "project.key")
    }
}

/// Where the analysis task comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory the scanner ran in
    #[serde(default = "ScanConfig::default_workspace")]
    pub workspace: PathBuf,

    /// Explicit descriptor path; defaults to `<workspace>/.scannerwork/report-task.txt`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_path: Option<PathBuf>,

    /// Skip the local descriptor and locate the latest analysis remotely
    #[serde(default)]
    pub skip_scan: bool,

    /// Compute engine task id to wait on instead of searching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Poll the task and fetch the verdict after a fresh scan
    #[serde(default = "ScanConfig::default_wait_for_quality_gate")]
    pub wait_for_quality_gate: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workspace: Self::default_workspace(),
            descriptor_path: None,
            skip_scan: false,
            task_id: None,
            wait_for_quality_gate: Self::default_wait_for_quality_gate(),
        }
    }
}

impl ScanConfig {
    fn default_workspace() -> PathBuf {
        PathBuf::from(".")
    }

    const fn default_wait_for_quality_gate() -> bool {
        true
    }

    /// Descriptor location, explicit or derived from the workspace
    pub fn descriptor_location(&self) -> PathBuf {
        self.descriptor_path
            .clone()
            .unwrap_or_else(|| default_descriptor_path(&self.workspace))
    }

    /// Explicit task id, ignoring blanks
    pub fn explicit_task_id(&self) -> Option<&str> {
        self.task_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Whether the task must be located on the server rather than read from disk
    pub fn locates_remotely(&self) -> bool {
        self.skip_scan || self.explicit_task_id().is_some()
    }

    /// Validate scan settings
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.descriptor_path {
            validate_non_empty(&path.to_string_lossy(), "scan.descriptor_path")?;
        }
        Ok(())
    }
}

/// Default descriptor path for a workspace
pub fn default_descriptor_path(workspace: &Path) -> PathBuf {
    workspace.join(SCANNER_WORK_DIR).join(DESCRIPTOR_FILE_NAME)
}

/// Which key the verdict is fetched by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictScope {
    /// The analysis produced by the task
    #[default]
    Analysis,
    /// The active branch, pull request or project
    Target,
}

impl std::str::FromStr for VerdictScope {
    type Err = SonarGateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" => Ok(Self::Analysis),
            "target" => Ok(Self::Target),
            other => Err(SonarGateError::config_field(
                format!("Unknown verdict scope '{other}', expected 'analysis' or 'target'"),
                "gate.scope",
            )),
        }
    }
}

/// Gate evaluation and enforcement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGateSettings {
    /// Verdict status that counts as passing, compared case-sensitively
    #[serde(default = "QualityGateSettings::default_expected_status")]
    pub expected_status: String,

    /// Fail the run when the verdict does not match
    #[serde(default = "QualityGateSettings::default_enforce")]
    pub enforce: bool,

    /// Exit code for a failing verdict
    #[serde(default = "QualityGateSettings::default_error_exit_code")]
    pub error_exit_code: i32,

    /// Delay between task status polls
    #[serde(default = "QualityGateSettings::default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall wait budget
    #[serde(default = "QualityGateSettings::default_timeout_secs")]
    pub timeout_secs: u64,

    /// Key the verdict is fetched by
    #[serde(default)]
    pub scope: VerdictScope,
}

impl Default for QualityGateSettings {
    fn default() -> Self {
        Self {
            expected_status: Self::default_expected_status(),
            enforce: Self::default_enforce(),
            error_exit_code: Self::default_error_exit_code(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            timeout_secs: Self::default_timeout_secs(),
            scope: VerdictScope::default(),
        }
    }
}

impl QualityGateSettings {
    fn default_expected_status() -> String {
        "OK".to_string()
    }

    const fn default_enforce() -> bool {
        true
    }

    const fn default_error_exit_code() -> i32 {
        1
    }

    const fn default_poll_interval_ms() -> u64 {
        500
    }

    const fn default_timeout_secs() -> u64 {
        300
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait budget as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate gate settings
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.expected_status, "gate.expected_status")?;
        validate_bounded_i32(self.error_exit_code, 1, 255, "gate.error_exit_code")?;
        validate_positive_u64(self.poll_interval_ms, "gate.poll_interval_ms")?;
        validate_positive_u64(self.timeout_secs, "gate.timeout_secs")?;

        if self.poll_interval_ms > self.timeout_secs.saturating_mul(1000) {
            return Err(SonarGateError::config_field(
                "gate.poll_interval_ms must not exceed gate.timeout_secs",
                "gate.poll_interval_ms",
            ));
        }

        Ok(())
    }
}

/// Report destinations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JUnit XML file
    #[serde(default = "OutputConfig::default_junit_path")]
    pub junit_path: PathBuf,

    /// Optional JSON file receiving the summary values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            junit_path: Self::default_junit_path(),
            summary_path: None,
        }
    }
}

impl OutputConfig {
    fn default_junit_path() -> PathBuf {
        PathBuf::from("sonarResults.xml")
    }
}
