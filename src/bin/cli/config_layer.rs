//! Configuration Layer Management
//!
//! Builds the effective [`GateConfig`] from three layers, later layers winning:
//! built-in defaults, a YAML file, then CLI flags and `PLUGIN_*` variables.

use std::path::PathBuf;

use sonargate_rs::core::config::{GateConfig, VerdictScope};

use crate::cli::args::{parse_scope, CheckArgs};

/// Local configuration files picked up when `--config` is absent
pub const IMPLICIT_CONFIG_FILES: [&str; 2] = [".sonargate.yml", ".sonargate.yaml"];

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another configuration into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

/// Convert CLI arguments to partial configuration overrides
pub trait FromCliArgs<T> {
    /// Create a partial configuration from CLI arguments
    fn from_cli_args(args: &T) -> Self;
}

/// Values set on the command line or through the environment.
///
/// Blank strings count as unset, since CI runners often export empty variables.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GateOverrides {
    pub host: Option<String>,
    pub token: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub project_key: Option<String>,
    pub project_name: Option<String>,
    pub branch: Option<String>,
    pub pull_request: Option<String>,
    pub workspace: Option<PathBuf>,
    pub descriptor_path: Option<PathBuf>,
    pub skip_scan: Option<bool>,
    pub task_id: Option<String>,
    pub wait_for_quality_gate: Option<bool>,
    pub expected_status: Option<String>,
    pub enforce: Option<bool>,
    pub error_exit_code: Option<i32>,
    pub poll_interval_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub scope: Option<VerdictScope>,
    pub junit_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_blank_u64(value: &Option<String>) -> Option<u64> {
    non_blank(value).and_then(|v| v.parse().ok())
}

fn non_blank_bool(value: &Option<String>) -> Option<bool> {
    non_blank(value).map(|v| v == "true")
}

fn non_blank_scope(value: &Option<String>) -> Option<VerdictScope> {
    non_blank(value).and_then(|v| parse_scope(&v).ok())
}

fn non_blank_path(value: &Option<PathBuf>) -> Option<PathBuf> {
    value
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty())
        .cloned()
}

impl FromCliArgs<CheckArgs> for GateOverrides {
    fn from_cli_args(args: &CheckArgs) -> Self {
        Self {
            host: non_blank(&args.server.host),
            token: non_blank(&args.server.token),
            http_timeout_secs: non_blank_u64(&args.server.http_timeout_secs),
            project_key: non_blank(&args.project.key),
            project_name: non_blank(&args.project.name),
            branch: non_blank(&args.project.branch),
            pull_request: non_blank(&args.project.pull_request),
            workspace: non_blank_path(&args.scan.workspace),
            descriptor_path: non_blank_path(&args.scan.descriptor),
            skip_scan: non_blank_bool(&args.scan.skip_scan),
            task_id: non_blank(&args.scan.task_id),
            wait_for_quality_gate: non_blank_bool(&args.scan.wait),
            expected_status: non_blank(&args.gate.expected_status),
            enforce: non_blank_bool(&args.gate.enforce),
            error_exit_code: args.gate.error_exit_code,
            poll_interval_ms: args.gate.poll_interval_ms,
            timeout_secs: non_blank_u64(&args.gate.timeout_secs),
            scope: non_blank_scope(&args.gate.scope),
            junit_path: non_blank_path(&args.output.junit_path),
            summary_path: non_blank_path(&args.output.summary_path),
        }
    }
}

impl ConfigMerge<GateOverrides> for GateConfig {
    fn merge_with(&mut self, other: GateOverrides) {
        if let Some(host) = other.host {
            self.server.host = host;
        }
        if other.token.is_some() {
            self.server.token = other.token;
        }
        if let Some(secs) = other.http_timeout_secs {
            self.server.http_timeout_secs = secs;
        }

        if let Some(key) = other.project_key {
            self.project.key = key;
        }
        if other.project_name.is_some() {
            self.project.name = other.project_name;
        }
        if other.branch.is_some() {
            self.project.branch = other.branch;
        }
        if other.pull_request.is_some() {
            self.project.pull_request = other.pull_request;
        }

        if let Some(workspace) = other.workspace {
            self.scan.workspace = workspace;
        }
        if other.descriptor_path.is_some() {
            self.scan.descriptor_path = other.descriptor_path;
        }
        if let Some(skip) = other.skip_scan {
            self.scan.skip_scan = skip;
        }
        if other.task_id.is_some() {
            self.scan.task_id = other.task_id;
        }
        if let Some(wait) = other.wait_for_quality_gate {
            self.scan.wait_for_quality_gate = wait;
        }

        if let Some(expected) = other.expected_status {
            self.gate.expected_status = expected;
        }
        if let Some(enforce) = other.enforce {
            self.gate.enforce = enforce;
        }
        if let Some(code) = other.error_exit_code {
            self.gate.error_exit_code = code;
        }
        if let Some(interval) = other.poll_interval_ms {
            self.gate.poll_interval_ms = interval;
        }
        if let Some(timeout) = other.timeout_secs {
            self.gate.timeout_secs = timeout;
        }
        if let Some(scope) = other.scope {
            self.gate.scope = scope;
        }

        if let Some(junit) = other.junit_path {
            self.output.junit_path = junit;
        }
        if other.summary_path.is_some() {
            self.output.summary_path = other.summary_path;
        }
    }
}

/// Explicit `--config`, otherwise the first implicit file that exists
pub fn config_file_for(args: &CheckArgs) -> Option<PathBuf> {
    args.config.clone().or_else(|| {
        IMPLICIT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    })
}

/// Build the validated configuration for a `check` run
pub fn build_layered_gate_config(args: &CheckArgs) -> anyhow::Result<GateConfig> {
    let mut config = match config_file_for(args) {
        Some(path) => GateConfig::from_yaml_file(&path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration from {}: {}", path.display(), e)
        })?,
        None => GateConfig::default(),
    };

    config.merge_with(GateOverrides::from_cli_args(args));

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}
