//! CLI argument structures.
//!
//! Every `check` option can also be supplied through the `PLUGIN_*`
//! environment variables a CI plugin runner exports.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use sonargate_rs::core::config::VerdictScope;

/// Quality gate step for CI pipelines
#[derive(Parser)]
#[command(name = "sonargate")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "Exit status is 0 when the gate passes, or when enforcement is off.\n\
A failing verdict exits with gate.error_exit_code (default 1)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wait for the analysis and evaluate its quality gate
    Check(Box<CheckArgs>),

    /// Print default configuration
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Configuration file path (defaults to .sonargate.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Suppress the progress spinner and tables
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(flatten)]
    pub gate: GateArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Server connection
#[derive(Args, Default)]
pub struct ServerArgs {
    /// Server base URL
    #[arg(long = "host", env = "PLUGIN_SONAR_HOST")]
    pub host: Option<String>,

    /// Access token
    #[arg(long = "token", env = "PLUGIN_SONAR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long = "http-timeout", env = "PLUGIN_TIMEOUT", value_parser = parse_optional_u64)]
    pub http_timeout_secs: Option<String>,
}

/// Project identity and scan target
#[derive(Args, Default)]
pub struct ProjectArgs {
    /// Project key; '/' is normalized to ':'
    #[arg(long = "project-key", env = "PLUGIN_SONAR_KEY")]
    pub key: Option<String>,

    /// Project display name
    #[arg(long = "project-name", env = "PLUGIN_SONAR_NAME")]
    pub name: Option<String>,

    /// Branch to evaluate
    #[arg(long, env = "PLUGIN_BRANCH")]
    pub branch: Option<String>,

    /// Pull request to evaluate; takes precedence over the branch
    #[arg(long = "pull-request", env = "PLUGIN_PR_KEY")]
    pub pull_request: Option<String>,
}

/// Task location
#[derive(Args, Default)]
pub struct ScanArgs {
    /// Directory the scanner ran in
    #[arg(long, env = "PLUGIN_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Scanner descriptor file (report-task.txt)
    #[arg(long)]
    pub descriptor: Option<PathBuf>,

    /// Locate the analysis on the server instead of reading the descriptor
    #[arg(
        long,
        env = "PLUGIN_SKIP_SCAN",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_optional_bool
    )]
    pub skip_scan: Option<String>,

    /// Compute engine task id to wait on
    #[arg(long, env = "PLUGIN_TASK_ID")]
    pub task_id: Option<String>,

    /// Wait for the task and fetch the verdict after a fresh scan
    #[arg(
        long,
        env = "PLUGIN_WAIT_QUALITYGATE",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_optional_bool
    )]
    pub wait: Option<String>,
}

/// Gate evaluation
#[derive(Args, Default)]
pub struct GateArgs {
    /// Verdict status that counts as passing
    #[arg(long = "expected-status", env = "PLUGIN_QUALITYGATE")]
    pub expected_status: Option<String>,

    /// Fail the process when the verdict does not match
    #[arg(
        long,
        env = "PLUGIN_SONAR_QUALITY_ENABLED",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_optional_bool
    )]
    pub enforce: Option<String>,

    /// Exit code for a failing verdict
    #[arg(long = "error-exit-code")]
    pub error_exit_code: Option<i32>,

    /// Delay between task polls in milliseconds
    #[arg(long = "poll-interval-ms")]
    pub poll_interval_ms: Option<u64>,

    /// Overall wait budget in seconds
    #[arg(
        long = "gate-timeout",
        env = "PLUGIN_SONAR_QUALITYGATE_TIMEOUT",
        value_parser = parse_optional_u64
    )]
    pub timeout_secs: Option<String>,

    /// Key the verdict is fetched by: analysis or target
    #[arg(long, env = "PLUGIN_QG_TYPE", value_parser = parse_optional_scope)]
    pub scope: Option<String>,
}

/// Report destinations
#[derive(Args, Default)]
pub struct OutputArgs {
    /// JUnit XML output file
    #[arg(long = "junit", env = "PLUGIN_JUNIT_PATH")]
    pub junit_path: Option<PathBuf>,

    /// JSON summary output file
    #[arg(long = "summary", env = "PLUGIN_SUMMARY_PATH")]
    pub summary_path: Option<PathBuf>,
}

/// Parse a verdict scope; the plugin's `branch`, `pullRequest` and
/// `projectKey` values all select the target scope.
pub fn parse_scope(value: &str) -> Result<VerdictScope, String> {
    match value.trim() {
        "branch" | "pullRequest" | "projectKey" => Ok(VerdictScope::Target),
        other => other.parse().map_err(|e: sonargate_rs::SonarGateError| e.to_string()),
    }
}

// The typed `check` options below are kept as normalized strings so a blank
// environment variable parses as "" and is dropped later like any other
// blank setting. Non-blank values are still rejected at parse time.

fn parse_optional_u64(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    value
        .parse::<u64>()
        .map(|n| n.to_string())
        .map_err(|e| format!("invalid number '{value}': {e}"))
}

fn parse_optional_bool(value: &str) -> Result<String, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(String::new()),
        "true" | "yes" | "y" | "on" | "1" => Ok("true".to_string()),
        "false" | "no" | "n" | "off" | "0" => Ok("false".to_string()),
        other => Err(format!("invalid boolean '{other}'")),
    }
}

fn parse_optional_scope(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    parse_scope(value).map(|scope| match scope {
        VerdictScope::Analysis => "analysis".to_string(),
        VerdictScope::Target => "target".to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".sonargate.yml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Configuration file to validate
    #[arg(short, long)]
    pub config: PathBuf,

    /// Show detailed configuration breakdown
    #[arg(long)]
    pub detailed: bool,
}
