//! Terminal display functions for gate runs
//!
//! Colored banners plus rounded `tabled` tables for the run settings, the
//! verdict's conditions, and the summary values later pipeline steps read.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use sonargate_rs::core::config::GateConfig;
use sonargate_rs::core::model::QualityCondition;
use sonargate_rs::io::reports::RateCategory;
use sonargate_rs::{GateDecision, GateOutcome, SonarGateError, SummaryRecord};

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn setting(name: &str, value: impl Into<String>) -> SettingRow {
    SettingRow {
        setting: name.to_string(),
        value: value.into(),
    }
}

fn print_rounded<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}

/// Settings a `check` run is about to use.
pub fn display_run_overview(config: &GateConfig) {
    println!("{}", "🚦 Quality Gate Check".bright_blue().bold());
    println!();

    let task_source = if config.scan.skip_scan {
        "server lookup".to_string()
    } else if let Some(task_id) = config.scan.explicit_task_id() {
        format!("task {task_id}")
    } else {
        config.scan.descriptor_location().display().to_string()
    };

    let rows = vec![
        setting("Server", config.server.base_url()),
        setting("Project", config.project.display_name()),
        setting("Target", config.scan_target().to_string()),
        setting("Task source", task_source),
        setting("Expected status", config.gate.expected_status.clone()),
        setting("Timeout", format!("{}s", config.gate.timeout_secs)),
        setting("Enforced", config.gate.enforce.to_string()),
    ];
    print_rounded(rows);
    println!();
}

#[derive(Tabled)]
struct ConditionRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "New code")]
    new_code: String,
}

impl From<&QualityCondition> for ConditionRow {
    fn from(condition: &QualityCondition) -> Self {
        Self {
            metric: condition.metric_key.clone(),
            status: condition.status.clone(),
            actual: condition.actual_value.clone(),
            rule: format!("{} {}", condition.comparator, condition.error_threshold),
            new_code: if condition.is_new_code() { "yes" } else { "" }.to_string(),
        }
    }
}

/// Banner, condition table and summary for a finished run.
pub fn display_gate_outcome(outcome: &GateOutcome) {
    match outcome.decision {
        GateDecision::Passed => println!(
            "{}",
            "✅ Quality gate PASSED".bright_green().bold()
        ),
        GateDecision::Failed => println!(
            "{} {}",
            "❌ Quality gate FAILED".red().bold(),
            format!("(expected {})", outcome.expected_status).dimmed()
        ),
        GateDecision::NotEvaluated => {
            println!(
                "{}",
                "⏭️  Quality gate not evaluated (waiting disabled)".yellow()
            );
            return;
        }
    }

    if let Some(verdict) = &outcome.verdict {
        println!("   Status: {}", verdict.status().bold());
        if verdict.ignored_conditions() {
            println!(
                "   {}",
                "Some conditions were ignored by the server".dimmed()
            );
        }
        println!();

        if !verdict.conditions().is_empty() {
            let rows: Vec<ConditionRow> = verdict.conditions().iter().map(Into::into).collect();
            print_rounded(rows);
            println!();
        }
    }

    if let Some(report) = &outcome.report {
        display_summary(&report.summary);
    }

    if let Some(url) = &outcome.dashboard_url {
        println!("   {} {}", "Dashboard:".dimmed(), url.cyan());
    }
    if let Some(path) = &outcome.junit_path {
        println!(
            "   {} {}",
            "JUnit report:".dimmed(),
            path.display().to_string().cyan()
        );
    }
}

/// Summary counts and the named values exported for later steps.
pub fn display_summary(summary: &SummaryRecord) {
    let category = summary.category();
    let label = match category {
        RateCategory::Excellent => category.label().bright_green().to_string(),
        RateCategory::Good => category.label().yellow().to_string(),
        RateCategory::NeedsImprovement => category.label().red().to_string(),
    };
    println!(
        "{} {:.2}% ({})",
        "📊 Success rate:".bright_blue().bold(),
        summary.success_rate,
        label
    );

    let rows: Vec<SettingRow> = summary
        .named_values()
        .into_iter()
        .map(|(name, value)| setting(name, value))
        .collect();
    print_rounded(rows);
    println!();
}

/// Plain `NAME=value` lines for quiet runs, one per summary value.
pub fn print_named_values(summary: &SummaryRecord) {
    for (name, value) in summary.named_values() {
        println!("{name}={value}");
    }
}

/// Banner for runs that ended before the server produced any verdict.
pub fn display_no_verdict(err: &SonarGateError) {
    eprintln!();
    eprintln!(
        "{}",
        "⛔ No quality gate verdict was produced".red().bold()
    );
    eprintln!("   {}", err);
    eprintln!(
        "   {}",
        "The analysis task did not finish successfully; no report was written.".dimmed()
    );
}

/// Configuration summary used by `validate-config`.
pub fn display_config_summary(config: &GateConfig, detailed: bool) {
    println!("{}", "🛠️  Configuration Summary".bright_blue().bold());
    println!();

    let mut rows = vec![
        setting("Server", display_or_unset(config.server.base_url())),
        setting("Token", if config.server.token().is_empty() { "(unset)" } else { "(set)" }),
        setting("Project key", display_or_unset(&config.project.key)),
        setting("Expected status", config.gate.expected_status.clone()),
        setting("Enforced", config.gate.enforce.to_string()),
        setting("JUnit report", config.output.junit_path.display().to_string()),
    ];

    if detailed {
        rows.extend([
            setting("HTTP timeout", format!("{}s", config.server.http_timeout_secs)),
            setting("Connect timeout", format!("{}s", config.server.connect_timeout_secs)),
            setting("Workspace", config.scan.workspace.display().to_string()),
            setting(
                "Descriptor",
                config.scan.descriptor_location().display().to_string(),
            ),
            setting("Skip scan", config.scan.skip_scan.to_string()),
            setting("Wait for gate", config.scan.wait_for_quality_gate.to_string()),
            setting("Poll interval", format!("{}ms", config.gate.poll_interval_ms)),
            setting("Timeout", format!("{}s", config.gate.timeout_secs)),
            setting("Error exit code", config.gate.error_exit_code.to_string()),
            setting("Verdict scope", format!("{:?}", config.gate.scope).to_lowercase()),
            setting(
                "Summary file",
                config
                    .output
                    .summary_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string()),
            ),
        ]);
    }

    print_rounded(rows);
    println!();
}

fn display_or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "(unset)".to_string()
    } else {
        value.to_string()
    }
}
