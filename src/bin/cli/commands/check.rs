//! The `check` command: run the gate and turn the outcome into an exit code.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use sonargate_rs::core::pipeline::ProgressCallback;
use sonargate_rs::{GateDecision, GateRunner};

use crate::cli::args::CheckArgs;
use crate::cli::config_layer::build_layered_gate_config;
use crate::cli::output::{
    display_gate_outcome, display_no_verdict, display_run_overview, print_named_values,
};

/// Run the quality gate and return the process exit code.
pub async fn check_command(args: CheckArgs) -> anyhow::Result<i32> {
    let config = build_layered_gate_config(&args)?;
    let quiet = args.quiet;

    if !quiet {
        display_run_overview(&config);
    }

    let runner = GateRunner::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create gate runner: {}", e))?;

    let spinner = (!quiet).then(new_spinner).transpose()?;
    let progress: Option<ProgressCallback> = spinner.as_ref().map(|pb| {
        let pb = pb.clone();
        Box::new(move |stage: &str, percent: f64| {
            pb.set_message(format!("{stage} ({percent:.0}%)"));
        }) as ProgressCallback
    });

    let outcome = match runner.run_with_progress(progress).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(pb) = &spinner {
                pb.abandon_with_message("Quality gate check aborted");
            }
            if e.is_no_verdict() {
                display_no_verdict(&e);
            }
            return Err(anyhow::anyhow!("Quality gate check failed: {}", e));
        }
    };

    if let Some(pb) = &spinner {
        pb.finish_with_message("Quality gate check complete");
        println!();
    }

    if quiet {
        if let Some(report) = &outcome.report {
            print_named_values(&report.summary);
        }
    } else {
        display_gate_outcome(&outcome);
    }

    let exit_code = outcome.exit_code(&runner.config().gate);
    if outcome.decision == GateDecision::Failed && exit_code == 0 {
        info!("Quality gate failed but enforcement is off; exiting successfully");
    }
    Ok(exit_code)
}

fn new_spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.bright_blue} {msg} {elapsed_precise}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Starting quality gate check");
    Ok(pb)
}
