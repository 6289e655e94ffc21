//! Sonargate CLI - quality gate step for CI pipelines
//!
//! Waits for a code-quality analysis to finish, evaluates its quality gate,
//! writes a JUnit report, and exits non-zero when an enforced gate fails.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    let exit_code = match cli.command {
        Commands::Check(args) => cli::check_command(*args).await?,
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
            0
        }
        Commands::InitConfig(args) => {
            cli::init_config(args).await?;
            0
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args).await?;
            0
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for reports and YAML.
fn init_tracing(verbose: bool, format: LogFormat) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
