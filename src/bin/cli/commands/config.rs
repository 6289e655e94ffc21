//! Configuration management commands.
//!
//! Printing defaults, writing a starter file, and validating a file.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use sonargate_rs::core::config::{validate_http_url, validate_positive_u64, GateConfig};

use crate::cli::args::{InitConfigArgs, ValidateConfigArgs};
use crate::cli::output::display_config_summary;

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default sonargate configuration".dimmed());
    println!(
        "{}",
        "# Save this to .sonargate.yml and customize as needed".dimmed()
    );
    println!(
        "{}",
        "# Secrets such as server.token are better supplied via PLUGIN_SONAR_TOKEN".dimmed()
    );
    println!();

    let yaml_output = serde_yaml::to_string(&GateConfig::default())?;
    println!("{}", yaml_output);

    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {}. Use --force to overwrite or choose a different name with --output",
            args.output.display()
        ));
    }

    let yaml_content = serde_yaml::to_string(&GateConfig::default())?;
    tokio::fs::write(&args.output, yaml_content).await?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Set server.host and project.key");
    println!(
        "   2. Run the gate with: {}",
        format!("sonargate check --config {}", args.output.display()).cyan()
    );
    println!();
    println!(
        "{}",
        "🔧 Key settings you can customize:".bright_blue().bold()
    );

    #[derive(Tabled)]
    struct CustomizationRow {
        setting: &'static str,
        description: &'static str,
    }

    let customization_rows = vec![
        CustomizationRow {
            setting: "gate.expected_status",
            description: "Verdict status that passes (default: OK)",
        },
        CustomizationRow {
            setting: "gate.timeout_secs",
            description: "How long to wait for the analysis task (default: 300)",
        },
        CustomizationRow {
            setting: "gate.enforce",
            description: "Fail the step on a failing verdict (default: true)",
        },
        CustomizationRow {
            setting: "gate.scope",
            description: "Fetch the verdict by analysis or by branch/PR target",
        },
        CustomizationRow {
            setting: "scan.skip_scan",
            description: "Look the analysis up on the server instead of the descriptor",
        },
        CustomizationRow {
            setting: "output.summary_path",
            description: "Also write the summary values as JSON",
        },
    ];

    let mut table = Table::new(customization_rows);
    table.with(TableStyle::rounded());
    println!("{}", table);

    Ok(())
}

/// Validate a sonargate configuration file.
///
/// Connection and project settings may legitimately come from the
/// environment at run time, so when they are absent from the file they are
/// reported rather than rejected.
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );
    println!();

    let config = match load_and_check(&args) {
        Ok(config) => {
            println!(
                "{}",
                "✅ Configuration file is valid!".bright_green().bold()
            );
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "🔧 Common issues:".bright_blue().bold());
            println!("   • Check YAML syntax (indentation, colons, quotes)");
            println!("   • server.host must be an http(s) URL");
            println!("   • gate.poll_interval_ms must not exceed gate.timeout_secs");
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'sonargate print-default-config' to see valid format".dimmed()
            );
            return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
        }
    };

    display_config_summary(&config, args.detailed);

    let deferred = deferred_settings(&config);
    if !deferred.is_empty() {
        println!("{}", "💡 Supply at run time:".bright_blue().bold());
        for (field, variable) in deferred {
            println!("   • {} ({})", field, variable.dimmed());
        }
    }

    Ok(())
}

fn load_and_check(args: &ValidateConfigArgs) -> anyhow::Result<GateConfig> {
    let config = GateConfig::from_yaml_file(&args.config)?;

    if !config.server.host.trim().is_empty() {
        validate_http_url(&config.server.host, "server.host")?;
    }
    validate_positive_u64(config.server.http_timeout_secs, "server.http_timeout_secs")?;
    validate_positive_u64(config.server.connect_timeout_secs, "server.connect_timeout_secs")?;
    config.scan.validate()?;
    config.gate.validate()?;

    Ok(config)
}

/// Required settings the file leaves to flags or environment
fn deferred_settings(config: &GateConfig) -> Vec<(&'static str, &'static str)> {
    let mut deferred = Vec::new();
    if config.server.host.trim().is_empty() {
        deferred.push(("server.host", "PLUGIN_SONAR_HOST"));
    }
    if config.server.token().is_empty() {
        deferred.push(("server.token", "PLUGIN_SONAR_TOKEN"));
    }
    if config.project.key.trim().is_empty() {
        deferred.push(("project.key", "PLUGIN_SONAR_KEY"));
    }
    deferred
}
