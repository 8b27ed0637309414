use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use hearthd_conditions::AutomationFile;
use hearthd_conditions::Config;
use hearthd_conditions::Engine;
use hearthd_conditions::device_automation;
use hearthd_conditions::format_diagnostics;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "hearthd-conditions", about = "Device conditions for hearthd sensors")]
struct Cli {
    /// Path to the device and entity configuration
    #[arg(short, long, default_value = "hearthd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the conditions a device offers
    Conditions { device_id: String },

    /// Describe the extra fields a condition on an entity accepts
    Capabilities {
        entity_id: String,

        #[arg(long, default_value = "sensor")]
        domain: String,
    },

    /// Validate an automation file and evaluate its conditions against the configured state
    Check { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(config.logging.targets())
        .init();

    tracing::info!("Loaded config from: {}", cli.config.display());

    let engine = Engine::from_config(&config).context("building device registry")?;

    match cli.command {
        Command::Conditions { device_id } => {
            match engine.device(&device_id) {
                Some(device) => tracing::info!("Listing conditions for {}", device),
                None => tracing::warn!("Device {} is not configured", device_id),
            }
            let conditions =
                device_automation::async_get_device_conditions(&engine, &device_id).await;
            println!("{}", serde_json::to_string_pretty(&conditions)?);
        }
        Command::Capabilities { entity_id, domain } => {
            let config = serde_json::json!({
                "condition": "device",
                "domain": domain,
                "entity_id": entity_id,
            });
            let capabilities =
                device_automation::async_get_condition_capabilities(&engine, &config)
                    .await
                    .with_context(|| format!("capabilities for {}", entity_id))?;
            println!("{}", serde_json::to_string_pretty(&capabilities)?);
        }
        Command::Check { path } => {
            let file = AutomationFile::load(&path)?;
            let state = engine.state_snapshot();
            let report = file.check(&engine, &state);

            for outcome in &report.outcomes {
                let verdict = if outcome.passed { "PASS" } else { "FAIL" };
                println!(
                    "{} condition #{} ({})",
                    verdict,
                    outcome.index + 1,
                    outcome.entity_id
                );
            }

            if !report.diagnostics.is_empty() {
                eprint!("{}", format_diagnostics(&report.diagnostics));
            }
            if report.has_errors() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
