//! Activity Bridge command-line entry point
//!
//! Loads configuration, sets up logging and runs the requested command
//! against the in-process host simulator.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use activity_bridge::commands::{KindsCommand, RequestSpec, SimulateCommand, SimulationReport};
use activity_bridge::core::{AnswerPolicy, BridgeConfig, LoggingConfig, APP_NAME, VERSION};
use activity_bridge::permissions::PermissionKind;

#[derive(Parser, Debug)]
#[command(name = "activity-bridge")]
#[command(version, about = "Activity shim and runtime permission bridge", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported permission kinds
    Kinds {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one activity lifetime against the simulated host
    Simulate {
        /// Permission kinds granted before the activity starts
        #[arg(long = "grant", value_name = "KIND")]
        grant: Vec<PermissionKind>,

        /// How the simulated user answers prompts: grant, deny or ignore
        #[arg(long)]
        answer: Option<AnswerPolicy>,

        /// Permission requests to issue, as KIND=HANDLE
        #[arg(long = "request", value_name = "KIND=HANDLE", required = true)]
        requests: Vec<RequestSpec>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load_from(path).await?,
        None => BridgeConfig::load().await?,
    };

    init_logging(&config.logging, cli.verbose)?;
    info!("{} v{} starting...", APP_NAME, VERSION);

    match cli.command {
        Command::Kinds { json } => {
            let kinds = KindsCommand.execute();
            if json {
                println!("{}", serde_json::to_string_pretty(&kinds)?);
            } else {
                for info in kinds {
                    println!(
                        "{:>2}  {:<24} {:<44} {}",
                        info.id,
                        info.kind,
                        info.host_name,
                        info.display_name
                    );
                }
            }
        }
        Command::Simulate { grant, answer, requests, json } => {
            let command = SimulateCommand { grant, answer, requests };
            let report = command.execute(&config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(logging.with_file)
        .with_line_number(logging.with_file)
        .try_init()
        .map_err(|e| anyhow!("failed to set tracing subscriber: {}", e))
}

fn print_report(report: &SimulationReport) {
    println!("Prompts shown: {}", report.prompts.len());
    for kind in &report.prompts {
        println!("  {}", kind);
    }

    println!("Callbacks invoked: {}", report.invocations.len());
    for invocation in &report.invocations {
        let outcome = if invocation.granted { "granted" } else { "denied" };
        println!("  {} -> {}", invocation.handle, outcome);
    }

    println!("Pending at destroy: {}", report.pending.len());
    for (kind, handle) in &report.pending {
        println!("  {} -> {}", kind, handle);
    }

    for kind in &report.undeclared {
        println!("warning: {} ({}) is not declared by the application", kind, kind.host_name());
    }
}
