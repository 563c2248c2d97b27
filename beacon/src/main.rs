//! beacon - CLI tool for the beacon analytics collector
//!
//! This tool provides commands for:
//! - Checking collector configuration
//! - Fetching aggregated dashboard data
//! - Requesting a privacy export of the user's data
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/beacon/config.toml (~/.config/beacon/config.toml)
//! - Logs: $XDG_STATE_HOME/beacon/beacon.log (~/.local/state/beacon/beacon.log)

use std::path::PathBuf;

use anyhow::{Context, Result};
use beacon_core::{CollectorClient, Config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Manage the beacon analytics collector integration")]
#[command(version)]
struct Args {
    /// Verbose output (writes a log file)
    #[arg(short, long)]
    verbose: bool,

    /// Bearer token for authenticated endpoints (overrides config)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show collector configuration and status
    Status,

    /// Fetch aggregated analytics dashboard data
    Dashboard,

    /// Request a privacy export of the current user's data
    Export {
        /// Write the export to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging if verbose
    let _log_guard = if args.verbose {
        Some(
            beacon_core::logging::init(&config.logging)
                .context("failed to initialize logging")?,
        )
    } else {
        None
    };

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Dashboard => cmd_dashboard(&config, args.token),
        Command::Export { output } => cmd_export(&config, args.token, output),
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Beacon Collector Configuration");
    println!("==============================");
    println!();

    let collector = &config.collector;

    match &collector.server_url {
        Some(url) => println!("Server URL:       {}", url),
        None => {
            println!("Server URL:       (not configured)");
            println!();
            println!("Configure the collector in {:?}:", Config::config_path());
            println!();
            println!("  [collector]");
            println!("  server_url = \"https://collector.example.com\"");
            return Ok(());
        }
    }

    println!(
        "API token:        {}",
        if collector.api_token.is_some() {
            "configured"
        } else {
            "(from auth state at runtime)"
        }
    );
    println!("Request timeout:  {}s", collector.timeout_secs);
    println!();
    println!("Tracking enabled: {}", config.tracking.enabled);
    println!("Debounce window:  {}ms", config.tracking.debounce_ms);
    println!("Queue capacity:   {} events", config.tracking.max_queue_events);

    Ok(())
}

fn cmd_dashboard(config: &Config, token: Option<String>) -> Result<()> {
    let client = build_client(config, token)?;
    let runtime = build_runtime()?;

    let data = runtime
        .block_on(client.dashboard_data())
        .context("failed to fetch dashboard data")?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn cmd_export(config: &Config, token: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let client = build_client(config, token)?;
    let runtime = build_runtime()?;

    let data = runtime
        .block_on(client.export_user_data())
        .context("failed to export user data")?;

    let rendered = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write export to {:?}", path))?;
            println!("Export written to {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn build_client(config: &Config, token: Option<String>) -> Result<CollectorClient> {
    let client = CollectorClient::new(config.collector.clone())
        .context("collector is not configured; run `beacon status`")?;
    if let Some(token) = token {
        client.set_token(token);
    }
    Ok(client)
}

/// Single-threaded runtime for the blocking CLI commands.
fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create async runtime")
}
