//! regcap - region capability issuer CLI
//!
//! Each invocation loads the configuration, opens the file-backed
//! capability store, registers the configured modules, recovers the
//! persisted capabilities and runs one command against them.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`REGCAP_*`)
//! 3. Config file given with `--config`
//! 4. Global config (`~/.regcap/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `REGCAP_HOST_NAMES`: Comma-separated front-end hosts
//! - `REGCAP_DEFAULT_TIMEOUT`: Capability lifetime in hours
//! - `REGCAP_DEFAULT_REGION_THREAT_LEVEL`: Level for regions without one
//! - `REGCAP_STORE_PATH`: Capability store directory

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regcap_runtime::{
    Bootstrap, CapabilityIssuer, CapabilityRecord, ConfigLoader, LocalFileStore, RegcapConfig,
    RouteTable, StartupReport,
};
use regcap_types::RegionHandle;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// regcap - region capability issuer
#[derive(Parser, Debug)]
#[command(name = "regcap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Capability store directory (overrides config and REGCAP_STORE_PATH)
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a fresh capability set for a region
    Issue {
        session: String,
        region: RegionHandle,
        /// Print the URL map as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke a region's capabilities
    Revoke { session: String, region: RegionHandle },

    /// Check whether a function may be called for a region (exit 1 if denied)
    Authorize {
        session: String,
        region: RegionHandle,
        function: String,
        /// Level used when neither the region nor the config names one
        #[arg(long, default_value = "")]
        default_level: String,
    },

    /// Show the stored capability record for a region
    Show { region: RegionHandle },

    /// List all stored capability records
    List,

    /// Re-attach persisted capabilities and print the recovery report
    Recover,
}

fn load_config(args: &Args) -> Result<RegcapConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(ref path) = args.config {
        loader = loader.with_config_file(path);
    }
    let mut config = loader.load().context("Config error")?;

    // CLI args override (highest priority)
    if let Some(ref path) = args.store {
        config.store.path = Some(path.clone());
    }
    Ok(config)
}

fn init_tracing(args: &Args) {
    // --debug > --verbose > RUST_LOG env > default "warn"
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries command output, logs go to stderr.
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args);

    let config = load_config(&args)?;
    let store_path = config.store.resolved_path();
    let store = LocalFileStore::new(store_path.clone())
        .with_context(|| format!("Failed to open capability store {}", store_path.display()))?;
    info!(path = %store.base_path().display(), "Capability store");

    let (issuer, report) = Bootstrap::new(config, Arc::new(RouteTable::new()))
        .start(store)
        .await?;

    run(&issuer, &report, args.command).await
}

async fn run(
    issuer: &CapabilityIssuer<LocalFileStore>,
    report: &StartupReport,
    command: Command,
) -> Result<ExitCode> {
    match command {
        Command::Issue {
            session,
            region,
            json,
        } => {
            let urls = issuer.issue(&session, region).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&urls)?);
            } else {
                for (module, url) in &urls {
                    println!("{module}\t{url}");
                }
            }
        }

        Command::Revoke { session, region } => {
            issuer.revoke(&session, region).await?;
            println!("revoked {region}");
        }

        Command::Authorize {
            session,
            region,
            function,
            default_level,
        } => {
            let allowed = issuer
                .authorize(&session, region, &function, &default_level)
                .await?;
            if !allowed {
                println!("denied");
                return Ok(ExitCode::FAILURE);
            }
            println!("allowed");
        }

        Command::Show { region } => match issuer.lookup(region).await? {
            Some(record) => println!("{}", record.to_json()?),
            None => println!("no capabilities for region {region}"),
        },

        Command::List => {
            for record in issuer.records().await? {
                print_summary(&record);
            }
        }

        Command::Recover => {
            let recovery = &report.recovery;
            println!("records loaded: {}", recovery.records_loaded);
            println!("routes reattached: {}", recovery.routes_reattached);
            for missing in &recovery.missing_modules {
                println!("missing module: {} (region {})", missing.module, missing.region);
            }
            for error in &recovery.undecodable {
                println!("undecodable record: {error}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(record: &CapabilityRecord) {
    let modules: Vec<&str> = record.urls.keys().map(String::as_str).collect();
    println!(
        "{}\t{}\t{}\t{}",
        record.region_handle,
        record.session_id,
        record.expiration.to_rfc3339(),
        modules.join(",")
    );
}
