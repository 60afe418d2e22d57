//! CityScout - Cache-aside backend for location-based queries
//!
//! Main entry point for the CityScout server.

use cityscout::config::AppConfig;
use cityscout::freshness::TimeoutTable;
use cityscout::orchestrator::Orchestrator;
use cityscout::store::Store;
use cityscout::upstream::LiveUpstream;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// CityScout - location, weather, and event queries with a persistent cache
#[derive(Parser, Debug)]
#[command(name = "cityscout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/cityscout/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the cache database schema and exit
    InitDb,
}

#[tokio::main]
async fn main() {
    if let Err(e) = cityscout::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { port } => serve(config, port).await,
        Commands::InitDb => init_db(config),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Fatal error");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> cityscout::Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    }
}

async fn serve(config: AppConfig, port_override: Option<u16>) -> cityscout::Result<()> {
    // A timeout table with a missing resource type must fail the boot, not
    // the first request that hits the gap.
    let timeouts = TimeoutTable::default();
    timeouts.validate()?;

    let store = Arc::new(Store::open(&config.database)?);
    let upstream = Arc::new(LiveUpstream::from_keys(&config.api_keys));
    let orchestrator = Orchestrator::new(store, timeouts, upstream);

    let port = port_override.unwrap_or(config.port);
    let addr = format!("0.0.0.0:{}", port);
    cityscout::server::run(orchestrator, &addr).await
}

fn init_db(config: AppConfig) -> cityscout::Result<()> {
    let store = Store::open(&config.database)?;
    println!(
        "Cache database ready at {}",
        store.path().map(|p| p.display().to_string()).unwrap_or_default()
    );
    Ok(())
}
