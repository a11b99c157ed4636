//! greengridd — the GreenGrid daemon.
//!
//! Single binary that assembles the GreenGrid subsystems:
//! - State store (redb) holding the region catalog and workload records
//! - Allocation engine built from `greengrid.toml`
//! - Scheduler + metrics collector
//! - REST API
//!
//! # Usage
//!
//! ```text
//! greengridd serve --port 8000 --data-dir /var/lib/greengrid
//! greengridd seed --data-dir /var/lib/greengrid --file regions.json
//! greengridd reset --data-dir /var/lib/greengrid --yes
//! greengridd stats --data-dir /var/lib/greengrid
//! ```

mod seed;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use greengrid_core::GreenGridConfig;
use greengrid_metrics::MetricsCollector;
use greengrid_placement::AllocationEngine;
use greengrid_scheduler::Scheduler;
use greengrid_state::{StateStore, WorkloadFilter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATA_DIR: &str = "/var/lib/greengrid";
const DEFAULT_LOG_FILTER: &str =
    "info,greengridd=debug,greengrid_scheduler=debug,greengrid_placement=debug";
const DB_FILE: &str = "greengrid.redb";
const RECENT_WORKLOADS: usize = 10;

#[derive(Parser)]
#[command(name = "greengridd", about = "GreenGrid scheduling daemon")]
struct Cli {
    /// Path to greengrid.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API, seeding the sample catalog on first start.
    Serve {
        /// Port to listen on [default: 8000].
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state [default: /var/lib/greengrid].
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Load regions into an empty catalog.
    Seed {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// JSON array of regions to load instead of the sample catalog.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete every region and workload record, then re-seed.
    Reset {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long)]
        file: Option<PathBuf>,

        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
    /// Print the region catalog and recent workloads.
    Stats {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = match &cli.config {
        Some(path) => GreenGridConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GreenGridConfig::default(),
    };

    match cli.command {
        Command::Serve { port, data_dir } => {
            let port = port.or(config.port()).unwrap_or(DEFAULT_PORT);
            let store = open_store(&resolve_data_dir(data_dir, &config))?;
            run_server(port, store, &config).await
        }
        Command::Seed { data_dir, file } => {
            let store = open_store(&resolve_data_dir(data_dir, &config))?;
            let file = file.as_deref().or(config.seed_file());
            let written = seed::seed_if_empty(&store, file)?;
            println!("seeded {written} regions");
            Ok(())
        }
        Command::Reset {
            data_dir,
            file,
            yes,
        } => {
            if !yes {
                bail!("refusing to reset without --yes");
            }
            let store = open_store(&resolve_data_dir(data_dir, &config))?;
            let file = file.as_deref().or(config.seed_file());
            let written = seed::reset(&store, file)?;
            println!("reset complete, seeded {written} regions");
            Ok(())
        }
        Command::Stats { data_dir } => {
            let store = open_store(&resolve_data_dir(data_dir, &config))?;
            print_stats(&store)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn resolve_data_dir(flag: Option<PathBuf>, config: &GreenGridConfig) -> PathBuf {
    flag.or_else(|| config.data_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn open_store(data_dir: &Path) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    let db_path = data_dir.join(DB_FILE);
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}

async fn run_server(port: u16, store: StateStore, config: &GreenGridConfig) -> anyhow::Result<()> {
    info!("GreenGrid daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    seed::seed_if_empty(&store, config.seed_file())?;

    let engine = AllocationEngine::from_config(config)?;
    let weights = engine.policy().weights;
    info!(
        green_energy = weights.green_energy,
        cost = weights.cost,
        availability = weights.availability,
        latency = weights.latency,
        gpu_models = engine.policy().gpus.models().count(),
        "allocation engine initialized"
    );

    let metrics = Arc::new(MetricsCollector::new());
    let scheduler = Scheduler::new(store, engine, metrics);

    // ── Start API server ───────────────────────────────────────

    let router = greengrid_api::build_router(scheduler);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("GreenGrid daemon stopped");
    Ok(())
}

fn print_stats(store: &StateStore) -> anyhow::Result<()> {
    let regions = store.list_regions()?;
    println!("Regions ({}):", regions.len());
    for r in &regions {
        println!(
            "  {:<16} {:<28} green {:>5.1}  carbon {:>5.0} g/kWh  ${:.3}/kWh{}",
            r.region_id,
            r.name,
            r.green_energy_score,
            r.carbon_intensity,
            r.electricity_cost,
            if r.is_active { "" } else { "  (inactive)" }
        );
    }

    let workloads = store.list_workloads(&WorkloadFilter::default())?;
    println!(
        "Workloads ({}), most recent {}:",
        workloads.len(),
        RECENT_WORKLOADS.min(workloads.len())
    );
    for w in workloads.iter().take(RECENT_WORKLOADS) {
        println!(
            "  {}  {:<24} {:<10} {:<16} {}",
            w.workload_id,
            w.name,
            w.status.label(),
            w.region_id.as_deref().unwrap_or("-"),
            w.created_at.to_rfc3339()
        );
    }
    Ok(())
}
