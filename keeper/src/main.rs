use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use common::logger::init_logger;
use keeper::{
    chain::{JsonSnapshotReader, LogSubmitter, PairId},
    config::AppConfig,
    cycle::UpdateCycle,
    market::load_signal,
    metrics::counters::Counters,
    planner::SignalEngine,
};

#[derive(Debug, Parser)]
#[clap(name = "curve-keeper", version)]
struct Cli {
    /// Pair to update: a `0x` bytes32 id, or a label hashed with keccak256 (e.g. WETH/USDC)
    #[clap(long)]
    pair: String,

    /// JSON export of the pair's current on-chain curve parameters
    #[clap(long)]
    snapshot_file: PathBuf,

    /// JSON file with the latest forecast and close series
    #[clap(long)]
    signal_file: PathBuf,

    /// Build and print the plan without submitting any call
    #[clap(long)]
    dry_run: bool,

    /// Repeat the cycle every N seconds instead of running once
    #[clap(long)]
    interval_secs: Option<u64>,

    /// Emit logs as JSON lines (also enabled by APP_ENV=production)
    #[clap(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("curve-keeper", cli.json_logs || is_production);

    let cfg = AppConfig::from_env().context("invalid keeper configuration")?;
    let pair: PairId = cli.pair.parse().context("invalid --pair")?;

    tracing::info!(
        %pair,
        dry_run = cli.dry_run,
        price_tolerance = cfg.signal.price_tolerance,
        volatility_threshold = cfg.signal.volatility_threshold,
        volatility_window = cfg.volatility_window,
        "starting curve keeper"
    );

    let cycle = UpdateCycle::new(
        SignalEngine::new(cfg.signal.clone()),
        Arc::new(JsonSnapshotReader::new(&cli.snapshot_file)),
        Arc::new(LogSubmitter),
        pair,
        cfg.volatility_window,
        cli.dry_run,
        Counters::default(),
    );

    match cli.interval_secs {
        None => {
            let signal = load_signal(&cli.signal_file).await?;
            let report = cycle.run_once(&signal).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(secs) => {
            let signal_file = cli.signal_file.clone();
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = ?e, "failed to listen for shutdown signal");
                }
                tracing::info!("Shutdown signal received");
            };

            cycle
                .run_periodic(
                    Duration::from_secs(secs.max(1)),
                    move || {
                        let path = signal_file.clone();
                        async move { load_signal(&path).await }
                    },
                    shutdown,
                )
                .await;
        }
    }

    Ok(())
}
