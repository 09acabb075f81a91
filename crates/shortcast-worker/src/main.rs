//! Dispatch worker binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shortcast_metadata::{ChatMetadataClient, MetadataClientConfig};
use shortcast_platforms::{StaticCredentials, UploaderRegistry};
use shortcast_store::{JobStore, RateCounter, StoreConfig};
use shortcast_worker::{metrics, CycleRunner, DispatchEngine, StatsAggregator, WorkerConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Worker failed: {:#}", e);
        std::process::exit(1);
    }
    info!("Worker shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    info!("Starting shortcast-worker");

    let metadata_config = MetadataClientConfig::from_env();
    let config = WorkerConfig::from_env().with_metadata_client(&metadata_config);
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        metrics::init_metrics(port)?;
        info!("Serving Prometheus metrics on port {}", port);
    }

    let store_config = StoreConfig::from_env();
    let kv = store_config
        .connect()
        .await
        .context("Failed to open key-value store")?;
    let jobs = JobStore::new(kv.clone(), store_config.key_space());
    let counter = RateCounter::new(kv, store_config.key_space());

    if metadata_config.api_key.is_none() {
        warn!("GROQ_API_KEY not set, every job will use fallback metadata");
    }
    let metadata = Arc::new(ChatMetadataClient::new(metadata_config)?);

    let uploaders = if config.dry_run {
        info!("DRY_RUN enabled, uploads are logged only");
        UploaderRegistry::dry_run()
    } else {
        let credentials = StaticCredentials::from_env();
        info!("Loaded {} platform credentials", credentials.len());
        // Transports are plugged in by the deployment; unregistered
        // platforms are recorded as unsupported_platform failures.
        UploaderRegistry::new(Arc::new(credentials))
    };

    let engine = Arc::new(DispatchEngine::new(
        jobs.clone(),
        counter,
        metadata,
        uploaders,
        &config,
    ));
    let runner = Arc::new(CycleRunner::new(
        engine,
        StatsAggregator::new(jobs),
        config.cycle_interval,
    ));

    if config.run_once {
        let report = runner.run_once().await?;
        info!("Single cycle finished: {:?}", report);
        return Ok(());
    }

    // Setup signal handler
    let signal_runner = runner.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_runner.shutdown();
    });

    runner.run().await?;
    Ok(())
}

/// Colored output for dev, JSON for production.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("shortcast=info,info"))
        .context("Invalid log filter")?;

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}
