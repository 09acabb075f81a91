//! Worker configuration.

use std::time::Duration;

use shortcast_metadata::MetadataClientConfig;
use shortcast_models::AggregationPolicy;

/// Headroom on top of the metadata client's own attempts.
const METADATA_DEADLINE_SLACK: Duration = Duration::from_secs(5);

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum uploads per (channel, platform) per day
    pub daily_cap: u64,
    /// Maximum jobs admitted per dispatch cycle
    pub batch_size: usize,
    /// How per-platform results decide the job status
    pub aggregation_policy: AggregationPolicy,
    /// Jobs dispatched concurrently within a cycle
    pub max_concurrent_jobs: usize,
    /// Deadline for one metadata generation, retries included
    pub metadata_timeout: Duration,
    /// Deadline for one platform upload
    pub upload_timeout: Duration,
    /// A `processing` job claimed longer ago than this is requeued
    pub stale_after: Duration,
    /// Time between dispatch cycles
    pub cycle_interval: Duration,
    /// Run a single cycle and exit
    pub run_once: bool,
    /// Log uploads instead of performing them
    pub dry_run: bool,
    /// Port for the Prometheus exporter, if any
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            daily_cap: 20,
            batch_size: 5,
            aggregation_policy: AggregationPolicy::AnyOf,
            max_concurrent_jobs: 1,
            metadata_timeout: Duration::from_secs(65),
            upload_timeout: Duration::from_secs(300),
            stale_after: Duration::from_secs(1800),
            cycle_interval: Duration::from_secs(7200), // every 2 hours
            run_once: false,
            dry_run: false,
            metrics_port: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// The metadata deadline keeps its default until
    /// [`with_metadata_client`](Self::with_metadata_client) is applied.
    pub fn from_env() -> Self {
        Self {
            daily_cap: env_parse("DAILY_CAP").unwrap_or(20),
            batch_size: env_parse("BATCH_SIZE").unwrap_or(5),
            aggregation_policy: env_parse("AGGREGATION_POLICY").unwrap_or_default(),
            max_concurrent_jobs: env_parse::<usize>("MAX_CONCURRENT_JOBS")
                .unwrap_or(1)
                .max(1),
            metadata_timeout: Self::default().metadata_timeout,
            upload_timeout: Duration::from_secs(env_parse("UPLOAD_TIMEOUT_SECS").unwrap_or(300)),
            stale_after: Duration::from_secs(env_parse("STALE_AFTER_SECS").unwrap_or(1800)),
            cycle_interval: Duration::from_secs(env_parse("CYCLE_INTERVAL_SECS").unwrap_or(7200)),
            run_once: env_flag("RUN_ONCE"),
            dry_run: env_flag("DRY_RUN"),
            metrics_port: env_parse("METRICS_PORT"),
        }
    }

    /// Size the metadata deadline to cover every attempt the client makes.
    pub fn with_metadata_client(mut self, client: &MetadataClientConfig) -> Self {
        self.metadata_timeout = client
            .timeout
            .saturating_mul(client.max_retries.saturating_add(1))
            .saturating_add(METADATA_DEADLINE_SLACK);
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
