//! Periodic cycle runner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::dispatch::{CycleReport, DispatchEngine};
use crate::error::WorkerResult;
use crate::stats::StatsAggregator;

/// Triggers a dispatch cycle on a fixed interval until shut down.
///
/// Cycles never overlap: the next tick is only awaited after the current
/// cycle has finished.
pub struct CycleRunner {
    engine: Arc<DispatchEngine>,
    stats: StatsAggregator,
    interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl CycleRunner {
    pub fn new(engine: Arc<DispatchEngine>, stats: StatsAggregator, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            engine,
            stats,
            interval,
            shutdown,
        }
    }

    /// Run one cycle and log per-channel stats afterwards.
    pub async fn run_once(&self) -> WorkerResult<CycleReport> {
        let report = self.engine.run_cycle().await?;
        self.log_stats().await;
        Ok(report)
    }

    /// Run cycles until [`shutdown`](Self::shutdown) is called.
    ///
    /// A failed cycle is logged and the next one runs on schedule.
    pub async fn run(&self) -> WorkerResult<()> {
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("Cycle runner started, interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Cycle runner shutting down");
                        break;
                    }
                }
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(report) => info!(
                            processed = report.processed,
                            uploaded = report.uploaded,
                            failed = report.failed,
                            skipped_capped = report.skipped_capped,
                            recovered = report.recovered,
                            "Cycle complete"
                        ),
                        Err(e) => error!("Dispatch cycle aborted: {}", e),
                    }
                }
            }
        }

        Ok(())
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    async fn log_stats(&self) {
        match self.stats.compute().await {
            Ok(stats) => {
                for s in stats.values() {
                    info!(
                        channel = %s.channel,
                        pending = s.pending,
                        processing = s.processing,
                        uploaded = s.uploaded,
                        failed = s.failed,
                        today_uploaded = s.today_uploaded,
                        "Channel stats"
                    );
                }
            }
            Err(e) => error!("Failed to compute stats: {}", e),
        }
    }
}
