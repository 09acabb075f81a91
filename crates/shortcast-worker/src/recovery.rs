//! Recovery of jobs left `processing` by an interrupted cycle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::warn;

use shortcast_store::JobStore;

use crate::error::WorkerResult;
use crate::metrics;

/// Requeues `processing` jobs whose claim is older than `stale_after`.
///
/// The requeue is version-checked, so a job that is still being written
/// by a live cycle is left alone. Per-platform results and stored metadata
/// survive, so the next dispatch only retries platforms still `pending`.
#[derive(Clone)]
pub struct RecoverySweeper {
    jobs: JobStore,
    stale_after: chrono::Duration,
}

impl RecoverySweeper {
    pub fn new(jobs: JobStore, stale_after: Duration) -> Self {
        let stale_after =
            chrono::Duration::from_std(stale_after).unwrap_or_else(|_| chrono::Duration::days(365));
        Self { jobs, stale_after }
    }

    /// Requeue every stale job; returns how many were requeued.
    pub async fn sweep(&self, now: DateTime<Utc>) -> WorkerResult<usize> {
        let mut recovered = 0;
        let mut scan = self.jobs.scan();
        while let Some(job) = scan.next().await {
            let job = job?;
            if !job.is_stale(now, self.stale_after) {
                continue;
            }

            if self.jobs.requeue(&job, now).await?.is_some() {
                warn!(
                    job_id = %job.id,
                    channel = %job.channel,
                    claimed_at = ?job.claimed_at,
                    attempts = job.attempts,
                    "Requeued stale processing job"
                );
                recovered += 1;
            }
        }

        if recovered > 0 {
            metrics::record_jobs_recovered(recovered);
        }
        Ok(recovered)
    }
}
