//! Readiness selection: which pending jobs a cycle may dispatch.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use shortcast_models::{DayBasis, DayKey, JobStatus, Platform, VideoJob};
use shortcast_store::{JobStore, RateCounter};

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// A job claimed for dispatch in the current cycle.
#[derive(Debug, Clone)]
pub struct AdmittedJob {
    /// The claimed record, already `processing`
    pub job: VideoJob,
    /// Quota day the job counts against
    pub day: DayKey,
    /// Platforms with a reserved slot under the daily cap
    pub admitted: Vec<Platform>,
    /// Platforms excluded because their cap was already reached
    pub deferred: Vec<Platform>,
}

/// Outcome of one selection pass.
///
/// A storage error stops the pass early but keeps the jobs claimed before
/// it, so they can still be dispatched.
#[derive(Debug, Default)]
pub struct Selection {
    pub admitted: Vec<AdmittedJob>,
    /// Due jobs left `pending` because every required platform was capped
    pub skipped_capped: usize,
    /// Error that cut the pass short
    pub error: Option<WorkerError>,
}

/// Picks due `pending` jobs and admits them against the daily cap.
///
/// Enumeration order is whatever the store yields; callers must not rely
/// on FIFO. Counters are incremented when a job is admitted, before any
/// upload is attempted, so concurrent dispatch can never exceed the cap.
#[derive(Clone)]
pub struct ReadinessSelector {
    jobs: JobStore,
    counter: RateCounter,
    daily_cap: u64,
}

impl ReadinessSelector {
    pub fn new(jobs: JobStore, counter: RateCounter, daily_cap: u64) -> Self {
        Self {
            jobs,
            counter,
            daily_cap,
        }
    }

    /// Admit up to `limit` jobs due at `now`.
    pub async fn select(&self, limit: usize, now: DateTime<Utc>) -> Selection {
        let mut selection = Selection::default();
        if limit > 0 {
            if let Err(e) = self.fill(&mut selection, limit, now).await {
                selection.error = Some(e);
            }
        }
        selection
    }

    async fn fill(
        &self,
        selection: &mut Selection,
        limit: usize,
        now: DateTime<Utc>,
    ) -> WorkerResult<()> {
        let mut scan = self.jobs.scan();
        while let Some(job) = scan.next().await {
            let job = job?;
            if job.status != JobStatus::Pending || !job.is_due(now) {
                continue;
            }

            let day = DayKey::for_job(&job, DayBasis::ScheduledAt);
            let required = job.pending_platforms();

            let mut admitted = Vec::with_capacity(required.len());
            let mut deferred = Vec::new();
            for platform in required.iter().copied() {
                let count = self.counter.get_count(job.channel, platform, &day).await?;
                if count >= self.daily_cap {
                    debug!(
                        job_id = %job.id,
                        channel = %job.channel,
                        platform = %platform,
                        count,
                        "Daily cap reached"
                    );
                    deferred.push(platform);
                } else {
                    admitted.push(platform);
                }
            }

            if !required.is_empty() && admitted.is_empty() {
                info!(
                    job_id = %job.id,
                    channel = %job.channel,
                    day = %day,
                    "Skipping job, daily cap reached on every platform"
                );
                metrics::record_job_skipped_capped(job.channel);
                selection.skipped_capped += 1;
                continue;
            }

            let Some(claimed) = self.jobs.claim(&job, now).await? else {
                debug!(job_id = %job.id, "Job changed before it could be claimed");
                continue;
            };

            for platform in &admitted {
                if let Err(e) = self.counter.increment(claimed.channel, *platform, &day).await {
                    self.release(&claimed, now).await;
                    return Err(e.into());
                }
            }

            metrics::record_job_admitted(claimed.channel);
            selection.admitted.push(AdmittedJob {
                job: claimed,
                day,
                admitted,
                deferred,
            });

            if selection.admitted.len() >= limit {
                break;
            }
        }

        Ok(())
    }

    /// Put a job whose reservation failed back to `pending`.
    async fn release(&self, claimed: &VideoJob, now: DateTime<Utc>) {
        match self.jobs.requeue(claimed, now).await {
            Ok(Some(_)) => warn!(job_id = %claimed.id, "Released claim after failed reservation"),
            Ok(None) => debug!(job_id = %claimed.id, "Claim already changed, nothing to release"),
            Err(e) => error!(
                job_id = %claimed.id,
                "Could not release claim, left for the recovery sweep: {}", e
            ),
        }
    }
}
