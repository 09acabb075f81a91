//! Dispatch engine: one metadata payload, fanned out to every platform.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{info, Instrument};

use shortcast_metadata::{generate_or_fallback, MetadataGenerator, MetadataSource};
use shortcast_models::{AggregationPolicy, JobId, JobPatch, JobStatus, PlatformStatus, VideoJob, VideoMetadata};
use shortcast_platforms::{UploadError, UploaderRegistry};
use shortcast_store::{JobStore, RateCounter};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::recovery::RecoverySweeper;
use crate::selector::{AdmittedJob, ReadinessSelector, Selection};

/// Summary of one dispatch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Jobs that reached a terminal status this cycle
    pub processed: usize,
    pub uploaded: usize,
    pub failed: usize,
    /// Due jobs left `pending` because of the daily cap
    pub skipped_capped: usize,
    /// Stale jobs requeued before selection
    pub recovered: usize,
}

/// Runs dispatch cycles.
///
/// Each cycle sweeps stale claims, selects a batch, then for every job
/// generates metadata once and uploads to each admitted platform
/// concurrently. A failing platform never stops the others; a job-level
/// error marks the job `failed`. Only storage I/O errors abort the cycle.
pub struct DispatchEngine {
    jobs: JobStore,
    selector: ReadinessSelector,
    sweeper: RecoverySweeper,
    metadata: Arc<dyn MetadataGenerator>,
    uploaders: UploaderRegistry,
    policy: AggregationPolicy,
    batch_size: usize,
    max_concurrent_jobs: usize,
    metadata_timeout: Duration,
}

impl DispatchEngine {
    pub fn new(
        jobs: JobStore,
        counter: RateCounter,
        metadata: Arc<dyn MetadataGenerator>,
        uploaders: UploaderRegistry,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            selector: ReadinessSelector::new(jobs.clone(), counter, config.daily_cap),
            sweeper: RecoverySweeper::new(jobs.clone(), config.stale_after),
            jobs,
            metadata,
            uploaders: uploaders.with_timeout(config.upload_timeout),
            policy: config.aggregation_policy,
            batch_size: config.batch_size,
            max_concurrent_jobs: config.max_concurrent_jobs.max(1),
            metadata_timeout: config.metadata_timeout,
        }
    }

    pub async fn run_cycle(&self) -> WorkerResult<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as of `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> WorkerResult<CycleReport> {
        let started = Instant::now();
        let mut report = CycleReport {
            recovered: self.sweeper.sweep(now).await?,
            ..Default::default()
        };

        let Selection {
            admitted,
            skipped_capped,
            error: selection_error,
        } = self.selector.select(self.batch_size, now).await;
        report.skipped_capped = skipped_capped;

        info!(
            admitted = admitted.len(),
            skipped_capped,
            recovered = report.recovered,
            policy = %self.policy,
            "Dispatch cycle started"
        );

        // Jobs claimed before a selection error are still dispatched.
        let outcomes: Vec<WorkerResult<JobStatus>> = stream::iter(admitted)
            .map(|admitted| self.process_job(admitted))
            .buffer_unordered(self.max_concurrent_jobs)
            .collect()
            .await;

        let mut storage_error = selection_error;
        for outcome in outcomes {
            match outcome {
                Ok(status) => {
                    report.processed += 1;
                    match status {
                        JobStatus::Uploaded => report.uploaded += 1,
                        _ => report.failed += 1,
                    }
                }
                Err(e) => {
                    storage_error.get_or_insert(e);
                }
            }
        }

        metrics::record_cycle_duration(started.elapsed().as_secs_f64());

        if let Some(e) = storage_error {
            return Err(e);
        }

        info!(
            processed = report.processed,
            uploaded = report.uploaded,
            failed = report.failed,
            "Dispatch cycle finished"
        );
        Ok(report)
    }

    /// Drive one admitted job to a terminal status.
    ///
    /// Returns `Err` only for storage I/O failures, after a best-effort
    /// attempt to mark the job `failed`.
    async fn process_job(&self, admitted: AdmittedJob) -> WorkerResult<JobStatus> {
        let logger = JobLogger::new(&admitted.job.id, admitted.job.channel);
        let span = logger.create_span();
        let id = admitted.job.id.clone();
        let channel = admitted.job.channel;

        let result = self.deliver(&admitted, &logger).instrument(span).await;

        match result {
            Ok(status) => {
                metrics::record_job_finished(channel, status);
                Ok(status)
            }
            Err(e) => {
                logger.log_error(&format!("Dispatch failed: {}", e));
                let marked = self.mark_failed(&id, &logger).await;
                metrics::record_job_finished(channel, JobStatus::Failed);
                if e.is_storage() {
                    return Err(e);
                }
                marked.map(|_| JobStatus::Failed)
            }
        }
    }

    async fn deliver(&self, admitted: &AdmittedJob, logger: &JobLogger) -> WorkerResult<JobStatus> {
        let job = &admitted.job;
        logger.log_start(&format!(
            "pending -> processing, {} platform(s) admitted, {} deferred (day {})",
            admitted.admitted.len(),
            admitted.deferred.len(),
            admitted.day
        ));

        let metadata = self.resolve_metadata(job, logger).await?;

        let uploads = admitted.admitted.iter().map(|platform| {
            let platform = *platform;
            let metadata = &metadata;
            async move {
                let started = Instant::now();
                let result = self.uploaders.upload(job, platform, metadata).await;
                (platform, result, started.elapsed())
            }
        });

        let mut patch = JobPatch::new();
        for (platform, result, elapsed) in join_all(uploads).await {
            match result {
                Ok(receipt) => {
                    let detail = receipt.remote_id.map(|id| format!("remote id {}", id));
                    logger.log_platform(platform, "uploaded", None);
                    if let Some(detail) = detail {
                        logger.log_progress(&format!("{} accepted upload, {}", platform, detail));
                    }
                    metrics::record_platform_upload(platform, "uploaded", elapsed.as_secs_f64());
                    patch = patch.with_platform(platform, PlatformStatus::Uploaded, None);
                }
                Err(e) => {
                    logger.log_platform(platform, "failed", Some(&e.to_string()));
                    metrics::record_platform_upload(platform, e.code.as_str(), elapsed.as_secs_f64());
                    patch = patch.with_platform(platform, PlatformStatus::Failed, Some(e.to_string()));
                }
            }
        }

        for platform in &admitted.deferred {
            let e = UploadError::quota_exceeded(format!("daily cap reached for {}", admitted.day));
            logger.log_platform(*platform, "deferred", Some(&e.to_string()));
            patch = patch.with_platform(*platform, PlatformStatus::Failed, Some(e.to_string()));
        }

        let recorded = self.jobs.update_status(&job.id, JobStatus::Processing, patch).await?;
        let status = self.policy.aggregate(&recorded);
        self.jobs.update_status(&job.id, status, JobPatch::new()).await?;

        logger.log_completion(&format!("processing -> {} ({})", status, self.policy));
        Ok(status)
    }

    /// Reuse stored metadata, otherwise generate (or fall back) and persist it.
    async fn resolve_metadata(&self, job: &VideoJob, logger: &JobLogger) -> WorkerResult<VideoMetadata> {
        if let Some(existing) = job.metadata() {
            logger.log_progress("Reusing stored metadata");
            return Ok(existing);
        }

        let generated =
            generate_or_fallback(self.metadata.as_ref(), &job.prompt, self.metadata_timeout).await;
        match (generated.source, &generated.error) {
            (MetadataSource::Fallback, Some(error)) => {
                logger.log_warning(&format!("Metadata generation failed, using fallback: {}", error))
            }
            (source, _) => logger.log_progress(&format!("Metadata {}", source.as_str())),
        }

        let stored = self
            .jobs
            .update_status(
                &job.id,
                JobStatus::Processing,
                JobPatch::new().with_metadata(&generated.metadata),
            )
            .await?;

        // A concurrent writer may have filled the fields first.
        Ok(stored.metadata().unwrap_or(generated.metadata))
    }

    /// Fail-safe: never leave a job in `processing` after an error.
    ///
    /// Only a backend failure is reported; a vanished or already terminal
    /// job is logged and left alone.
    async fn mark_failed(&self, id: &JobId, logger: &JobLogger) -> WorkerResult<()> {
        match self.jobs.update_status(id, JobStatus::Failed, JobPatch::new()).await {
            Ok(_) => {
                logger.log_completion("processing -> failed");
                Ok(())
            }
            Err(e) if e.is_io() => {
                logger.log_error(&format!("Could not mark job failed: {}", e));
                Err(WorkerError::from(e))
            }
            Err(e) => {
                logger.log_warning(&format!("Job left as is, could not mark failed: {}", e));
                Ok(())
            }
        }
    }
}
