//! Job store: CRUD over video job records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info, warn};

use shortcast_models::{JobId, JobPatch, JobStatus, NewJob, VideoJob};

use crate::error::{StoreError, StoreResult};
use crate::keys::KeySpace;
use crate::kv::KvStore;

/// Store of `VideoJob` records keyed by `job:<id>`.
///
/// Status updates are best-effort overwrites. Only `claim` and `requeue`
/// are conditional, keyed on the record's `version`.
#[derive(Clone)]
pub struct JobStore {
    kv: Arc<dyn KvStore>,
    keys: KeySpace,
}

impl JobStore {
    pub fn new(kv: Arc<dyn KvStore>, keys: KeySpace) -> Self {
        Self { kv, keys }
    }

    /// Persist a new `pending` job under a fresh id.
    pub async fn create(&self, new: NewJob) -> StoreResult<JobId> {
        self.create_at(new, Utc::now()).await
    }

    /// Same as [`create`](Self::create) with an explicit creation time.
    pub async fn create_at(&self, new: NewJob, now: DateTime<Utc>) -> StoreResult<JobId> {
        loop {
            let job = VideoJob::create(new.clone(), JobId::new(), now);
            let key = self.keys.job_key(&job.id);
            let payload = serde_json::to_string(&job)?;

            // Never overwrite an existing record, even on an id collision.
            if self.kv.compare_and_swap(&key, None, &payload).await? {
                debug!(job_id = %job.id, channel = %job.channel, "Created job");
                return Ok(job.id);
            }
            warn!(job_id = %job.id, "Job id collision, regenerating");
        }
    }

    pub async fn get(&self, id: &JobId) -> StoreResult<VideoJob> {
        let key = self.keys.job_key(id);
        let raw = self
            .kv
            .get(&key)
            .await?
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Merge `patch` into the stored record and set `status`.
    ///
    /// Re-asserting the current status with an empty patch is a no-op.
    /// Leaving a terminal status is rejected.
    pub async fn update_status(
        &self,
        id: &JobId,
        status: JobStatus,
        patch: JobPatch,
    ) -> StoreResult<VideoJob> {
        let mut job = self.get(id).await?;

        if !job.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: job.status,
                to: status,
            });
        }

        if !job.apply(status, &patch) {
            return Ok(job);
        }

        job.version += 1;
        job.updated_at = Utc::now();
        self.kv
            .put(&self.keys.job_key(id), &serde_json::to_string(&job)?)
            .await?;
        Ok(job)
    }

    /// Lazily enumerate every job.
    ///
    /// Keys are listed when the stream is first polled and each record is
    /// fetched as it is consumed. Order is unspecified. Records removed
    /// mid-scan are skipped, as are records that fail to decode.
    pub fn scan(&self) -> BoxStream<'_, StoreResult<VideoJob>> {
        let prefix = self.keys.job_prefix();

        stream::once(async move { self.kv.list_keys(&prefix).await })
            .map(|listed| match listed {
                Ok(keys) => stream::iter(keys.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::iter(vec![Err(e)]).right_stream(),
            })
            .flatten()
            .filter_map(move |key: StoreResult<String>| async move {
                let key = match key {
                    Ok(key) => key,
                    Err(e) => return Some(Err(e)),
                };
                match self.kv.get(&key).await {
                    Ok(Some(raw)) => match serde_json::from_str::<VideoJob>(&raw) {
                        Ok(job) => Some(Ok(job)),
                        Err(e) => {
                            warn!("Skipping undecodable job record {}: {}", key, e);
                            None
                        }
                    },
                    Ok(None) => None,
                    Err(e) => Some(Err(e)),
                }
            })
            .boxed()
    }

    /// Collect a full scan.
    pub async fn list(&self) -> StoreResult<Vec<VideoJob>> {
        let mut jobs = Vec::new();
        let mut scan = self.scan();
        while let Some(job) = scan.next().await {
            jobs.push(job?);
        }
        Ok(jobs)
    }

    /// Atomically move a `pending` job to `processing`.
    ///
    /// Succeeds only if the stored record is still `pending` at the same
    /// `version` as `seen`. Returns the claimed record, or `None` if the
    /// job changed or vanished in between.
    pub async fn claim(&self, seen: &VideoJob, now: DateTime<Utc>) -> StoreResult<Option<VideoJob>> {
        self.conditional_transition(seen, JobStatus::Pending, |job| {
            job.status = JobStatus::Processing;
            job.claimed_at = Some(now);
            job.attempts += 1;
            job.updated_at = now;
        })
        .await
    }

    /// Put a stale `processing` job back to `pending`.
    ///
    /// Conditional on the same `version` as `seen`; per-platform results
    /// and metadata are kept.
    pub async fn requeue(&self, seen: &VideoJob, now: DateTime<Utc>) -> StoreResult<Option<VideoJob>> {
        self.conditional_transition(seen, JobStatus::Processing, |job| {
            job.status = JobStatus::Pending;
            job.claimed_at = None;
            job.updated_at = now;
        })
        .await
    }

    async fn conditional_transition<F>(
        &self,
        seen: &VideoJob,
        expected: JobStatus,
        mutate: F,
    ) -> StoreResult<Option<VideoJob>>
    where
        F: FnOnce(&mut VideoJob) + Send,
    {
        let key = self.keys.job_key(&seen.id);
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(None);
        };
        let mut job: VideoJob = serde_json::from_str(&raw)?;
        if job.status != expected || job.version != seen.version {
            return Ok(None);
        }

        mutate(&mut job);
        job.version += 1;

        let payload = serde_json::to_string(&job)?;
        if self.kv.compare_and_swap(&key, Some(&raw), &payload).await? {
            Ok(Some(job))
        } else {
            Ok(None)
        }
    }

    /// Delete every job record. Counters are left alone.
    pub async fn purge(&self) -> StoreResult<usize> {
        let keys = self.kv.list_keys(&self.keys.job_prefix()).await?;
        for key in &keys {
            self.kv.delete(key).await?;
        }
        info!("Purged {} job records", keys.len());
        Ok(keys.len())
    }
}
