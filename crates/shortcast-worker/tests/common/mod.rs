//! Shared fixtures for dispatch tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use shortcast_metadata::{MetadataError, MetadataGenerator, MetadataResult};
use shortcast_models::{Channel, JobId, JobPatch, JobStatus, NewJob, Platform, VideoMetadata};
use shortcast_platforms::{
    PlatformUploader, StaticCredentials, UploadError, UploadReceipt, UploadRequest, UploadResult,
    UploaderRegistry,
};
use shortcast_store::{JobStore, KeySpace, KvStore, MemoryKvStore, RateCounter, StoreError, StoreResult};
use shortcast_worker::{DispatchEngine, StatsAggregator, WorkerConfig};

/// 10:00 EST on a weekday.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 12, 15, 0, 0).unwrap()
}

pub fn config(cap: u64, batch_size: usize) -> WorkerConfig {
    WorkerConfig {
        daily_cap: cap,
        batch_size,
        metadata_timeout: Duration::from_secs(5),
        upload_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub struct FixedMetadata;

#[async_trait]
impl MetadataGenerator for FixedMetadata {
    async fn generate(&self, _prompt: &str) -> MetadataResult<VideoMetadata> {
        Ok(VideoMetadata::new(
            "Generated title",
            "Generated description",
            vec!["generated".to_string()],
        ))
    }
}

pub struct FailingMetadata;

#[async_trait]
impl MetadataGenerator for FailingMetadata {
    async fn generate(&self, _prompt: &str) -> MetadataResult<VideoMetadata> {
        Err(MetadataError::RequestFailed {
            status: 500,
            body: "model overloaded".to_string(),
        })
    }
}

/// Uploader that succeeds or fails as told and counts its calls.
pub struct ScriptedUploader {
    platform: Platform,
    failure: Option<UploadError>,
    calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn ok(platform: Platform) -> Arc<Self> {
        Arc::new(Self {
            platform,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(platform: Platform, failure: UploadError) -> Arc<Self> {
        Arc::new(Self {
            platform,
            failure: Some(failure),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformUploader for ScriptedUploader {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn upload(&self, _request: &UploadRequest) -> UploadResult<UploadReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(UploadReceipt {
                platform: self.platform,
                remote_id: Some(format!("{}-1", self.platform)),
            }),
        }
    }
}

/// What [`InterferingUploader`] does to the job before reporting success.
#[derive(Debug, Clone, Copy)]
pub enum Interference {
    /// Move the job to `failed` behind the engine's back
    Finish,
    /// Delete the job record
    Delete,
}

/// Uploader that changes the stored job mid-dispatch, then succeeds.
pub struct InterferingUploader {
    platform: Platform,
    interference: Interference,
    kv: Arc<dyn KvStore>,
}

impl InterferingUploader {
    pub fn new(platform: Platform, interference: Interference, kv: Arc<dyn KvStore>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            interference,
            kv,
        })
    }
}

#[async_trait]
impl PlatformUploader for InterferingUploader {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn upload(&self, request: &UploadRequest) -> UploadResult<UploadReceipt> {
        let jobs = JobStore::new(self.kv.clone(), KeySpace::default());
        let outcome = match self.interference {
            Interference::Finish => jobs
                .update_status(&request.job_id, JobStatus::Failed, JobPatch::new())
                .await
                .map(|_| ()),
            Interference::Delete => {
                self.kv
                    .delete(&KeySpace::default().job_key(&request.job_id))
                    .await
            }
        };
        outcome.map_err(|e| UploadError::transport(e.to_string()))?;

        Ok(UploadReceipt {
            platform: self.platform,
            remote_id: None,
        })
    }
}

pub fn registry(uploaders: &[Arc<ScriptedUploader>]) -> UploaderRegistry {
    uploaders.iter().fold(
        UploaderRegistry::new(Arc::new(StaticCredentials::new())),
        |registry, uploader| registry.with_uploader(uploader.clone()),
    )
}

/// Key-value store whose writes or counter increments can be switched off.
#[derive(Default)]
pub struct FlakyKv {
    inner: MemoryKvStore,
    fail_writes: AtomicBool,
    limit_increments: AtomicBool,
    increments_left: AtomicUsize,
}

impl FlakyKv {
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Let `n` more increments through, then refuse every one after.
    pub fn fail_increments_after(&self, n: usize) {
        self.increments_left.store(n, Ordering::SeqCst);
        self.limit_increments.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Backend("write refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for FlakyKv {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.list_keys(prefix).await
    }

    async fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: &str) -> StoreResult<bool> {
        self.inner.compare_and_swap(key, expected, value).await
    }

    async fn increment(&self, key: &str) -> StoreResult<u64> {
        if self.limit_increments.load(Ordering::SeqCst)
            && self
                .increments_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
        {
            return Err(StoreError::Backend("increment refused".to_string()));
        }
        self.inner.increment(key).await
    }
}

pub struct Harness {
    pub engine: DispatchEngine,
    pub jobs: JobStore,
    pub counter: RateCounter,
    pub stats: StatsAggregator,
}

impl Harness {
    pub fn new(
        config: WorkerConfig,
        metadata: Arc<dyn MetadataGenerator>,
        uploaders: UploaderRegistry,
    ) -> Self {
        Self::with_kv(Arc::new(MemoryKvStore::new()), config, metadata, uploaders)
    }

    pub fn with_kv(
        kv: Arc<dyn KvStore>,
        config: WorkerConfig,
        metadata: Arc<dyn MetadataGenerator>,
        uploaders: UploaderRegistry,
    ) -> Self {
        let jobs = JobStore::new(kv.clone(), KeySpace::default());
        let counter = RateCounter::new(kv, KeySpace::default());
        let engine = DispatchEngine::new(jobs.clone(), counter.clone(), metadata, uploaders, &config);
        Self {
            engine,
            stats: StatsAggregator::new(jobs.clone()),
            jobs,
            counter,
        }
    }

    pub async fn queue(
        &self,
        channel: Channel,
        platforms: &[Platform],
        scheduled_at: DateTime<Utc>,
    ) -> JobId {
        let new = NewJob::new(
            "https://media.example.com/uploads/clip.mp4",
            "Three knife skills every home cook should know",
            channel,
            platforms.iter().copied(),
            scheduled_at,
        );
        self.jobs
            .create_at(new, scheduled_at - chrono::Duration::hours(1))
            .await
            .unwrap()
    }
}
