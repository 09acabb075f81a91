//! Admission of new jobs into the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use shortcast_models::{schedule, Channel, JobId, NewJob, Platform};
use shortcast_store::JobStore;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Which platforms a new job targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "platform")]
pub enum AdmissionMode {
    /// Deliver to one platform only.
    Single(Platform),
    /// Deliver to every known platform.
    AllPlatforms,
}

impl AdmissionMode {
    pub fn platforms(&self) -> Vec<Platform> {
        match self {
            AdmissionMode::Single(platform) => vec![*platform],
            AdmissionMode::AllPlatforms => Platform::ALL.to_vec(),
        }
    }
}

/// A request to queue one video.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdmissionRequest {
    /// URL returned by the object store
    pub media_url: String,

    /// Checked after trimming
    #[validate(length(min = 10, message = "Prompt must be at least 10 characters"))]
    pub prompt: String,

    pub channel: Channel,

    pub mode: AdmissionMode,

    /// Requested posting time; snapped to the nearest posting slot
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl AdmissionRequest {
    pub fn new(
        media_url: impl Into<String>,
        prompt: impl Into<String>,
        channel: Channel,
        mode: AdmissionMode,
    ) -> Self {
        Self {
            media_url: media_url.into(),
            prompt: prompt.into(),
            channel,
            mode,
            scheduled_at: None,
        }
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    fn normalized(mut self) -> Self {
        self.prompt = self.prompt.trim().to_string();
        self.media_url = self.media_url.trim().to_string();
        self
    }
}

/// Validates requests and creates `pending` jobs.
#[derive(Clone)]
pub struct Admission {
    jobs: JobStore,
}

impl Admission {
    pub fn new(jobs: JobStore) -> Self {
        Self { jobs }
    }

    pub async fn admit(&self, request: AdmissionRequest) -> WorkerResult<JobId> {
        self.admit_at(request, Utc::now()).await
    }

    /// Admit relative to an explicit `now`. Nothing is stored on rejection.
    pub async fn admit_at(&self, request: AdmissionRequest, now: DateTime<Utc>) -> WorkerResult<JobId> {
        let request = request.normalized();
        request.validate()?;
        check_media_url(&request.media_url)?;

        let scheduled_at = schedule::resolve(request.scheduled_at, now)?;
        let new = NewJob::new(
            request.media_url,
            request.prompt,
            request.channel,
            request.mode.platforms(),
            scheduled_at,
        );
        let channel = new.channel;

        let id = self.jobs.create_at(new, now).await?;
        metrics::record_job_created(channel);
        info!(
            job_id = %id,
            channel = %channel,
            scheduled_at = %scheduled_at,
            "Job admitted to queue"
        );
        Ok(id)
    }
}

fn check_media_url(raw: &str) -> WorkerResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| WorkerError::admission(format!("Invalid media URL {:?}: {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WorkerError::admission(format!(
            "Unsupported media URL scheme: {}",
            other
        ))),
    }
}
