//! Video job records and their status lifecycle.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::{Channel, Platform};
use crate::metadata::VideoMetadata;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Aggregate job status.
///
/// `pending → processing → {uploaded | failed}`. The two terminal states
/// are never left; a stale `processing` job is only put back to `pending`
/// by the recovery sweep, never through an ordinary status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a dispatch cycle
    #[default]
    Pending,
    /// Claimed by a dispatch cycle
    Processing,
    /// Delivered according to the aggregation policy
    Uploaded,
    /// Delivery failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Uploaded => "uploaded",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Uploaded | JobStatus::Failed)
    }

    /// Whether an ordinary status update may move from `self` to `next`.
    ///
    /// Re-asserting the current state is always allowed.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, Processing) | (Processing, Uploaded) | (Processing, Failed)
            )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery status of a single platform within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStatus {
    #[default]
    Pending,
    Uploaded,
    Failed,
}

impl PlatformStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformStatus::Pending => "pending",
            PlatformStatus::Uploaded => "uploaded",
            PlatformStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlatformStatus::Pending)
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied fields of a job about to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub media_url: String,
    pub prompt: String,
    pub channel: Channel,
    pub platforms: BTreeSet<Platform>,
    pub scheduled_at: DateTime<Utc>,
}

impl NewJob {
    pub fn new(
        media_url: impl Into<String>,
        prompt: impl Into<String>,
        channel: Channel,
        platforms: impl IntoIterator<Item = Platform>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            media_url: media_url.into(),
            prompt: prompt.into(),
            channel,
            platforms: platforms.into_iter().collect(),
            scheduled_at,
        }
    }
}

/// A unit of scheduled content delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoJob {
    /// Unique job ID
    pub id: JobId,

    /// Reference into object storage
    pub media_url: String,

    /// User-supplied prompt for metadata generation
    pub prompt: String,

    /// Channel the job posts for
    pub channel: Channel,

    /// Platforms the job must be delivered to
    pub platforms: BTreeSet<Platform>,

    /// Aggregate status
    #[serde(default)]
    pub status: JobStatus,

    /// The job is not eligible for dispatch before this instant
    pub scheduled_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last write timestamp
    pub updated_at: DateTime<Utc>,

    /// Per-platform delivery status; keys are exactly `platforms`
    #[serde(default)]
    pub platform_status: BTreeMap<Platform, PlatformStatus>,

    /// Last error recorded for a failed platform
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platform_errors: BTreeMap<Platform, String>,

    /// Bumped on every write; used for conditional claims
    #[serde(default)]
    pub version: u64,

    /// When the current dispatch cycle claimed the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,

    /// Number of times the job has been claimed
    #[serde(default)]
    pub attempts: u32,
}

impl VideoJob {
    /// Build a fresh `pending` record from admission input.
    pub fn create(new: NewJob, id: JobId, now: DateTime<Utc>) -> Self {
        let platform_status = new
            .platforms
            .iter()
            .map(|p| (*p, PlatformStatus::Pending))
            .collect();

        Self {
            id,
            media_url: new.media_url,
            prompt: new.prompt,
            channel: new.channel,
            platforms: new.platforms,
            status: JobStatus::Pending,
            scheduled_at: new.scheduled_at,
            title: None,
            description: None,
            tags: None,
            created_at: now,
            updated_at: now,
            platform_status,
            platform_errors: BTreeMap::new(),
            version: 0,
            claimed_at: None,
            attempts: 0,
        }
    }

    /// Whether the job may be dispatched at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at <= now
    }

    /// Whether a `processing` job has been held longer than `stale_after`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        if self.status != JobStatus::Processing {
            return false;
        }
        match self.claimed_at {
            Some(claimed) => now - claimed > stale_after,
            None => now - self.updated_at > stale_after,
        }
    }

    /// Metadata already stored on the job, if generation has run.
    pub fn metadata(&self) -> Option<VideoMetadata> {
        Some(VideoMetadata {
            title: self.title.clone()?,
            description: self.description.clone().unwrap_or_default(),
            tags: self.tags.clone().unwrap_or_default(),
        })
    }

    /// Platforms whose delivery has not completed yet.
    pub fn pending_platforms(&self) -> Vec<Platform> {
        self.platforms
            .iter()
            .copied()
            .filter(|p| {
                self.platform_status
                    .get(p)
                    .map_or(true, |s| *s == PlatformStatus::Pending)
            })
            .collect()
    }

    pub fn platform_status(&self, platform: Platform) -> PlatformStatus {
        self.platform_status
            .get(&platform)
            .copied()
            .unwrap_or_default()
    }

    /// Merge `patch` and set `status`. Returns whether anything changed.
    ///
    /// Metadata fields are only filled while empty and a platform that has
    /// already completed keeps its result. Platforms outside `platforms`
    /// are ignored. Status validity is the caller's concern.
    pub fn apply(&mut self, status: JobStatus, patch: &JobPatch) -> bool {
        let mut changed = false;

        if self.status != status {
            self.status = status;
            changed = true;
        }

        if self.title.is_none() {
            if let Some(title) = &patch.title {
                self.title = Some(title.clone());
                changed = true;
            }
        }
        if self.description.is_none() {
            if let Some(description) = &patch.description {
                self.description = Some(description.clone());
                changed = true;
            }
        }
        if self.tags.is_none() {
            if let Some(tags) = &patch.tags {
                self.tags = Some(tags.clone());
                changed = true;
            }
        }

        let settled: BTreeSet<Platform> = self
            .platform_status
            .iter()
            .filter(|(_, status)| status.is_terminal())
            .map(|(platform, _)| *platform)
            .collect();

        for (platform, new_status) in &patch.platform_status {
            if !self.platforms.contains(platform) {
                continue;
            }
            let current = self.platform_status.entry(*platform).or_default();
            if current.is_terminal() || *current == *new_status {
                continue;
            }
            *current = *new_status;
            changed = true;
        }

        for (platform, error) in &patch.platform_errors {
            if self.platforms.contains(platform)
                && !settled.contains(platform)
                && self.platform_errors.get(platform) != Some(error)
            {
                self.platform_errors.insert(*platform, error.clone());
                changed = true;
            }
        }

        changed
    }
}

/// Partial update merged into a stored job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub platform_status: BTreeMap<Platform, PlatformStatus>,
    pub platform_errors: BTreeMap<Platform, String>,
}

impl JobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set generated metadata.
    pub fn with_metadata(mut self, metadata: &VideoMetadata) -> Self {
        self.title = Some(metadata.title.clone());
        self.description = Some(metadata.description.clone());
        self.tags = Some(metadata.tags.clone());
        self
    }

    /// Record the outcome of one platform.
    pub fn with_platform(
        mut self,
        platform: Platform,
        status: PlatformStatus,
        error: Option<String>,
    ) -> Self {
        self.platform_status.insert(platform, status);
        if let Some(error) = error {
            self.platform_errors.insert(platform, error);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.platform_status.is_empty()
            && self.platform_errors.is_empty()
    }
}
