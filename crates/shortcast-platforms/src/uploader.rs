//! Platform uploader capability.

use async_trait::async_trait;
use tracing::info;

use shortcast_models::{Channel, JobId, Platform, VideoMetadata};

use crate::credentials::Credential;
use crate::error::UploadResult;

/// Everything an uploader needs for one delivery.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub job_id: JobId,
    pub channel: Channel,
    pub platform: Platform,
    pub media_url: String,
    pub metadata: VideoMetadata,
    pub credential: Option<Credential>,
}

/// A successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub platform: Platform,
    /// Identifier assigned by the platform, when it returns one
    pub remote_id: Option<String>,
}

/// Delivers a video to one platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformUploader: Send + Sync {
    /// The platform this uploader serves.
    fn platform(&self) -> Platform;

    /// Whether an upload without a credential should be refused up front.
    fn requires_credential(&self) -> bool {
        true
    }

    async fn upload(&self, request: &UploadRequest) -> UploadResult<UploadReceipt>;
}

/// Logs the upload and reports success without contacting the platform.
#[derive(Debug, Clone, Copy)]
pub struct DryRunUploader {
    platform: Platform,
}

impl DryRunUploader {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl PlatformUploader for DryRunUploader {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn upload(&self, request: &UploadRequest) -> UploadResult<UploadReceipt> {
        info!(
            job_id = %request.job_id,
            channel = %request.channel,
            platform = %self.platform,
            title = %request.metadata.title,
            "Dry run: skipping upload of {}",
            request.media_url
        );

        Ok(UploadReceipt {
            platform: self.platform,
            remote_id: None,
        })
    }
}
