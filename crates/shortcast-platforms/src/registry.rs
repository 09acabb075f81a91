//! Registry mapping platforms to uploader implementations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use shortcast_models::{Platform, VideoJob, VideoMetadata};

use crate::credentials::{CredentialProvider, StaticCredentials};
use crate::error::{UploadError, UploadResult};
use crate::uploader::{DryRunUploader, PlatformUploader, UploadReceipt, UploadRequest};

const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Routes uploads to the uploader registered for each platform.
#[derive(Clone)]
pub struct UploaderRegistry {
    uploaders: HashMap<Platform, Arc<dyn PlatformUploader>>,
    credentials: Arc<dyn CredentialProvider>,
    timeout: Duration,
}

impl UploaderRegistry {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            uploaders: HashMap::new(),
            credentials,
            timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// A registry where every platform is served by [`DryRunUploader`].
    pub fn dry_run() -> Self {
        Platform::ALL.into_iter().fold(
            Self::new(Arc::new(StaticCredentials::new())),
            |registry, platform| registry.with_uploader(Arc::new(DryRunUploader::new(platform))),
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register `uploader` for the platform it reports, replacing any previous one.
    pub fn with_uploader(mut self, uploader: Arc<dyn PlatformUploader>) -> Self {
        self.register(uploader);
        self
    }

    pub fn register(&mut self, uploader: Arc<dyn PlatformUploader>) {
        self.uploaders.insert(uploader.platform(), uploader);
    }

    pub fn supports(&self, platform: Platform) -> bool {
        self.uploaders.contains_key(&platform)
    }

    /// Upload `job` to `platform` with the shared metadata.
    ///
    /// Never panics on a missing uploader or credential; those come back as
    /// coded errors like any transport failure.
    pub async fn upload(
        &self,
        job: &VideoJob,
        platform: Platform,
        metadata: &VideoMetadata,
    ) -> UploadResult<UploadReceipt> {
        let uploader = self.uploaders.get(&platform).ok_or_else(|| {
            UploadError::unsupported_platform(format!("no uploader registered for {}", platform))
        })?;

        let credential = self.credentials.credential(job.channel, platform);
        if credential.is_none() && uploader.requires_credential() {
            return Err(UploadError::missing_credential(format!(
                "no {} credential for channel {}",
                platform, job.channel
            )));
        }

        let request = UploadRequest {
            job_id: job.id.clone(),
            channel: job.channel,
            platform,
            media_url: job.media_url.clone(),
            metadata: metadata.clone(),
            credential,
        };

        debug!(job_id = %job.id, platform = %platform, "Dispatching upload");

        match tokio::time::timeout(self.timeout, uploader.upload(&request)).await {
            Ok(result) => result,
            Err(_) => Err(UploadError::timeout(self.timeout.as_secs())),
        }
    }
}
