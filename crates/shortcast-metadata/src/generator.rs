//! Metadata generator capability and its fallback wrapper.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::warn;

use shortcast_models::VideoMetadata;

use crate::error::{MetadataError, MetadataResult};

/// Produces upload metadata from a prompt. May fail.
#[async_trait]
pub trait MetadataGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> MetadataResult<VideoMetadata>;
}

/// Where a job's metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    Generated,
    Fallback,
}

impl MetadataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSource::Generated => "generated",
            MetadataSource::Fallback => "fallback",
        }
    }
}

/// Outcome of [`generate_or_fallback`].
#[derive(Debug, Clone)]
pub struct GeneratedMetadata {
    pub metadata: VideoMetadata,
    pub source: MetadataSource,
    /// Why the fallback was used
    pub error: Option<String>,
}

/// Generate metadata, degrading to [`VideoMetadata::fallback`] on any
/// error or when `timeout` elapses. Never fails.
pub async fn generate_or_fallback(
    generator: &dyn MetadataGenerator,
    prompt: &str,
    timeout: Duration,
) -> GeneratedMetadata {
    let result = match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(MetadataError::Timeout(timeout.as_secs())),
    };

    match result {
        Ok(metadata) => {
            counter!("shortcast_metadata_generated_total", "source" => "generated").increment(1);
            GeneratedMetadata {
                metadata: metadata.sanitized(),
                source: MetadataSource::Generated,
                error: None,
            }
        }
        Err(e) => {
            warn!("Metadata generation failed, using fallback: {}", e);
            counter!("shortcast_metadata_generated_total", "source" => "fallback").increment(1);
            GeneratedMetadata {
                metadata: VideoMetadata::fallback(prompt),
                source: MetadataSource::Fallback,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl MetadataGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> MetadataResult<VideoMetadata> {
            Err(MetadataError::InvalidResponse("boom".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl MetadataGenerator for Slow {
        async fn generate(&self, _prompt: &str) -> MetadataResult<VideoMetadata> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(VideoMetadata::new("late", "late", vec![]))
        }
    }

    struct Fixed;

    #[async_trait]
    impl MetadataGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> MetadataResult<VideoMetadata> {
            Ok(VideoMetadata::new("Fixed title", "Fixed description", vec!["x".into()]))
        }
    }

    #[tokio::test]
    async fn test_error_falls_back() {
        let out = generate_or_fallback(&Failing, "Desert road trip at sunrise", Duration::from_secs(1)).await;
        assert_eq!(out.source, MetadataSource::Fallback);
        assert_eq!(out.metadata, VideoMetadata::fallback("Desert road trip at sunrise"));
        assert!(out.error.unwrap().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let out = generate_or_fallback(&Slow, "slow prompt", Duration::from_secs(5)).await;
        assert_eq!(out.source, MetadataSource::Fallback);
        assert_eq!(out.metadata.title, "slow prompt");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let out = generate_or_fallback(&Fixed, "anything", Duration::from_secs(1)).await;
        assert_eq!(out.source, MetadataSource::Generated);
        assert_eq!(out.metadata.title, "Fixed title");
        assert!(out.error.is_none());
    }
}
