//! Chat-completions metadata client (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use shortcast_models::metadata::{MAX_DESCRIPTION_CHARS, MAX_TAGS, MAX_TITLE_CHARS};
use shortcast_models::VideoMetadata;

use crate::error::{MetadataError, MetadataResult};
use crate::generator::MetadataGenerator;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, RawMetadata};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_TITLE: &str = "Auto Shorts";
const DEFAULT_TAGS: [&str; 2] = ["AI", "Shorts"];

/// Configuration for the metadata client.
#[derive(Clone)]
pub struct MetadataClientConfig {
    /// API key; generation is disabled without one
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries on retryable errors
    pub max_retries: u32,
}

impl std::fmt::Debug for MetadataClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for MetadataClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

impl MetadataClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GROQ_API_KEY").ok().filter(|s| !s.is_empty()),
            base_url: std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("METADATA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("METADATA_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        }
    }
}

/// Generates metadata through a chat-completions endpoint.
pub struct ChatMetadataClient {
    http: Client,
    config: MetadataClientConfig,
}

impl ChatMetadataClient {
    /// Create a new client.
    pub fn new(config: MetadataClientConfig) -> MetadataResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MetadataError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MetadataResult<Self> {
        Self::new(MetadataClientConfig::from_env())
    }

    fn system_prompt() -> String {
        format!(
            "You are a professional content creator for US audiences. Generate a catchy title \
             (max {} chars), engaging description (max {} chars), and {} relevant SEO tags as a \
             JSON array. Output ONLY valid JSON with keys: \"title\", \"description\", \"tags\".",
            MAX_TITLE_CHARS, MAX_DESCRIPTION_CHARS, MAX_TAGS
        )
    }

    async fn request(&self, api_key: &str, prompt: &str) -> MetadataResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let system = Self::system_prompt();
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 300,
        };

        debug!("Requesting metadata from {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MetadataError::Timeout(self.config.timeout.as_secs())
                } else {
                    MetadataError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::RequestFailed { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| MetadataError::InvalidResponse("empty completion".to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MetadataResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MetadataResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Metadata request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl MetadataGenerator for ChatMetadataClient {
    async fn generate(&self, prompt: &str) -> MetadataResult<VideoMetadata> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| MetadataError::NotConfigured("GROQ_API_KEY is not set".to_string()))?;

        let content = self.with_retry(|| self.request(api_key, prompt)).await?;
        parse_completion(&content, prompt)
    }
}

/// Turn a completion into metadata, filling gaps the model left.
pub(crate) fn parse_completion(content: &str, prompt: &str) -> MetadataResult<VideoMetadata> {
    let json = strip_code_fence(content);
    let raw: RawMetadata = serde_json::from_str(json)
        .map_err(|e| MetadataError::InvalidResponse(format!("not metadata JSON: {}", e)))?;

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = raw
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| prompt.to_string());
    let tags = match raw.tags {
        Some(serde_json::Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
    };

    Ok(VideoMetadata::new(title, description, tags))
}

/// Models sometimes wrap JSON in a ```json fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let inner = trimmed.trim_start_matches("```");
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.split("```").next().unwrap_or(inner).trim()
}
