//! Upload metadata generated once per job.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 60;
/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;
/// Maximum number of tags.
pub const MAX_TAGS: usize = 10;

/// Words of the prompt used for a fallback title.
const FALLBACK_TITLE_WORDS: usize = 8;
const FALLBACK_TITLE: &str = "Auto Shorts";
const FALLBACK_TAGS: [&str; 3] = ["AI", "Shorts", "Automation"];

/// Title, description and tags applied to every platform upload of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VideoMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags,
        }
        .sanitized()
    }

    /// Deterministic metadata derived from the prompt alone.
    pub fn fallback(prompt: &str) -> Self {
        let title = prompt
            .split_whitespace()
            .take(FALLBACK_TITLE_WORDS)
            .collect::<Vec<_>>()
            .join(" ");
        let title = if title.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            title
        };

        Self::new(
            title,
            prompt.trim(),
            FALLBACK_TAGS.iter().map(|t| t.to_string()).collect(),
        )
    }

    /// Enforce length limits and drop blank tags.
    pub fn sanitized(mut self) -> Self {
        self.title = truncate_chars(self.title.trim(), MAX_TITLE_CHARS);
        self.description = truncate_chars(self.description.trim(), MAX_DESCRIPTION_CHARS);
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_TAGS)
            .collect();
        self
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
