//! Upload error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;

/// Machine-readable upload failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadErrorCode {
    /// No credential configured for the channel/platform pair
    MissingCredential,
    /// No uploader registered for the platform
    UnsupportedPlatform,
    /// The upload did not finish in time
    Timeout,
    /// The platform refused the upload
    Rejected,
    /// Network or protocol failure
    Transport,
    /// The daily cap was reached before the attempt
    QuotaExceeded,
}

impl UploadErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadErrorCode::MissingCredential => "missing_credential",
            UploadErrorCode::UnsupportedPlatform => "unsupported_platform",
            UploadErrorCode::Timeout => "timeout",
            UploadErrorCode::Rejected => "rejected",
            UploadErrorCode::Transport => "transport",
            UploadErrorCode::QuotaExceeded => "quota_exceeded",
        }
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed platform upload.
///
/// Displays as `<code>: <message>`, which is what gets recorded on the job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct UploadError {
    pub code: UploadErrorCode,
    pub message: String,
}

impl UploadError {
    pub fn new(code: UploadErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn missing_credential(msg: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::MissingCredential, msg)
    }

    pub fn unsupported_platform(msg: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::UnsupportedPlatform, msg)
    }

    pub fn timeout(secs: u64) -> Self {
        Self::new(UploadErrorCode::Timeout, format!("upload timed out after {}s", secs))
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::Rejected, msg)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::Transport, msg)
    }

    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::QuotaExceeded, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = UploadError::rejected("video too long");
        assert_eq!(err.to_string(), "rejected: video too long");
        assert_eq!(UploadError::timeout(300).to_string(), "timeout: upload timed out after 300s");
    }
}
