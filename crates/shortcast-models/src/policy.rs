//! Aggregation of per-platform results into the job status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::job::{JobStatus, PlatformStatus, VideoJob};

/// How per-platform outcomes decide the terminal job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// `uploaded` when at least one platform succeeded; `failed` only when
    /// every targeted platform failed.
    #[default]
    AnyOf,
    /// `uploaded` only when every targeted platform succeeded.
    AllOf,
}

impl AggregationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationPolicy::AnyOf => "any_of",
            AggregationPolicy::AllOf => "all_of",
        }
    }

    /// Terminal status for a job whose platform attempts have completed.
    ///
    /// A platform still `pending` counts as not delivered. A job without
    /// platforms is `failed`.
    pub fn aggregate(&self, job: &VideoJob) -> JobStatus {
        let mut statuses = job.platforms.iter().map(|p| job.platform_status(*p));
        let delivered = match self {
            AggregationPolicy::AnyOf => statuses.any(|s| s == PlatformStatus::Uploaded),
            AggregationPolicy::AllOf => {
                !job.platforms.is_empty() && statuses.all(|s| s == PlatformStatus::Uploaded)
            }
        };

        if delivered {
            JobStatus::Uploaded
        } else {
            JobStatus::Failed
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregationPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "any_of" | "any" => Ok(AggregationPolicy::AnyOf),
            "all_of" | "all" => Ok(AggregationPolicy::AllOf),
            other => Err(ModelError::UnknownPolicy(other.to_string())),
        }
    }
}
