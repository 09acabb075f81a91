//! Per-channel queue statistics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::day::{DayBasis, DayKey};
use crate::job::{JobStatus, VideoJob};

/// Counters derived from a full scan of the job store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel: Channel,
    pub pending: u64,
    pub processing: u64,
    pub uploaded: u64,
    pub failed: u64,
    /// Uploaded jobs created on the current UTC day
    pub today_uploaded: u64,
}

impl ChannelStats {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            pending: 0,
            processing: 0,
            uploaded: 0,
            failed: 0,
            today_uploaded: 0,
        }
    }

    /// Count one job into these stats.
    pub fn record(&mut self, job: &VideoJob, today: &DayKey) {
        match job.status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Uploaded => {
                self.uploaded += 1;
                if DayKey::for_job(job, DayBasis::CreatedAt) == *today {
                    self.today_uploaded += 1;
                }
            }
            JobStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.uploaded + self.failed
    }
}
