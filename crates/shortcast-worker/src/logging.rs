//! Structured job logging utilities.
//!
//! Every lifecycle event of a dispatched job carries the same `job_id` and
//! `channel` fields so a job can be followed across a cycle.

use tracing::{error, info, warn, Span};

use shortcast_models::{Channel, JobId, Platform};

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    channel: Channel,
}

impl JobLogger {
    pub fn new(job_id: &JobId, channel: Channel) -> Self {
        Self {
            job_id: job_id.to_string(),
            channel,
        }
    }

    /// Log the start of a job dispatch.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            channel = %self.channel,
            "Job started: {}", message
        );
    }

    /// Log a progress update during dispatch.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            channel = %self.channel,
            "Job progress: {}", message
        );
    }

    /// Log the outcome of one platform attempt.
    pub fn log_platform(&self, platform: Platform, outcome: &str, detail: Option<&str>) {
        match detail {
            Some(detail) => warn!(
                job_id = %self.job_id,
                channel = %self.channel,
                platform = %platform,
                outcome,
                "Platform {}: {}", outcome, detail
            ),
            None => info!(
                job_id = %self.job_id,
                channel = %self.channel,
                platform = %platform,
                outcome,
                "Platform {}", outcome
            ),
        }
    }

    /// Log a warning during dispatch.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            channel = %self.channel,
            "Job warning: {}", message
        );
    }

    /// Log an error during dispatch.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            channel = %self.channel,
            "Job error: {}", message
        );
    }

    /// Log the terminal status of a job.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            channel = %self.channel,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            channel = %self.channel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, Channel::GamingBuni);

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.channel(), Channel::GamingBuni);
    }
}
