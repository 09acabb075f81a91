//! Prometheus metrics for the dispatch worker.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use shortcast_models::{Channel, JobStatus, Platform};

use crate::error::{WorkerError, WorkerResult};

/// Install the Prometheus recorder and serve `/metrics` on `port`.
pub fn init_metrics(port: u16) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .install()
        .map_err(|e| WorkerError::config_error(format!("Failed to install Prometheus exporter: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_CREATED_TOTAL: &str = "shortcast_jobs_created_total";
    pub const JOBS_ADMITTED_TOTAL: &str = "shortcast_jobs_admitted_total";
    pub const JOBS_SKIPPED_CAPPED_TOTAL: &str = "shortcast_jobs_skipped_capped_total";
    pub const JOBS_FINISHED_TOTAL: &str = "shortcast_jobs_finished_total";
    pub const JOBS_RECOVERED_TOTAL: &str = "shortcast_jobs_recovered_total";
    pub const PLATFORM_UPLOADS_TOTAL: &str = "shortcast_platform_uploads_total";
    pub const PLATFORM_UPLOAD_DURATION_SECONDS: &str = "shortcast_platform_upload_duration_seconds";
    pub const CYCLE_DURATION_SECONDS: &str = "shortcast_cycle_duration_seconds";
}

pub fn record_job_created(channel: Channel) {
    let labels = [("channel", channel.to_string())];
    counter!(names::JOBS_CREATED_TOTAL, &labels).increment(1);
}

pub fn record_job_admitted(channel: Channel) {
    let labels = [("channel", channel.to_string())];
    counter!(names::JOBS_ADMITTED_TOTAL, &labels).increment(1);
}

pub fn record_job_skipped_capped(channel: Channel) {
    let labels = [("channel", channel.to_string())];
    counter!(names::JOBS_SKIPPED_CAPPED_TOTAL, &labels).increment(1);
}

pub fn record_job_finished(channel: Channel, status: JobStatus) {
    let labels = [
        ("channel", channel.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::JOBS_FINISHED_TOTAL, &labels).increment(1);
}

pub fn record_jobs_recovered(count: usize) {
    counter!(names::JOBS_RECOVERED_TOTAL).increment(count as u64);
}

/// Record one platform attempt; `outcome` is `uploaded` or an error code.
pub fn record_platform_upload(platform: Platform, outcome: &str, duration_secs: f64) {
    let labels = [
        ("platform", platform.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::PLATFORM_UPLOADS_TOTAL, &labels).increment(1);
    histogram!(names::PLATFORM_UPLOAD_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_cycle_duration(duration_secs: f64) {
    histogram!(names::CYCLE_DURATION_SECONDS).record(duration_secs);
}
