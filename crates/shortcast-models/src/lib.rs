//! Shared data models for the shortcast publishing queue.
//!
//! This crate provides Serde-serializable types for:
//! - Video jobs and their status lifecycle
//! - Channels and target platforms
//! - Generated upload metadata
//! - Day keys used by the daily quota counters
//! - Posting-slot scheduling
//! - Per-channel statistics

pub mod channel;
pub mod day;
pub mod error;
pub mod job;
pub mod metadata;
pub mod policy;
pub mod schedule;
pub mod stats;

// Re-export common types
pub use channel::{Channel, Platform};
pub use day::{DayBasis, DayKey};
pub use error::{ModelError, ModelResult};
pub use job::{JobId, JobPatch, JobStatus, NewJob, PlatformStatus, VideoJob};
pub use metadata::VideoMetadata;
pub use policy::AggregationPolicy;
pub use stats::ChannelStats;
