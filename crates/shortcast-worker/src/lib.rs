//! Queue and scheduling engine for the shortcast publishing pipeline.
//!
//! - [`Admission`] validates requests and queues `pending` jobs
//! - [`ReadinessSelector`] admits due jobs against the daily cap
//! - [`DispatchEngine`] generates metadata once and fans out to platforms
//! - [`RecoverySweeper`] requeues jobs stranded in `processing`
//! - [`StatsAggregator`] derives per-channel counters
//! - [`CycleRunner`] drives cycles on an interval

pub mod admission;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod recovery;
pub mod runner;
pub mod selector;
pub mod stats;

pub use admission::{Admission, AdmissionMode, AdmissionRequest};
pub use config::WorkerConfig;
pub use dispatch::{CycleReport, DispatchEngine};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use recovery::RecoverySweeper;
pub use runner::CycleRunner;
pub use selector::{AdmittedJob, ReadinessSelector, Selection};
pub use stats::StatsAggregator;
