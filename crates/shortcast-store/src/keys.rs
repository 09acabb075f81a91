//! Persisted key layout.
//!
//! - `job:<id>` holds a serialized job record
//! - `counter:<channel>:<platform>:<YYYY-MM-DD>` holds a decimal count

use shortcast_models::{Channel, DayKey, JobId, Platform};

const JOB_PREFIX: &str = "job:";
const COUNTER_PREFIX: &str = "counter:";

/// Builds keys, optionally under a namespace (`<ns>:job:<id>`).
#[derive(Debug, Clone, Default)]
pub struct KeySpace {
    namespace: Option<String>,
}

impl KeySpace {
    pub fn new(namespace: Option<String>) -> Self {
        Self { namespace }
    }

    fn scoped(&self, key: String) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns, key),
            None => key,
        }
    }

    pub fn job_prefix(&self) -> String {
        self.scoped(JOB_PREFIX.to_string())
    }

    pub fn job_key(&self, id: &JobId) -> String {
        self.scoped(format!("{}{}", JOB_PREFIX, id))
    }

    pub fn counter_key(&self, channel: Channel, platform: Platform, day: &DayKey) -> String {
        self.scoped(format!("{}{}:{}:{}", COUNTER_PREFIX, channel, platform, day))
    }
}
