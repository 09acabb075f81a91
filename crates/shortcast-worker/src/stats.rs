//! Per-channel statistics over the whole job store.

use std::collections::BTreeMap;

use futures::StreamExt;

use shortcast_models::{Channel, ChannelStats, DayKey};
use shortcast_store::JobStore;

use crate::error::WorkerResult;

/// Derives channel counters from a single full scan.
///
/// Reads are not coordinated with dispatch, so the result is only
/// eventually consistent with a running cycle.
#[derive(Clone)]
pub struct StatsAggregator {
    jobs: JobStore,
}

impl StatsAggregator {
    pub fn new(jobs: JobStore) -> Self {
        Self { jobs }
    }

    /// Stats with `todayUploaded` counted against the current UTC day.
    pub async fn compute(&self) -> WorkerResult<BTreeMap<Channel, ChannelStats>> {
        self.compute_for(&DayKey::today()).await
    }

    /// Channels without any job are absent from the result.
    pub async fn compute_for(&self, today: &DayKey) -> WorkerResult<BTreeMap<Channel, ChannelStats>> {
        let mut stats: BTreeMap<Channel, ChannelStats> = BTreeMap::new();
        let mut scan = self.jobs.scan();
        while let Some(job) = scan.next().await {
            let job = job?;
            stats
                .entry(job.channel)
                .or_insert_with(|| ChannelStats::new(job.channel))
                .record(&job, today);
        }
        Ok(stats)
    }
}
