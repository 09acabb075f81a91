//! Per-(channel, platform, day) upload counters.

use std::sync::Arc;

use tracing::debug;

use shortcast_models::{Channel, DayKey, Platform};

use crate::error::StoreResult;
use crate::keys::KeySpace;
use crate::kv::{parse_count, KvStore};

/// Daily counters keyed by `counter:<channel>:<platform>:<day>`.
///
/// A new day is simply a new key; nothing is reset or deleted.
#[derive(Clone)]
pub struct RateCounter {
    kv: Arc<dyn KvStore>,
    keys: KeySpace,
}

impl RateCounter {
    pub fn new(kv: Arc<dyn KvStore>, keys: KeySpace) -> Self {
        Self { kv, keys }
    }

    /// Current count, 0 if never incremented.
    pub async fn get_count(&self, channel: Channel, platform: Platform, day: &DayKey) -> StoreResult<u64> {
        let key = self.keys.counter_key(channel, platform, day);
        parse_count(&key, self.kv.get(&key).await?)
    }

    /// Add one and return the new count.
    pub async fn increment(&self, channel: Channel, platform: Platform, day: &DayKey) -> StoreResult<u64> {
        let key = self.keys.counter_key(channel, platform, day);
        let count = self.kv.increment(&key).await?;
        debug!(%channel, %platform, day = %day, count, "Incremented daily counter");
        Ok(count)
    }
}
