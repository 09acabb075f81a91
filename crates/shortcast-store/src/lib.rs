//! Key-value backed job store and daily rate counters.
//!
//! This crate provides:
//! - A generic key-value adapter with in-memory and Redis backends
//! - The job store (CRUD, lazy scans, conditional claims)
//! - Per-(channel, platform, day) upload counters

pub mod config;
pub mod counter;
pub mod error;
pub mod jobs;
pub mod keys;
pub mod kv;
pub mod redis_kv;

pub use config::StoreConfig;
pub use counter::RateCounter;
pub use error::{StoreError, StoreResult};
pub use jobs::JobStore;
pub use keys::KeySpace;
pub use kv::{KvStore, MemoryKvStore};
pub use redis_kv::RedisKvStore;
