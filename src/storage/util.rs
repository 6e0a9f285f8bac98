use std::time::Duration;

use serde::Serialize;

/// How retention sweeps get triggered. Exactly one strategy is active per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionTrigger {
    /// A dedicated timer thread (`RetentionEvictor`) sweeps every interval.
    #[default]
    Scheduled,
    /// Writers sweep inline, at most once per interval, instead of a timer thread.
    OnWrite,
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Events older than `now - retention_window` are evicted.
    pub retention_window: Duration,
    /// Minimum time between two sweeps.
    pub eviction_interval: Duration,
    pub trigger: EvictionTrigger,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_window: Duration::from_secs(60 * 60),
            eviction_interval: Duration::from_secs(30 * 60),
            trigger: EvictionTrigger::Scheduled,
        }
    }
}

impl RetentionConfig {
    pub fn retention_window_millis(&self) -> i64 {
        i64::try_from(self.retention_window.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn eviction_interval_millis(&self) -> i64 {
        i64::try_from(self.eviction_interval.as_millis()).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Maintain an unpartitioned index over every event.
    pub enable_global_index: bool,
    pub retention: RetentionConfig,
}

/// Result of one sweep across every index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvictionReport {
    pub cutoff: i64,
    pub partitions_swept: usize,
    pub keys_removed: usize,
    pub events_removed: usize,
    /// Labels (prefixed with their index) whose eviction failed.
    pub failed_partitions: Vec<String>,
}

impl EvictionReport {
    pub fn is_clean(&self) -> bool {
        self.failed_partitions.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub partitions: usize,
    pub timestamps: usize,
    pub events: usize,
}

/// Point-in-time sizes of the store's indexes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub services: IndexStats,
    pub hosts: IndexStats,
    pub global: Option<IndexStats>,
    /// Start of the last completed sweep, `None` until one has run.
    pub last_eviction_millis: Option<i64>,
}
