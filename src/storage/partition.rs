use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

#[cfg(test)]
use std::sync::atomic::AtomicBool;

use parking_lot::RwLock;
use tracing::trace;

use crate::core::LogEvent;

/// Events sharing one millisecond, in insertion order.
pub type Bucket = Vec<Arc<LogEvent>>;

/// Outcome of trimming a single partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionEviction {
    pub keys_removed: usize,
    pub events_removed: usize,
}

/// A sorted timestamp -> bucket map for one partition label (a service name,
/// a host id, or the global index).
///
/// Keys are strictly increasing on iteration and a bucket is never empty while
/// present. All methods take `&self`; the write lock is held for one map
/// operation at a time, so readers always see a consistent view of this
/// partition.
#[derive(Debug)]
pub struct TimePartition {
    label: String,
    entries: RwLock<BTreeMap<i64, Bucket>>,
    event_count: AtomicUsize,
    #[cfg(test)]
    fail_next_insert: AtomicBool,
    #[cfg(test)]
    fail_next_eviction: AtomicBool,
}

impl TimePartition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: RwLock::new(BTreeMap::new()),
            event_count: AtomicUsize::new(0),
            #[cfg(test)]
            fail_next_insert: AtomicBool::new(false),
            #[cfg(test)]
            fail_next_eviction: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// O(log n) to find or create the key, amortized O(1) to append.
    pub fn insert(&self, timestamp: i64, event: Arc<LogEvent>) {
        let mut entries = self.entries.write();
        #[cfg(test)]
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            panic!("injected insert fault in partition '{}'", self.label);
        }
        entries.entry(timestamp).or_default().push(event);
        self.event_count.fetch_add(1, Ordering::Relaxed);
    }

    /// All events with `from <= timestamp <= to`, ascending by timestamp.
    ///
    /// An inverted range yields an empty result. The read lock is held for the
    /// whole scan, so writers to this partition wait for up to O(k) clones.
    pub fn range_query(&self, from: i64, to: i64) -> Vec<Arc<LogEvent>> {
        if from > to {
            return Vec::new();
        }

        let entries = self.entries.read();
        let mut result = Vec::new();
        for bucket in entries.range(from..=to).map(|(_, bucket)| bucket) {
            result.extend(bucket.iter().cloned());
        }
        result
    }

    /// Drops every key strictly below `cutoff`. Keys at or after the cutoff
    /// are untouched.
    pub fn evict_before(&self, cutoff: i64) -> PartitionEviction {
        #[cfg(test)]
        if self.fail_next_eviction.swap(false, Ordering::SeqCst) {
            panic!("injected eviction fault in partition '{}'", self.label);
        }

        // Most sweeps find nothing to do; don't contend with writers for those.
        if !self.has_keys_before(cutoff) {
            return PartitionEviction::default();
        }

        let evicted = {
            let mut entries = self.entries.write();
            let retained = entries.split_off(&cutoff);
            std::mem::replace(&mut *entries, retained)
        };

        let events_removed: usize = evicted.values().map(Vec::len).sum();
        self.event_count.fetch_sub(events_removed, Ordering::Relaxed);

        trace!(
            partition = %self.label,
            cutoff,
            keys = evicted.len(),
            events = events_removed,
            "Evicted partition prefix"
        );

        PartitionEviction { keys_removed: evicted.len(), events_removed }
    }

    fn has_keys_before(&self, cutoff: i64) -> bool {
        self.entries.read().first_key_value().is_some_and(|(oldest, _)| *oldest < cutoff)
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.event_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct timestamps.
    pub fn key_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.entries.read().first_key_value().map(|(ts, _)| *ts)
    }

    pub fn newest_timestamp(&self) -> Option<i64> {
        self.entries.read().last_key_value().map(|(ts, _)| *ts)
    }

    #[cfg(test)]
    pub(crate) fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn fail_next_eviction(&self) {
        self.fail_next_eviction.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ts: i64, message: &str) -> Arc<LogEvent> {
        Arc::new(LogEvent::new(ts, "OrderService", "order-node-1", message))
    }

    fn timestamps(events: &[Arc<LogEvent>]) -> Vec<i64> {
        events.iter().map(|e| e.timestamp()).collect()
    }

    #[test]
    fn test_out_of_order_inserts_come_back_sorted() {
        let partition = TimePartition::new("OrderService");
        for ts in [50, 10, 40, 20, 30] {
            partition.insert(ts, event(ts, "m"));
        }

        let result = partition.range_query(0, 100);
        assert_eq!(timestamps(&result), vec![10, 20, 30, 40, 50]);
        assert_eq!(partition.len(), 5);
        assert_eq!(partition.key_count(), 5);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let partition = TimePartition::new("OrderService");
        for ts in 1..=10 {
            partition.insert(ts, event(ts, "m"));
        }

        assert_eq!(timestamps(&partition.range_query(3, 6)), vec![3, 4, 5, 6]);
        assert_eq!(timestamps(&partition.range_query(10, 10)), vec![10]);
        assert!(partition.range_query(11, 20).is_empty());
    }

    #[test]
    fn test_shared_timestamp_keeps_insertion_order() {
        let partition = TimePartition::new("OrderService");
        partition.insert(7, event(7, "first"));
        partition.insert(7, event(7, "second"));
        partition.insert(7, event(7, "third"));

        let messages: Vec<String> =
            partition.range_query(7, 7).iter().map(|e| e.message().to_string()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(partition.key_count(), 1);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let partition = TimePartition::new("OrderService");
        partition.insert(5, event(5, "m"));

        assert!(partition.range_query(10, 1).is_empty());
    }

    #[test]
    fn test_empty_partition_queries_empty() {
        let partition = TimePartition::new("OrderService");
        assert!(partition.range_query(i64::MIN, i64::MAX).is_empty());
        assert!(partition.is_empty());
        assert_eq!(partition.oldest_timestamp(), None);
    }

    #[test]
    fn test_evict_before_is_strict() {
        let partition = TimePartition::new("OrderService");
        for ts in [100, 200, 200, 300] {
            partition.insert(ts, event(ts, "m"));
        }

        let outcome = partition.evict_before(200);
        assert_eq!(outcome, PartitionEviction { keys_removed: 1, events_removed: 1 });
        assert_eq!(timestamps(&partition.range_query(0, 1000)), vec![200, 200, 300]);
        assert_eq!(partition.len(), 3);
        assert_eq!(partition.oldest_timestamp(), Some(200));
        assert_eq!(partition.newest_timestamp(), Some(300));
    }

    #[test]
    fn test_evict_everything_leaves_empty_partition() {
        let partition = TimePartition::new("OrderService");
        for ts in 1..=4 {
            partition.insert(ts, event(ts, "m"));
        }

        let outcome = partition.evict_before(i64::MAX);
        assert_eq!(outcome.events_removed, 4);
        assert!(partition.is_empty());
        assert_eq!(partition.key_count(), 0);
    }

    #[test]
    fn test_evict_with_nothing_old_is_noop() {
        let partition = TimePartition::new("OrderService");
        partition.insert(1_000, event(1_000, "m"));

        assert_eq!(partition.evict_before(500), PartitionEviction::default());
        assert_eq!(partition.len(), 1);
    }
}
