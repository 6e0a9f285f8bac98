use std::sync::Arc;

use dashmap::DashMap;

use crate::storage::partition::TimePartition;

/// Label -> partition registry for one indexing dimension.
///
/// Sharded so that writers touching different labels never contend. Partitions
/// are created on first use and never removed.
#[derive(Debug, Default)]
pub struct PartitionIndex {
    partitions: DashMap<String, Arc<TimePartition>>,
}

impl PartitionIndex {
    pub fn new() -> Self {
        Self { partitions: DashMap::new() }
    }

    pub fn get(&self, label: &str) -> Option<Arc<TimePartition>> {
        self.partitions.get(label).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the partition for `label`, creating it if needed.
    ///
    /// Racing creators converge on the partition that won the shard lock; the
    /// losers get that same instance back.
    pub fn get_or_create(&self, label: &str) -> Arc<TimePartition> {
        if let Some(existing) = self.get(label) {
            return existing;
        }

        let entry = self
            .partitions
            .entry(label.to_owned())
            .or_insert_with(|| Arc::new(TimePartition::new(label)));
        Arc::clone(entry.value())
    }

    /// Point-in-time list of every partition. Callers iterate this instead of
    /// holding shard guards while doing partition work.
    pub fn snapshot(&self) -> Vec<Arc<TimePartition>> {
        self.partitions.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Known labels, sorted.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.partitions.iter().map(|e| e.key().clone()).collect();
        labels.sort();
        labels
    }

    /// Number of partitions (including ones emptied by eviction).
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Total events across all partitions of this index.
    pub fn event_count(&self) -> usize {
        self.partitions.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn key_count(&self) -> usize {
        self.partitions.iter().map(|entry| entry.value().key_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogEvent;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_get_unknown_label_is_none() {
        let index = PartitionIndex::new();
        assert!(index.get("nope").is_none());
        assert_eq!(index.partition_count(), 0);
    }

    #[test]
    fn test_racing_creators_share_one_partition() {
        let index = Arc::new(PartitionIndex::new());
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let index = Arc::clone(&index);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let partition = index.get_or_create("PaymentService");
                    let ts = i as i64;
                    partition.insert(ts, Arc::new(LogEvent::new(ts, "PaymentService", "h", "m")));
                    partition
                })
            })
            .collect();

        let partitions: Vec<Arc<TimePartition>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(index.partition_count(), 1);
        for partition in &partitions {
            assert!(Arc::ptr_eq(partition, &partitions[0]));
        }
        assert_eq!(index.event_count(), threads);
    }

    #[test]
    fn test_labels_are_sorted() {
        let index = PartitionIndex::new();
        for label in ["host-c", "host-a", "host-b"] {
            index.get_or_create(label);
        }
        assert_eq!(index.labels(), vec!["host-a", "host-b", "host-c"]);
    }
}
