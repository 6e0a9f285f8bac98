//! The multi-index log store.
//!
//! Every event is fanned out to the partition for its service name, the
//! partition for its host id and, when enabled, the global partition. The
//! indexes are updated one after another with no cross-index atomicity: a
//! concurrent reader may briefly see an event in one index and not yet in
//! another.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tracing::{debug, error, info};

#[cfg(test)]
use crate::storage::retention::SweepGuard;
use crate::{
    core::{now_millis, LogEvent},
    storage::{
        index::PartitionIndex,
        partition::TimePartition,
        retention::EvictionGate,
        util::{EvictionReport, EvictionTrigger, IndexStats, StoreConfig, StoreStats},
    },
};

pub struct LogStore {
    service_index: PartitionIndex,
    host_index: PartitionIndex,
    global_index: Option<TimePartition>,
    eviction_gate: EvictionGate,
    config: StoreConfig,
}

impl LogStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        debug!(
            global_index = config.enable_global_index,
            trigger = ?config.retention.trigger,
            "Creating log store"
        );
        Self {
            service_index: PartitionIndex::new(),
            host_index: PartitionIndex::new(),
            global_index: config.enable_global_index.then(|| TimePartition::new("global")),
            eviction_gate: EvictionGate::new(now_millis()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn has_global_index(&self) -> bool {
        self.global_index.is_some()
    }

    /// Indexes `event` by service, host and (if enabled) globally.
    ///
    /// With the write-path eviction trigger, this may also run a retention
    /// sweep inline once the eviction interval has elapsed.
    pub fn insert(&self, event: LogEvent) {
        let timestamp = event.timestamp();
        let event = Arc::new(event);

        let service = self.service_index.get_or_create(event.service_name());
        service.insert(timestamp, Arc::clone(&event));
        self.host_index.get_or_create(event.host_id()).insert(timestamp, Arc::clone(&event));
        if let Some(global) = &self.global_index {
            global.insert(timestamp, Arc::clone(&event));
        }

        debug!(
            service = event.service_name(),
            host = event.host_id(),
            timestamp,
            "Added log event"
        );

        if self.config.retention.trigger == EvictionTrigger::OnWrite {
            self.evict_on_write();
        }
    }

    /// Same as [`LogStore::insert`], but an absent event is ignored.
    pub fn insert_optional(&self, event: Option<LogEvent>) {
        match event {
            Some(event) => self.insert(event),
            None => debug!("Attempted to add an absent log event, ignoring"),
        }
    }

    pub fn query_by_service(&self, service_name: &str, from: i64, to: i64) -> Vec<Arc<LogEvent>> {
        debug!(service = service_name, from, to, "Querying logs by service");
        Self::range_of(self.service_index.get(service_name).as_deref(), from, to)
    }

    pub fn query_by_host(&self, host_id: &str, from: i64, to: i64) -> Vec<Arc<LogEvent>> {
        debug!(host = host_id, from, to, "Querying logs by host");
        Self::range_of(self.host_index.get(host_id).as_deref(), from, to)
    }

    /// Scans the host partition and keeps events from `service_name`.
    ///
    /// A host usually serves few services, so its partition is the smaller of
    /// the two to walk.
    pub fn query_by_service_and_host(
        &self,
        service_name: &str,
        host_id: &str,
        from: i64,
        to: i64,
    ) -> Vec<Arc<LogEvent>> {
        debug!(
            service = service_name,
            host = host_id,
            from,
            to,
            "Querying logs by service and host"
        );
        let mut events = Self::range_of(self.host_index.get(host_id).as_deref(), from, to);
        events.retain(|event| event.service_name() == service_name);
        events
    }

    /// Empty when the global index is disabled.
    pub fn query_global(&self, from: i64, to: i64) -> Vec<Arc<LogEvent>> {
        debug!(from, to, "Querying global logs");
        Self::range_of(self.global_index.as_ref(), from, to)
    }

    fn range_of(partition: Option<&TimePartition>, from: i64, to: i64) -> Vec<Arc<LogEvent>> {
        match partition {
            Some(partition) => partition.range_query(from, to),
            None => Vec::new(),
        }
    }

    /// Trims every partition in every index to keys `>= cutoff`.
    ///
    /// A partition whose eviction panics is logged and reported; the sweep
    /// carries on with the rest.
    pub fn evict_before(&self, cutoff: i64) -> EvictionReport {
        let mut report = EvictionReport { cutoff, ..EvictionReport::default() };

        let service_partitions = self.service_index.snapshot();
        let host_partitions = self.host_index.snapshot();
        let labelled = service_partitions
            .iter()
            .map(|p| ("service", p.as_ref()))
            .chain(host_partitions.iter().map(|p| ("host", p.as_ref())))
            .chain(self.global_index.iter().map(|p| ("global", p)));

        for (index_name, partition) in labelled {
            report.partitions_swept += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| partition.evict_before(cutoff))) {
                Ok(outcome) => {
                    report.keys_removed += outcome.keys_removed;
                    report.events_removed += outcome.events_removed;
                }
                Err(_) => {
                    error!(
                        index = index_name,
                        partition = partition.label(),
                        cutoff,
                        "Failed to evict partition, continuing sweep"
                    );
                    report.failed_partitions.push(format!("{}:{}", index_name, partition.label()));
                }
            }
        }

        report
    }

    /// One retention sweep as of now. `None` if a sweep is already running.
    pub fn run_eviction(&self) -> Option<EvictionReport> {
        self.run_eviction_at(now_millis())
    }

    /// One retention sweep with `cutoff = now - retention_window`.
    pub fn run_eviction_at(&self, now: i64) -> Option<EvictionReport> {
        let _sweep = self.eviction_gate.begin(now)?;

        let cutoff = now.saturating_sub(self.config.retention.retention_window_millis());
        let report = self.evict_before(cutoff);

        info!(
            cutoff,
            partitions = report.partitions_swept,
            keys = report.keys_removed,
            events = report.events_removed,
            failures = report.failed_partitions.len(),
            "Retention sweep finished"
        );
        Some(report)
    }

    fn evict_on_write(&self) {
        let now = now_millis();
        let interval = self.config.retention.eviction_interval_millis();
        if self.eviction_gate.claim_interval(now, interval) {
            self.run_eviction_at(now);
        }
    }

    /// Events reachable through the service index.
    pub fn len(&self) -> usize {
        self.service_index.event_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Known service names, sorted.
    pub fn services(&self) -> Vec<String> {
        self.service_index.labels()
    }

    /// Known host ids, sorted.
    pub fn hosts(&self) -> Vec<String> {
        self.host_index.labels()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            services: Self::index_stats(&self.service_index),
            hosts: Self::index_stats(&self.host_index),
            global: self.global_index.as_ref().map(|global| IndexStats {
                partitions: 1,
                timestamps: global.key_count(),
                events: global.len(),
            }),
            last_eviction_millis: self.eviction_gate.last_sweep_millis(),
        }
    }

    fn index_stats(index: &PartitionIndex) -> IndexStats {
        IndexStats {
            partitions: index.partition_count(),
            timestamps: index.key_count(),
            events: index.event_count(),
        }
    }

    #[cfg(test)]
    pub(crate) fn service_partition(&self, service_name: &str) -> Option<Arc<TimePartition>> {
        self.service_index.get(service_name)
    }

    #[cfg(test)]
    pub(crate) fn host_partition(&self, host_id: &str) -> Option<Arc<TimePartition>> {
        self.host_index.get(host_id)
    }

    /// Holds the gate as a running sweep would.
    #[cfg(test)]
    pub(crate) fn begin_sweep(&self) -> Option<SweepGuard<'_>> {
        self.eviction_gate.begin(now_millis())
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}
