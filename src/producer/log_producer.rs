//! Synthetic log producers for load generation and demos.
//!
//! Each worker thread emits one event per interval, picking a random service
//! and one of that service's hosts, and inserts it straight into the store.

use crate::core::{now_millis, LogEvent};
use crate::storage::LogStore;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Services and the hosts each one runs on.
pub const SERVICE_HOSTS: &[(&str, &[&str])] = &[
    ("PaymentService", &["payment-node-1", "payment-node-2", "payment-node-3"]),
    ("OrderService", &["order-node-1", "order-node-2"]),
    ("InventoryService", &["inventory-node-1", "inventory-node-2", "inventory-node-3"]),
];

/// A random event stamped with the current time.
pub fn synthetic_event<R: Rng + ?Sized>(rng: &mut R) -> LogEvent {
    let (service, hosts) = SERVICE_HOSTS[rng.gen_range(0..SERVICE_HOSTS.len())];
    let host = hosts[rng.gen_range(0..hosts.len())];
    LogEvent::new(now_millis(), service, host, format!("Log message from {}@{}", service, host))
}

/// Configuration for the producer pool
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub threads: usize,
    /// Pause between two events of the same worker.
    pub interval: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self { threads: 4, interval: Duration::from_millis(500) }
    }
}

/// Metrics collected by the producer pool.
#[derive(Debug, Clone)]
pub struct ProducerMetrics {
    pub events_produced: u64,
    pub elapsed_seconds: f64,
}

impl ProducerMetrics {
    pub fn events_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.events_produced as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// Pool of worker threads feeding synthetic events into a store.
pub struct LogProducer {
    handles: Vec<JoinHandle<()>>,
    should_stop: Arc<AtomicBool>,
    events_produced: Arc<AtomicU64>,
    started_at: Instant,
}

impl LogProducer {
    pub fn start(store: Arc<LogStore>, config: &ProducerConfig) -> Self {
        let should_stop = Arc::new(AtomicBool::new(false));
        let events_produced = Arc::new(AtomicU64::new(0));

        info!(
            threads = config.threads,
            interval_ms = config.interval.as_millis() as u64,
            "Starting log producers"
        );

        let handles = (0..config.threads)
            .filter_map(|worker| {
                let store = Arc::clone(&store);
                let should_stop = Arc::clone(&should_stop);
                let events_produced = Arc::clone(&events_produced);
                let interval = config.interval;

                std::thread::Builder::new()
                    .name(format!("log-producer-{}", worker))
                    .spawn(move || {
                        Self::produce_loop(&store, &should_stop, &events_produced, interval);
                    })
                    .map_err(|e| warn!(worker, "Failed to spawn producer thread: {}", e))
                    .ok()
            })
            .collect();

        Self { handles, should_stop, events_produced, started_at: Instant::now() }
    }

    fn produce_loop(
        store: &LogStore,
        should_stop: &AtomicBool,
        events_produced: &AtomicU64,
        interval: Duration,
    ) {
        let mut rng = rand::thread_rng();
        while !should_stop.load(Ordering::Relaxed) {
            let event = synthetic_event(&mut rng);
            debug!(%event, "Producing log");
            store.insert(event);
            events_produced.fetch_add(1, Ordering::Relaxed);

            std::thread::sleep(interval);
        }
    }

    pub fn events_produced(&self) -> u64 {
        self.events_produced.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> ProducerMetrics {
        ProducerMetrics {
            events_produced: self.events_produced(),
            elapsed_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Stops and joins every worker. Idempotent.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        info!("Stopping log producers...");
        self.should_stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Log producer thread panicked");
            }
        }
    }
}

impl Drop for LogProducer {
    fn drop(&mut self) {
        self.stop();
    }
}
