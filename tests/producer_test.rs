//! Synthetic producer pool feeding a live store.

use logvault::producer::{LogProducer, ProducerConfig, SERVICE_HOSTS};
use logvault::storage::LogStore;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_every_produced_event_lands_in_the_store() {
    let store = Arc::new(LogStore::new());
    let config = ProducerConfig { threads: 3, interval: Duration::from_millis(5) };

    let mut producer = LogProducer::start(Arc::clone(&store), &config);
    assert!(producer.is_running());
    thread::sleep(Duration::from_millis(200));
    producer.stop();
    assert!(!producer.is_running());

    let produced = producer.events_produced();
    assert!(produced > 0);
    assert_eq!(store.len() as u64, produced);
    assert_eq!(store.stats().hosts.events as u64, produced);

    // Nothing more arrives once stopped.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(store.len() as u64, produced);
    assert_eq!(producer.metrics().events_produced, produced);
}

#[test]
fn test_producers_only_emit_known_services_and_hosts() {
    let store = Arc::new(LogStore::new());
    let config = ProducerConfig { threads: 2, interval: Duration::from_millis(1) };

    let producer = LogProducer::start(Arc::clone(&store), &config);
    thread::sleep(Duration::from_millis(100));
    drop(producer);

    let known_services: Vec<&str> = SERVICE_HOSTS.iter().map(|(s, _)| *s).collect();
    let known_hosts: Vec<&str> =
        SERVICE_HOSTS.iter().flat_map(|(_, hosts)| hosts.iter().copied()).collect();

    assert!(store.services().iter().all(|s| known_services.contains(&s.as_str())));
    assert!(store.hosts().iter().all(|h| known_hosts.contains(&h.as_str())));
}
