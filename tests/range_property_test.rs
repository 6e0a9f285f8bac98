//! Property tests: every query equals a brute-force filter over what was inserted.

use logvault::core::LogEvent;
use logvault::storage::LogStore;
use proptest::prelude::*;
use std::sync::Arc;

const SERVICES: [&str; 3] = ["PaymentService", "OrderService", "InventoryService"];
const HOSTS: [&str; 4] = ["host1", "host2", "host3", "host4"];

fn arb_events() -> impl Strategy<Value = Vec<(i64, usize, usize)>> {
    prop::collection::vec((0i64..500, 0..SERVICES.len(), 0..HOSTS.len()), 0..200)
}

fn key(e: &LogEvent) -> (i64, String, String, String) {
    (e.timestamp(), e.service_name().into(), e.host_id().into(), e.message().into())
}

fn sorted(mut keys: Vec<(i64, String, String, String)>) -> Vec<(i64, String, String, String)> {
    keys.sort();
    keys
}

fn from_store(events: Vec<Arc<LogEvent>>) -> Vec<(i64, String, String, String)> {
    events.iter().map(|e| key(e)).collect()
}

proptest! {
    #[test]
    fn prop_range_queries_match_brute_force(
        raw in arb_events(),
        a in 0i64..500,
        b in 0i64..500,
        service_idx in 0..SERVICES.len(),
        host_idx in 0..HOSTS.len(),
    ) {
        let (from, to) = (a.min(b), a.max(b));
        let store = LogStore::new();
        let events: Vec<LogEvent> = raw
            .iter()
            .enumerate()
            .map(|(i, &(ts, s, h))| LogEvent::new(ts, SERVICES[s], HOSTS[h], format!("#{}", i)))
            .collect();
        for event in &events {
            store.insert(event.clone());
        }

        let service = SERVICES[service_idx];
        let host = HOSTS[host_idx];
        let in_range = |e: &&LogEvent| e.timestamp() >= from && e.timestamp() <= to;

        let by_service = from_store(store.query_by_service(service, from, to));
        prop_assert!(by_service.windows(2).all(|w| w[0].0 <= w[1].0));
        let expected: Vec<_> = events
            .iter()
            .filter(in_range)
            .filter(|e| e.service_name() == service)
            .map(key)
            .collect();
        prop_assert_eq!(sorted(by_service), sorted(expected));

        let by_host = from_store(store.query_by_host(host, from, to));
        let expected: Vec<_> =
            events.iter().filter(in_range).filter(|e| e.host_id() == host).map(key).collect();
        prop_assert_eq!(sorted(by_host), sorted(expected));

        let compound = from_store(store.query_by_service_and_host(service, host, from, to));
        let expected: Vec<_> = events
            .iter()
            .filter(in_range)
            .filter(|e| e.service_name() == service && e.host_id() == host)
            .map(key)
            .collect();
        prop_assert_eq!(sorted(compound), sorted(expected));
    }

    #[test]
    fn prop_eviction_keeps_exactly_the_suffix(raw in arb_events(), cutoff in 0i64..500) {
        let store = LogStore::new();
        for (i, &(ts, s, h)) in raw.iter().enumerate() {
            store.insert(LogEvent::new(ts, SERVICES[s], HOSTS[h], format!("#{}", i)));
        }

        store.evict_before(cutoff);

        let survivors = raw.iter().filter(|(ts, _, _)| *ts >= cutoff).count();
        prop_assert_eq!(store.len(), survivors);
        prop_assert_eq!(store.stats().hosts.events, survivors);
    }
}
