//! Retention sweeps.
//!
//! A sweep computes `cutoff = now - retention_window` and trims every
//! partition of every index below that cutoff. `EvictionGate` keeps sweeps
//! from overlapping and enforces the at-most-once-per-interval rule for the
//! write-path trigger; `RetentionEvictor` is the timer-thread trigger.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::storage::log_store::LogStore;

const NEVER: i64 = i64::MIN;

/// Idle/Running state of the sweep, the anchor of the write-path interval and
/// the start time of the last completed sweep.
#[derive(Debug)]
pub struct EvictionGate {
    running: AtomicBool,
    interval_anchor_millis: AtomicI64,
    last_sweep_millis: AtomicI64,
}

impl EvictionGate {
    /// `now` anchors the interval, so the first write-path sweep happens one
    /// interval after construction.
    pub fn new(now: i64) -> Self {
        Self {
            running: AtomicBool::new(false),
            interval_anchor_millis: AtomicI64::new(now),
            last_sweep_millis: AtomicI64::new(NEVER),
        }
    }

    /// True for exactly one caller per elapsed interval.
    pub fn claim_interval(&self, now: i64, interval_millis: i64) -> bool {
        let anchor = self.interval_anchor_millis.load(Ordering::Acquire);
        if now.saturating_sub(anchor) < interval_millis {
            return false;
        }
        self.interval_anchor_millis
            .compare_exchange(anchor, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves Idle -> Running. Returns `None` if a sweep is already running.
    pub fn begin(&self, now: i64) -> Option<SweepGuard<'_>> {
        self.running.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
        self.interval_anchor_millis.fetch_max(now, Ordering::AcqRel);
        Some(SweepGuard { gate: self, started_at: now })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start time of the most recent sweep that ran to completion.
    pub fn last_sweep_millis(&self) -> Option<i64> {
        match self.last_sweep_millis.load(Ordering::Acquire) {
            NEVER => None,
            millis => Some(millis),
        }
    }
}

/// Returns the gate to Idle when dropped, including on unwind. Only a sweep
/// that was not unwinding counts as completed.
#[must_use]
pub struct SweepGuard<'a> {
    gate: &'a EvictionGate,
    started_at: i64,
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.gate.last_sweep_millis.fetch_max(self.started_at, Ordering::AcqRel);
        }
        self.gate.running.store(false, Ordering::Release);
    }
}

/// Timer thread that calls `LogStore::run_eviction` every interval.
///
/// Owned by the process composition; dropping it stops the thread.
pub struct RetentionEvictor {
    handle: Option<JoinHandle<()>>,
    shutdown_signal: Arc<(Mutex<bool>, Condvar)>,
}

impl RetentionEvictor {
    /// Starts sweeping at the store's configured eviction interval.
    pub fn start(store: Arc<LogStore>) -> Self {
        let interval = store.config().retention.eviction_interval;
        Self::start_with_interval(store, interval)
    }

    pub fn start_with_interval(store: Arc<LogStore>, interval: Duration) -> Self {
        let shutdown_signal = Arc::new((Mutex::new(false), Condvar::new()));
        let shutdown_clone = Arc::clone(&shutdown_signal);

        let handle = match std::thread::Builder::new()
            .name("retention-evictor".to_string())
            .spawn(move || Self::sweep_loop(&store, &shutdown_clone, interval))
        {
            Ok(handle) => {
                info!(interval_secs = interval.as_secs_f64(), "Retention evictor started");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to spawn retention evictor thread: {}", e);
                None
            }
        };

        Self { handle, shutdown_signal }
    }

    fn sweep_loop(store: &LogStore, shutdown_signal: &(Mutex<bool>, Condvar), interval: Duration) {
        let (lock, cvar) = shutdown_signal;
        let mut stopped = lock.lock();
        let mut next_run = Instant::now() + interval;

        loop {
            while !*stopped {
                if cvar.wait_until(&mut stopped, next_run).timed_out() {
                    break;
                }
            }
            if *stopped {
                break;
            }

            MutexGuard::unlocked(&mut stopped, || {
                if store.run_eviction().is_none() {
                    debug!("Scheduled sweep skipped, another sweep is running");
                }
            });
            next_run = Instant::now() + interval;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signals the thread and waits for it. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        {
            let (lock, cvar) = &*self.shutdown_signal;
            *lock.lock() = true;
            cvar.notify_all();
        }

        if handle.join().is_err() {
            warn!("Retention evictor thread panicked");
        }
        info!("Retention evictor stopped");
    }
}

impl Drop for RetentionEvictor {
    fn drop(&mut self) {
        self.stop();
    }
}
