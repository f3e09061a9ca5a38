use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub cycles_started: Arc<AtomicU64>,
    pub cycles_failed: Arc<AtomicU64>,

    // failure reasons
    pub snapshot_failures: Arc<AtomicU64>,
    pub signal_failures: Arc<AtomicU64>,
    pub plans_rejected: Arc<AtomicU64>,
    pub submit_failures: Arc<AtomicU64>,

    pub calls_submitted: Arc<AtomicU64>,
    pub spreads_planned: Arc<AtomicU64>,
    pub rebalances_planned: Arc<AtomicU64>,
}

/// Point-in-time copy of `Counters` for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub cycles_started: u64,
    pub cycles_failed: u64,
    pub snapshot_failures: u64,
    pub signal_failures: u64,
    pub plans_rejected: u64,
    pub submit_failures: u64,
    pub calls_submitted: u64,
    pub spreads_planned: u64,
    pub rebalances_planned: u64,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            cycles_started: load(&self.cycles_started),
            cycles_failed: load(&self.cycles_failed),
            snapshot_failures: load(&self.snapshot_failures),
            signal_failures: load(&self.signal_failures),
            plans_rejected: load(&self.plans_rejected),
            submit_failures: load(&self.submit_failures),
            calls_submitted: load(&self.calls_submitted),
            spreads_planned: load(&self.spreads_planned),
            rebalances_planned: load(&self.rebalances_planned),
        }
    }
}
