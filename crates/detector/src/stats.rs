//! Atomic performance counters shared by producers and both workers.

use common::PerformanceStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// EWMA smoothing factor for the ingest latency.
const LATENCY_ALPHA: f64 = 0.1;

/// Counters with relaxed per-field atomicity. The f64 fields are stored as
/// raw bits in `AtomicU64`; the EWMA read-modify-write is not atomic as a
/// whole, which matches the counters' best-effort contract.
pub struct EngineStats {
    epoch: Instant,
    messages_processed: AtomicU64,
    opportunities_found: AtomicU64,
    false_positives: AtomicU64,
    avg_latency_us: AtomicU64,
    last_update_ns: AtomicU64,
}

impl EngineStats {
    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            messages_processed: AtomicU64::new(0),
            opportunities_found: AtomicU64::new(0),
            false_positives: AtomicU64::new(0),
            avg_latency_us: AtomicU64::new(0f64.to_bits()),
            last_update_ns: AtomicU64::new(0),
        }
    }

    /// Called on every successful enqueue.
    pub fn record_enqueue(&self, latency_us: f64) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        let prev = f64::from_bits(self.avg_latency_us.load(Ordering::Relaxed));
        let next = (1.0 - LATENCY_ALPHA) * prev + LATENCY_ALPHA * latency_us;
        self.avg_latency_us.store(next.to_bits(), Ordering::Relaxed);
    }

    /// Called when an opportunity passes the sink's gates.
    pub fn record_opportunity(&self) {
        self.opportunities_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Called when a detected cycle fails the profitability gate.
    pub fn record_false_positive(&self) {
        self.false_positives.fetch_add(1, Ordering::Relaxed);
    }

    /// Publishes the timestamp of the tick most recently applied to the
    /// graph.
    pub fn mark_update(&self, timestamp: Instant) {
        let ns = timestamp.saturating_duration_since(self.epoch).as_nanos() as u64;
        self.last_update_ns.store(ns, Ordering::Relaxed);
    }

    /// Milliseconds since the graph last absorbed a tick.
    pub fn data_age_ms(&self, now: Instant) -> f64 {
        let last_ns = self.last_update_ns.load(Ordering::Relaxed);
        let now_ns = now.saturating_duration_since(self.epoch).as_nanos() as u64;
        now_ns.saturating_sub(last_ns) as f64 / 1_000_000.0
    }

    pub fn snapshot(&self) -> PerformanceStats {
        PerformanceStats {
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            opportunities_found: self.opportunities_found.load(Ordering::Relaxed),
            false_positives: self.false_positives.load(Ordering::Relaxed),
            avg_latency_us: f64::from_bits(self.avg_latency_us.load(Ordering::Relaxed)),
            last_update: self.epoch
                + Duration::from_nanos(self.last_update_ns.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ewma_latency_smoothing() {
        let stats = EngineStats::new(Instant::now());
        stats.record_enqueue(100.0);
        let first = stats.snapshot().avg_latency_us;
        assert!((first - 10.0).abs() < 1e-9); // 0.9 * 0 + 0.1 * 100

        stats.record_enqueue(100.0);
        let second = stats.snapshot().avg_latency_us;
        assert!((second - 19.0).abs() < 1e-9); // 0.9 * 10 + 0.1 * 100
    }

    #[test]
    fn test_counters_accumulate() {
        let stats = EngineStats::new(Instant::now());
        stats.record_enqueue(1.0);
        stats.record_enqueue(1.0);
        stats.record_opportunity();
        stats.record_false_positive();
        let snap = stats.snapshot();
        assert_eq!(snap.messages_processed, 2);
        assert_eq!(snap.opportunities_found, 1);
        assert_eq!(snap.false_positives, 1);
    }

    #[test]
    fn test_data_age_tracks_marked_update() {
        let epoch = Instant::now();
        let stats = EngineStats::new(epoch);
        let tick_time = epoch + Duration::from_millis(5);
        stats.mark_update(tick_time);
        let age = stats.data_age_ms(epoch + Duration::from_millis(25));
        assert!((age - 20.0).abs() < 1.0);
        assert_eq!(stats.snapshot().last_update, tick_time);
    }
}
