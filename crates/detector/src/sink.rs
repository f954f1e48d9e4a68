//! Opportunity filtering, rate limiting, history, and subscriber fan-out.

use crate::stats::EngineStats;
use crate::HISTORY_CAP;
use common::ArbitrageOpportunity;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::warn;

/// Subscribers receive opportunities by shared reference on the detection
/// thread and must copy out anything they retain.
pub type OpportunityCallback = Box<dyn Fn(&ArbitrageOpportunity) + Send>;

const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Sits between the detection sweep and the outside world. Every emitted
/// cycle passes the profitability gate, then a rolling one-second rate
/// limit, then lands in the bounded history ring before being fanned out
/// to subscribers in registration order.
pub struct OpportunitySink {
    min_profit_threshold: f64,
    max_per_second: u32,
    recent_emissions: Mutex<VecDeque<Instant>>,
    history: Mutex<VecDeque<ArbitrageOpportunity>>,
    callbacks: Mutex<Vec<OpportunityCallback>>,
}

impl OpportunitySink {
    pub fn new(min_profit_threshold: f64, max_per_second: u32) -> Self {
        Self {
            min_profit_threshold,
            max_per_second,
            recent_emissions: Mutex::new(VecDeque::new()),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAP)),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, callback: OpportunityCallback) {
        self.callbacks.lock().push(callback);
    }

    /// Runs one opportunity through the gates. Returns `true` when it was
    /// admitted to history and delivered to subscribers.
    pub fn submit(&self, opportunity: ArbitrageOpportunity, stats: &EngineStats) -> bool {
        if !opportunity.is_profitable(self.min_profit_threshold) {
            stats.record_false_positive();
            return false;
        }
        if !self.admit_within_rate(opportunity.detected_at) {
            return false;
        }
        stats.record_opportunity();

        {
            let mut history = self.history.lock();
            if history.len() >= HISTORY_CAP {
                history.pop_front();
            }
            history.push_back(opportunity.clone());
        }

        // Fan-out runs under the callback lock; subscribers must not
        // re-enter the engine.
        let callbacks = self.callbacks.lock();
        for callback in callbacks.iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(&opportunity))).is_err() {
                warn!(
                    path = %opportunity.path_display(),
                    "opportunity subscriber panicked; continuing fan-out"
                );
            }
        }
        true
    }

    /// Sliding-window admission: at most `max_per_second` emissions in any
    /// rolling one-second window.
    fn admit_within_rate(&self, now: Instant) -> bool {
        let mut window = self.recent_emissions.lock();
        while let Some(front) = window.front() {
            if now.saturating_duration_since(*front) >= RATE_WINDOW {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() >= self.max_per_second as usize {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Up to `limit` most recent opportunities, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ArbitrageOpportunity> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn create_test_opportunity(profit_pct: f64, detected_at: Instant) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            path: vec!["BTC_0".into(), "USDT_0".into(), "ETH_0".into()],
            profit_pct,
            max_volume: 333.0,
            confidence: 90,
            detected_at,
        }
    }

    #[test]
    fn test_profitability_gate_counts_false_positive() {
        let sink = OpportunitySink::new(0.001, 100);
        let stats = EngineStats::new(Instant::now());
        assert!(!sink.submit(create_test_opportunity(0.0005, Instant::now()), &stats));
        assert!(!sink.submit(create_test_opportunity(0.001, Instant::now()), &stats)); // boundary drops
        let snap = stats.snapshot();
        assert_eq!(snap.false_positives, 2);
        assert_eq!(snap.opportunities_found, 0);
        assert!(sink.recent(usize::MAX).is_empty());
    }

    #[test]
    fn test_rate_limit_caps_rolling_window() {
        let sink = OpportunitySink::new(0.001, 2);
        let stats = EngineStats::new(Instant::now());
        let base = Instant::now();
        assert!(sink.submit(create_test_opportunity(0.01, base), &stats));
        assert!(sink.submit(create_test_opportunity(0.01, base + Duration::from_millis(10)), &stats));
        assert!(!sink.submit(create_test_opportunity(0.01, base + Duration::from_millis(20)), &stats));
        // Once the first emission ages out of the window, room opens up.
        assert!(sink.submit(create_test_opportunity(0.01, base + Duration::from_millis(1001)), &stats));
        assert_eq!(stats.snapshot().opportunities_found, 3);
    }

    #[test]
    fn test_history_evicts_oldest_at_cap() {
        let sink = OpportunitySink::new(0.0, u32::MAX);
        let stats = EngineStats::new(Instant::now());
        for i in 0..(HISTORY_CAP + 5) {
            let mut opp = create_test_opportunity(0.01, Instant::now());
            opp.confidence = i as u32;
            assert!(sink.submit(opp, &stats));
        }
        let recent = sink.recent(usize::MAX);
        assert_eq!(recent.len(), HISTORY_CAP);
        // Oldest five were evicted.
        assert_eq!(recent.first().unwrap().confidence, 5);
        assert_eq!(recent.last().unwrap().confidence, (HISTORY_CAP + 4) as u32);
    }

    #[test]
    fn test_recent_returns_newest_suffix_oldest_first() {
        let sink = OpportunitySink::new(0.0, u32::MAX);
        let stats = EngineStats::new(Instant::now());
        for i in 0..10 {
            let mut opp = create_test_opportunity(0.01, Instant::now());
            opp.confidence = i;
            sink.submit(opp, &stats);
        }
        let recent = sink.recent(3);
        let ids: Vec<u32> = recent.iter().map(|o| o.confidence).collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_abort_fanout() {
        let sink = OpportunitySink::new(0.001, 100);
        let stats = EngineStats::new(Instant::now());
        let delivered = Arc::new(AtomicU32::new(0));

        sink.register(Box::new(|_| panic!("subscriber bug")));
        let counter = delivered.clone();
        sink.register(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        assert!(sink.submit(create_test_opportunity(0.01, Instant::now()), &stats));
        assert_eq!(delivered.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_callbacks_fire_in_registration_order() {
        let sink = OpportunitySink::new(0.001, 100);
        let stats = EngineStats::new(Instant::now());
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = order.clone();
            sink.register(Box::new(move |_| order.lock().push(id)));
        }
        sink.submit(create_test_opportunity(0.01, Instant::now()), &stats);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }
}
