//! Engine assembly: shared state, worker lifecycle, and the public API.

use crate::bellman_ford::DetectionWorker;
use crate::channel::{self, Consumer, Producer};
use crate::graph::{CurrencyIndex, RateGraph};
use crate::ingest::{parse_symbol, IngestWorker};
use crate::sink::{OpportunityCallback, OpportunitySink};
use crate::stats::EngineStats;
use common::{ArbitrageOpportunity, Exchange, MarketTick, PerformanceStats};
use config_lib::Config;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::info;

/// State shared between the engine handle and both workers.
pub(crate) struct EngineShared {
    pub(crate) config: Config,
    pub(crate) running: AtomicBool,
    pub(crate) graph: RateGraph,
    pub(crate) index: RwLock<CurrencyIndex>,
    pub(crate) stats: EngineStats,
    pub(crate) sink: OpportunitySink,
    sequence: AtomicU64,
}

impl EngineShared {
    pub(crate) fn new(config: Config) -> Self {
        let sink = OpportunitySink::new(
            config.arbitrage.min_profit_threshold,
            config.arbitrage.max_opportunities_per_second,
        );
        Self {
            running: AtomicBool::new(false),
            graph: RateGraph::new(),
            index: RwLock::new(CurrencyIndex::new()),
            stats: EngineStats::new(Instant::now()),
            sink,
            sequence: AtomicU64::new(0),
            config,
        }
    }
}

/// Real-time cyclic arbitrage detector.
///
/// Producer threads feed quotes through [`update_price`]; an ingest worker
/// folds them into the log-space rate graph and a detection worker sweeps
/// it for negative cycles. Both workers are owned by the engine and run
/// between [`start`] and [`stop`], which are idempotent.
///
/// [`update_price`]: ArbitrageEngine::update_price
/// [`start`]: ArbitrageEngine::start
/// [`stop`]: ArbitrageEngine::stop
pub struct ArbitrageEngine {
    shared: Arc<EngineShared>,
    producer: Mutex<Producer<MarketTick>>,
    /// Held until `start` hands it to the ingest worker; replaced with a
    /// fresh channel on restart.
    consumer: Mutex<Option<Consumer<MarketTick>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ArbitrageEngine {
    pub fn new(config: Config) -> Self {
        let (producer, consumer) = channel::bounded(config.threading.queue_capacity);
        Self {
            shared: Arc::new(EngineShared::new(config)),
            producer: Mutex::new(producer),
            consumer: Mutex::new(Some(consumer)),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the ingest and detection workers. A no-op while running.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let consumer = self.consumer.lock().take().unwrap_or_else(|| {
            // Restart after `stop`: the previous consumer died with its
            // worker, so producers get a fresh channel too.
            let (producer, consumer) =
                channel::bounded(self.shared.config.threading.queue_capacity);
            *self.producer.lock() = producer;
            consumer
        });

        let ingest = IngestWorker::new(self.shared.clone(), consumer);
        let detect = DetectionWorker::new(self.shared.clone());

        let mut workers = self.workers.lock();
        workers.push(std::thread::spawn(move || ingest.run()));
        workers.push(std::thread::spawn(move || detect.run()));
        info!("arbitrage engine started");
    }

    /// Signals both workers and joins them. Safe to call repeatedly and
    /// from `Drop`.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Submits one quote. Returns `false` when the symbol is malformed or
    /// the tick channel is full; the tick is not admitted in either case.
    ///
    /// May be called from any thread, before or after `start`; ticks
    /// queued while idle are drained once the engine starts.
    pub fn update_price(
        &self,
        exchange: Exchange,
        symbol: &str,
        bid: f64,
        ask: f64,
        volume: f64,
    ) -> bool {
        if parse_symbol(symbol).is_none() {
            return false;
        }

        let enqueue_start = Instant::now();
        let tick = MarketTick::from_quote(
            exchange,
            symbol,
            bid,
            ask,
            volume,
            enqueue_start,
            self.shared.sequence.fetch_add(1, Ordering::Relaxed),
        );

        let accepted = self.producer.lock().try_enqueue(tick).is_ok();
        if accepted {
            self.shared
                .stats
                .record_enqueue(enqueue_start.elapsed().as_secs_f64() * 1e6);
        }
        accepted
    }

    /// Registers a subscriber invoked synchronously on the detection
    /// thread for every published opportunity. Registration is additive
    /// and lives for the engine lifetime.
    pub fn register_opportunity_callback<F>(&self, callback: F)
    where
        F: Fn(&ArbitrageOpportunity) + Send + 'static,
    {
        self.shared.sink.register(Box::new(callback) as OpportunityCallback);
    }

    /// Snapshot of up to `limit` most recent opportunities, oldest first.
    pub fn get_recent_opportunities(&self, limit: usize) -> Vec<ArbitrageOpportunity> {
        self.shared.sink.recent(limit)
    }

    /// Snapshot of the performance counters.
    pub fn get_performance_stats(&self) -> PerformanceStats {
        self.shared.stats.snapshot()
    }
}

impl Drop for ArbitrageEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
