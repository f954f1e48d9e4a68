//! Ingest worker: drains the tick channel into the rate graph.

use crate::channel::Consumer;
use crate::engine::EngineShared;
use crate::POLL_INTERVAL;
use common::MarketTick;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Splits a "BASE/QUOTE" symbol on the first `/`.
///
/// Rejects symbols with no separator, or with the separator at either end.
/// Anything after the first separator belongs to the quote, so
/// "BTC/USDT/EXTRA" parses as `("BTC", "USDT/EXTRA")`.
pub fn parse_symbol(symbol: &str) -> Option<(&str, &str)> {
    let pos = symbol.find('/')?;
    if pos == 0 || pos == symbol.len() - 1 {
        return None;
    }
    Some((&symbol[..pos], &symbol[pos + 1..]))
}

/// Folds one tick into the rate graph.
///
/// For a pair BASE/QUOTE on exchange `e`: selling base at the bid costs
/// `-ln(bid)` on base -> quote, and buying base at the ask costs `ln(ask)`
/// on quote -> base. Sides with non-positive prices are skipped;
/// unparseable symbols and index exhaustion drop the whole tick.
pub(crate) fn apply_tick(shared: &EngineShared, tick: &MarketTick) {
    let Some((base, quote)) = parse_symbol(&tick.symbol) else {
        debug!(symbol = %tick.symbol, "dropping tick with malformed symbol");
        return;
    };
    let exchange = tick.exchange.as_byte();

    let (base_idx, quote_idx) = {
        let mut index = shared.index.write();
        let Some(base_idx) = index.lookup_or_insert(base, exchange) else {
            debug!(symbol = %tick.symbol, "node space exhausted; dropping tick");
            return;
        };
        let Some(quote_idx) = index.lookup_or_insert(quote, exchange) else {
            debug!(symbol = %tick.symbol, "node space exhausted; dropping tick");
            return;
        };
        (base_idx as usize, quote_idx as usize)
    };

    shared.graph.activate(base_idx);
    shared.graph.activate(quote_idx);

    if tick.bid > 0.0 {
        shared.graph.store(base_idx, quote_idx, -tick.bid.ln());
    }
    if tick.ask > 0.0 {
        // -ln(1/ask) == ln(ask)
        shared.graph.store(quote_idx, base_idx, tick.ask.ln());
    }

    shared.stats.mark_update(tick.timestamp);
}

/// Dequeues ticks and applies them to the graph until the engine stops.
pub(crate) struct IngestWorker {
    shared: Arc<EngineShared>,
    consumer: Consumer<MarketTick>,
}

impl IngestWorker {
    pub(crate) fn new(shared: Arc<EngineShared>, consumer: Consumer<MarketTick>) -> Self {
        Self { shared, consumer }
    }

    pub(crate) fn run(mut self) {
        info!("ingest worker started");
        while self.shared.running.load(Ordering::Acquire) {
            match self.consumer.try_dequeue() {
                Some(tick) => apply_tick(&self.shared, &tick),
                None => thread::sleep(POLL_INTERVAL),
            }
        }
        info!("ingest worker stopped");
    }
}
