//! Currency-rate graph maintenance and negative-cycle arbitrage detection.
//!
//! The crate exposes a single [`ArbitrageEngine`]: producer threads push
//! ticks through [`ArbitrageEngine::update_price`], an ingest worker folds
//! them into a log-space rate matrix, and a detection worker sweeps the
//! matrix with Bellman-Ford, publishing negative cycles as
//! [`common::ArbitrageOpportunity`] values.

pub mod bellman_ford;
pub mod channel;
pub mod engine;
pub mod graph;
pub mod ingest;
pub mod sink;
pub mod stats;

use std::time::Duration;

/// Upper bound on distinct exchanges in a node key.
pub const MAX_EXCHANGES: usize = 16;
/// Upper bound on distinct currencies per exchange.
pub const MAX_SYMBOLS: usize = 256;
/// Capacity of the currency-node space and the rate matrix dimension.
pub const MAX_NODES: usize = MAX_EXCHANGES * MAX_SYMBOLS;
/// Retained opportunity history length.
pub const HISTORY_CAP: usize = 1000;
/// Target period of one detection sweep (100 Hz).
pub const DETECTION_INTERVAL: Duration = Duration::from_millis(10);
/// Ingest worker sleep when the tick channel is empty.
pub const POLL_INTERVAL: Duration = Duration::from_micros(100);

pub use engine::ArbitrageEngine;
pub use sink::OpportunityCallback;
