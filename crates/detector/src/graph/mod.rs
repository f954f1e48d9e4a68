//! Log-space currency-rate matrix.
//!
//! `W[u][v]` is the cost of converting one unit of currency `u` into
//! currency `v`, stored as `-ln(rate)` so that additive shortest paths
//! correspond to multiplicative returns. A negative-sum cycle is an
//! arbitrage.

use crate::MAX_NODES;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

pub mod index;

pub use index::CurrencyIndex;

/// Dense `MAX_NODES x MAX_NODES` matrix of f64 edge weights.
///
/// Cells are f64 bits in `AtomicU64` so the single writer (ingest worker)
/// and single reader (detection worker) can share the matrix without locks;
/// both sides use relaxed ordering and tolerate reading a mixture of old
/// and new weights within one sweep. Rows materialize on first node
/// activation, so an engine tracking a handful of currencies does not pay
/// for the full matrix.
pub struct RateGraph {
    rows: Box<[OnceLock<Box<[AtomicU64]>>]>,
}

impl RateGraph {
    pub fn new() -> Self {
        let rows = (0..MAX_NODES)
            .map(|_| OnceLock::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { rows }
    }

    /// Marks `node` active: its row exists and `W[node][node] == 0`.
    ///
    /// Idempotent. All other entries of a fresh row start at infinity.
    pub fn activate(&self, node: usize) {
        if node >= MAX_NODES {
            return;
        }
        let row = self.rows[node].get_or_init(|| {
            (0..MAX_NODES)
                .map(|_| AtomicU64::new(f64::INFINITY.to_bits()))
                .collect::<Vec<_>>()
                .into_boxed_slice()
        });
        row[node].store(0f64.to_bits(), Ordering::Relaxed);
    }

    /// A node is active iff its self-conversion cost is zero.
    pub fn is_active(&self, node: usize) -> bool {
        self.rows
            .get(node)
            .and_then(|r| r.get())
            .map(|row| f64::from_bits(row[node].load(Ordering::Relaxed)) == 0.0)
            .unwrap_or(false)
    }

    /// Reads `W[u][v]`. Unmaterialized edges are infinitely expensive.
    pub fn weight(&self, u: usize, v: usize) -> f64 {
        match self.row(u) {
            Some(row) => f64::from_bits(row[v].load(Ordering::Relaxed)),
            None => f64::INFINITY,
        }
    }

    /// Overwrites `W[u][v]`. The row must have been activated; writes to
    /// unknown rows are ignored, mirroring the ingest path's silent-drop
    /// policy.
    pub fn store(&self, u: usize, v: usize, weight: f64) {
        if u == v {
            return; // diagonal is pinned to zero for active nodes
        }
        if let Some(row) = self.row(u) {
            if v < MAX_NODES {
                row[v].store(weight.to_bits(), Ordering::Relaxed);
            }
        }
    }

    /// Direct row access for the detection sweep's inner loop.
    pub fn row(&self, u: usize) -> Option<&[AtomicU64]> {
        self.rows.get(u).and_then(|r| r.get()).map(|b| &b[..])
    }
}

impl Default for RateGraph {
    fn default() -> Self {
        Self::new()
    }
}
