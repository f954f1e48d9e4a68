//! Negative-cycle arbitrage detection using log-space Bellman-Ford.

use crate::engine::EngineShared;
use crate::DETECTION_INTERVAL;
use common::ArbitrageOpportunity;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

/// Periodically sweeps the rate matrix for negative cycles and feeds them
/// to the opportunity sink.
///
/// One sweep runs Bellman-Ford from every active source node. Distance and
/// parent scratch buffers live on the worker and are reused across sweeps.
pub(crate) struct DetectionWorker {
    shared: Arc<EngineShared>,
    dist: Vec<f64>,
    parent: Vec<Option<u32>>,
}

impl DetectionWorker {
    pub(crate) fn new(shared: Arc<EngineShared>) -> Self {
        Self {
            shared,
            dist: Vec::new(),
            parent: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) {
        info!("detection worker started");
        while self.shared.running.load(Ordering::Acquire) {
            let sweep_start = Instant::now();
            self.sweep();
            // Hold the target rate; overruns are tolerated and not skipped.
            let elapsed = sweep_start.elapsed();
            if elapsed < DETECTION_INTERVAL {
                thread::sleep(DETECTION_INTERVAL - elapsed);
            }
        }
        info!("detection worker stopped");
    }

    /// One full pass over all active sources.
    ///
    /// Node ids are dense, so the allocated prefix of the matrix is exactly
    /// the active node set.
    pub(crate) fn sweep(&mut self) {
        let node_count = self.shared.index.read().len();
        if node_count == 0 {
            return;
        }
        self.dist.resize(node_count, f64::INFINITY);
        self.parent.resize(node_count, None);

        for source in 0..node_count {
            if !self.shared.graph.is_active(source) {
                continue;
            }
            self.scan_from(source, node_count);
        }
    }

    /// Bellman-Ford from one source, emitting every still-relaxable target
    /// as a cycle candidate.
    fn scan_from(&mut self, source: usize, node_count: usize) {
        for d in self.dist.iter_mut() {
            *d = f64::INFINITY;
        }
        for p in self.parent.iter_mut() {
            *p = None;
        }
        self.dist[source] = 0.0;

        // Relax up to V-1 rounds, stopping early once stable.
        for _ in 1..node_count {
            let mut updated = false;
            for u in 0..node_count {
                let from_dist = self.dist[u];
                if !from_dist.is_finite() {
                    continue;
                }
                let Some(row) = self.shared.graph.row(u) else {
                    continue;
                };
                for v in 0..node_count {
                    let weight = f64::from_bits(row[v].load(Ordering::Relaxed));
                    if !weight.is_finite() {
                        continue;
                    }
                    let candidate = from_dist + weight;
                    if candidate < self.dist[v] {
                        self.dist[v] = candidate;
                        self.parent[v] = Some(u as u32);
                        updated = true;
                    }
                }
            }
            if !updated {
                break;
            }
        }

        // Any edge that still relaxes closes a negative cycle.
        for u in 0..node_count {
            let from_dist = self.dist[u];
            if !from_dist.is_finite() {
                continue;
            }
            let Some(row) = self.shared.graph.row(u) else {
                continue;
            };
            for v in 0..node_count {
                let weight = f64::from_bits(row[v].load(Ordering::Relaxed));
                if !weight.is_finite() {
                    continue;
                }
                if from_dist + weight < self.dist[v] {
                    if let Some(opportunity) = self.build_opportunity(v) {
                        self.shared.sink.submit(opportunity, &self.shared.stats);
                    }
                }
            }
        }
    }

    /// Walks the parent chain from a relaxable target back to the first
    /// revisited node. The walked suffix from that node is the cycle, in
    /// reverse trading order.
    fn extract_cycle(&self, target: usize) -> Option<Vec<u32>> {
        let mut visited = HashSet::new();
        let mut walked: Vec<u32> = Vec::new();
        let mut current = target as u32;
        loop {
            if !visited.insert(current) {
                break;
            }
            walked.push(current);
            current = self.parent[current as usize]?;
        }

        let entry = walked.iter().position(|&node| node == current)?;
        let mut cycle = walked[entry..].to_vec();
        if cycle.len() < 3 {
            return None;
        }
        cycle.reverse();
        Some(cycle)
    }

    /// Prices a cycle and wraps it as an opportunity, rejecting degenerate
    /// or non-negative cycles.
    fn build_opportunity(&self, target: usize) -> Option<ArbitrageOpportunity> {
        let cycle = self.extract_cycle(target)?;

        let mut total_log_return = 0.0;
        for i in 0..cycle.len() {
            let u = cycle[i] as usize;
            let v = cycle[(i + 1) % cycle.len()] as usize;
            let weight = self.shared.graph.weight(u, v);
            if !weight.is_finite() {
                return None;
            }
            total_log_return += weight;
        }
        if total_log_return >= 0.0 {
            return None;
        }

        let now = Instant::now();
        let profit_pct = (-total_log_return).exp() - 1.0;
        let confidence = self.confidence(total_log_return, cycle.len(), now);
        let max_volume = self.shared.config.arbitrage.max_position_size / cycle.len() as f64;

        let index = self.shared.index.read();
        let path = cycle
            .iter()
            .map(|&node| index.label(node).to_string())
            .collect();

        Some(ArbitrageOpportunity {
            path,
            profit_pct,
            max_volume,
            confidence,
            detected_at: now,
        })
    }

    /// Heuristic reliability score in [0, 150]: profit magnitude, cycle
    /// length, and data freshness each contribute up to 50 points.
    fn confidence(&self, log_return: f64, path_len: usize, now: Instant) -> u32 {
        let profit_score = (log_return.abs() * 100.0).min(50.0);
        let length_score = (50.0 - 10.0 * path_len as f64).max(0.0);
        let freshness_score = (50.0 - self.shared.stats.data_age_ms(now) / 100.0).max(0.0);
        (profit_score + length_score + freshness_score) as u32
    }
}
