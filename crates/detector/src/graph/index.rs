//! Bidirectional mapping between `(currency, exchange)` pairs and dense
//! node ids.

use crate::MAX_NODES;
use std::collections::HashMap;

/// Label returned for ids that were never assigned.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Assigns dense node ids on first sight. Ids are write-once: a key always
/// resolves to the id it was first given, and ids are never reused within
/// an engine instance.
pub struct CurrencyIndex {
    forward: HashMap<String, u32>,
    labels: Vec<String>,
}

impl CurrencyIndex {
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            labels: Vec::new(),
        }
    }

    /// Resolves `(currency, exchange)` to a node id, assigning the next
    /// dense id on first sight. Returns `None` once the node space is
    /// exhausted.
    pub fn lookup_or_insert(&mut self, currency: &str, exchange: u8) -> Option<u32> {
        let key = format!("{}_{}", currency, exchange);
        if let Some(&id) = self.forward.get(&key) {
            return Some(id);
        }
        if self.labels.len() >= MAX_NODES {
            return None;
        }
        let id = self.labels.len() as u32;
        self.forward.insert(key.clone(), id);
        self.labels.push(key);
        Some(id)
    }

    /// Reverse lookup. Unassigned ids map to [`UNKNOWN_LABEL`].
    pub fn label(&self, node: u32) -> &str {
        self.labels
            .get(node as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Number of assigned node ids. Ids are dense, so every id below this
    /// count is valid.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CurrencyIndex {
    fn default() -> Self {
        Self::new()
    }
}
