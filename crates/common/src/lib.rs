//! # Arb Scanner Common Crate
//!
//! This crate provides the data types and error definitions shared across
//! the `arb-scanner` workspace: market ticks, detected opportunities,
//! exchange identifiers, and performance counters.

/// Module for common error types.
pub mod errors;

/// Module for common data structures and types.
pub mod types;

// Re-export key items for easier access.
pub use errors::ScannerError;
pub use types::{ArbitrageOpportunity, Exchange, MarketTick, PerformanceStats};
