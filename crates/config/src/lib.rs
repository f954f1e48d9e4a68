//! Configuration structs for the arb scanner, with YAML loading.
//!
//! All fields carry defaults so a partial file (or none at all) yields a
//! working configuration.

use common::ScannerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Detection and filtering thresholds.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ArbitrageConfig {
    /// Minimum fractional profit for an opportunity to be published.
    pub min_profit_threshold: f64,
    /// Notional position cap used by the volume estimate.
    pub max_position_size: f64,
    /// Cap on published opportunities in any rolling one-second window.
    pub max_opportunities_per_second: u32,
    /// Symbol universe for simulated or subscribed feeds.
    pub monitored_symbols: Vec<String>,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: 0.001, // 0.1%
            max_position_size: 1000.0,
            max_opportunities_per_second: 100,
            monitored_symbols: vec![
                "BTC/USDT".to_string(),
                "ETH/USDT".to_string(),
                "BNB/USDT".to_string(),
                "ADA/USDT".to_string(),
            ],
        }
    }
}

/// Threading knobs. The engine core always runs exactly two workers; the
/// thread-count and pinning fields are advisory for the surrounding
/// process (feed handlers, telemetry).
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ThreadingConfig {
    /// Tick channel capacity between producers and the ingest worker.
    pub queue_capacity: usize,
    pub num_processor_threads: u8,
    pub num_exchange_threads: u8,
    pub pin_threads: bool,
    pub cpu_affinity: Vec<u8>,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 65_536,
            num_processor_threads: 4,
            num_exchange_threads: 3,
            pin_threads: true,
            cpu_affinity: vec![0, 1, 2, 3],
        }
    }
}

/// The top-level configuration struct that maps directly to the YAML file.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub arbitrage: ArbitrageConfig,
    pub threading: ThreadingConfig,
}

impl Config {
    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.threading.queue_capacity == 0 {
            return Err(ScannerError::InvalidConfiguration(
                "threading.queue_capacity must be positive".to_string(),
            ));
        }
        if self.arbitrage.min_profit_threshold < 0.0 {
            return Err(ScannerError::InvalidConfiguration(
                "arbitrage.min_profit_threshold must not be negative".to_string(),
            ));
        }
        if self.arbitrage.max_position_size <= 0.0 {
            return Err(ScannerError::InvalidConfiguration(
                "arbitrage.max_position_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads and validates a configuration from a YAML file.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config, ScannerError> {
    let config_str =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ScannerError::Io(e.to_string()))?;
    let config: Config =
        serde_yaml::from_str(&config_str).map_err(|e| ScannerError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.arbitrage.min_profit_threshold, 0.001);
        assert_eq!(config.arbitrage.max_position_size, 1000.0);
        assert_eq!(config.arbitrage.max_opportunities_per_second, 100);
        assert_eq!(config.threading.queue_capacity, 65_536);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
arbitrage:
  min_profit_threshold: 0.005
threading:
  queue_capacity: 1024
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.arbitrage.min_profit_threshold, 0.005);
        assert_eq!(config.threading.queue_capacity, 1024);
        // Untouched fields keep their defaults.
        assert_eq!(config.arbitrage.max_opportunities_per_second, 100);
        assert_eq!(config.threading.num_exchange_threads, 3);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.threading.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut config = Config::default();
        config.arbitrage.min_profit_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_config_from_path("/nonexistent/scanner.yaml").unwrap_err();
        assert!(matches!(err, ScannerError::Io(_)));
    }
}
