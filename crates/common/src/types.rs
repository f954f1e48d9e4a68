use std::fmt;
use std::time::Instant;

/// Identifies the venue a tick originated from. The discriminant doubles as
/// the exchange byte in currency-node keys, so values are stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum Exchange {
    Binance = 0,
    Coinbase = 1,
    Kraken = 2,
    Unknown = 255,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::Coinbase => "Coinbase",
            Exchange::Kraken => "Kraken",
            Exchange::Unknown => "Unknown",
        }
    }

    /// The byte used when composing currency-node keys.
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }
}

impl std::str::FromStr for Exchange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Binance" => Ok(Exchange::Binance),
            "Coinbase" => Ok(Exchange::Coinbase),
            "Kraken" => Ok(Exchange::Kraken),
            "Unknown" => Ok(Exchange::Unknown),
            _ => Err(anyhow::anyhow!("Invalid exchange: {}", s)),
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One top-of-book update for a symbol on an exchange.
///
/// `last` is the mid price `(bid + ask) / 2` when the venue does not report
/// a trade price. `sequence` is assigned at the ingest boundary and is
/// unique within an engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketTick {
    pub exchange: Exchange,
    /// Pair symbol in "BASE/QUOTE" form, e.g. "BTC/USDT".
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: f64,
    pub timestamp: Instant,
    pub sequence: u64,
}

impl MarketTick {
    /// Builds a tick with `last` derived from the quote mid.
    pub fn from_quote(
        exchange: Exchange,
        symbol: impl Into<String>,
        bid: f64,
        ask: f64,
        volume: f64,
        timestamp: Instant,
        sequence: u64,
    ) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            bid,
            ask,
            last: (bid + ask) / 2.0,
            volume,
            timestamp,
            sequence,
        }
    }
}

/// A detected cyclic arbitrage opportunity.
///
/// `path` holds the currency-node labels in forward trading order; the
/// cycle closes implicitly from the last node back to the first.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub path: Vec<String>,
    /// Fractional profit, e.g. 0.0245 for 2.45%.
    pub profit_pct: f64,
    /// Estimated executable volume across the whole cycle.
    pub max_volume: f64,
    /// Heuristic reliability score in [0, 150].
    pub confidence: u32,
    pub detected_at: Instant,
}

impl ArbitrageOpportunity {
    pub fn is_profitable(&self, min_profit: f64) -> bool {
        self.profit_pct > min_profit
    }

    /// Renders the cycle as "BTC_0 -> USDT_0 -> ETH_0".
    pub fn path_display(&self) -> String {
        self.path.join(" -> ")
    }
}

impl fmt::Display for ArbitrageOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.3}%, confidence {})",
            self.path_display(),
            self.profit_pct * 100.0,
            self.confidence
        )
    }
}

/// Snapshot of the engine's performance counters.
#[derive(Debug, Clone)]
pub struct PerformanceStats {
    pub messages_processed: u64,
    pub opportunities_found: u64,
    pub false_positives: u64,
    /// Exponentially weighted moving average of the ingest latency.
    pub avg_latency_us: f64,
    /// When the rate graph last absorbed a tick.
    pub last_update: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_exchange_display_and_from_str() {
        assert_eq!(Exchange::from_str("Binance").unwrap(), Exchange::Binance);
        assert_eq!(format!("{}", Exchange::Kraken), "Kraken");
        assert!(Exchange::from_str("NYSE").is_err());
    }

    #[test]
    fn test_exchange_byte_values() {
        assert_eq!(Exchange::Binance.as_byte(), 0);
        assert_eq!(Exchange::Coinbase.as_byte(), 1);
        assert_eq!(Exchange::Kraken.as_byte(), 2);
        assert_eq!(Exchange::Unknown.as_byte(), 255);
    }

    #[test]
    fn test_tick_mid_price() {
        let tick = MarketTick::from_quote(
            Exchange::Binance,
            "BTC/USDT",
            50000.0,
            50010.0,
            1.5,
            Instant::now(),
            0,
        );
        assert_eq!(tick.last, 50005.0);
        assert_eq!(tick.symbol, "BTC/USDT");
    }

    #[test]
    fn test_opportunity_profitability() {
        let opp = ArbitrageOpportunity {
            path: vec!["BTC_0".into(), "USDT_0".into(), "ETH_0".into()],
            profit_pct: 0.002,
            max_volume: 333.0,
            confidence: 90,
            detected_at: Instant::now(),
        };
        assert!(opp.is_profitable(0.001));
        assert!(!opp.is_profitable(0.002));
        assert_eq!(opp.path_display(), "BTC_0 -> USDT_0 -> ETH_0");
    }

    #[test]
    fn test_opportunity_display() {
        let opp = ArbitrageOpportunity {
            path: vec!["A_0".into(), "B_0".into(), "C_0".into()],
            profit_pct: 0.0245,
            max_volume: 100.0,
            confidence: 120,
            detected_at: Instant::now(),
        };
        assert_eq!(format!("{}", opp), "A_0 -> B_0 -> C_0 (2.450%, confidence 120)");
    }
}
