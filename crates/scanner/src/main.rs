//! Scanner runtime: drives the arbitrage engine with simulated exchange
//! feeds and logs every published opportunity.

use anyhow::Result;
use clap::Parser;
use common::Exchange;
use config_lib::Config;
use detector::ArbitrageEngine;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "arb-scanner", about = "Real-time cryptocurrency arbitrage scanner")]
struct Args {
    /// Path to a YAML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// How long to run the simulated feeds, in seconds.
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config_lib::load_config_from_path(path)?,
        None => Config::default(),
    };
    config.validate()?;

    let engine = Arc::new(ArbitrageEngine::new(config.clone()));
    engine.register_opportunity_callback(|opp| {
        info!(
            path = %opp.path_display(),
            profit_pct = format_args!("{:.4}%", opp.profit_pct * 100.0),
            confidence = opp.confidence,
            max_volume = format_args!("{:.2}", opp.max_volume),
            "arbitrage opportunity"
        );
    });
    engine.start();
    info!(duration_secs = args.duration_secs, "engine started");

    let deadline = Instant::now() + Duration::from_secs(args.duration_secs);
    let feeds: Vec<_> = [Exchange::Binance, Exchange::Coinbase, Exchange::Kraken]
        .into_iter()
        .map(|exchange| {
            let engine = engine.clone();
            let symbols = config.arbitrage.monitored_symbols.clone();
            std::thread::spawn(move || simulate_feed(&engine, exchange, &symbols, deadline))
        })
        .collect();

    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_secs(1));
        let stats = engine.get_performance_stats();
        info!(
            messages = stats.messages_processed,
            opportunities = stats.opportunities_found,
            avg_latency_us = format_args!("{:.1}", stats.avg_latency_us),
            "engine stats"
        );
    }

    for feed in feeds {
        let _ = feed.join();
    }
    engine.stop();

    let stats = engine.get_performance_stats();
    info!(
        messages = stats.messages_processed,
        opportunities = stats.opportunities_found,
        "scanner finished"
    );
    Ok(())
}

/// Emits jittered quotes for the configured universe plus the ETH/BTC
/// cross, with occasional dislocations so cycles actually appear.
fn simulate_feed(
    engine: &ArbitrageEngine,
    exchange: Exchange,
    symbols: &[String],
    deadline: Instant,
) {
    let mut rng = rand::thread_rng();
    let mut rejected: u64 = 0;

    while Instant::now() < deadline {
        for symbol in symbols.iter().map(String::as_str).chain(["ETH/BTC"]) {
            let mut mid = reference_mid(symbol) * rng.gen_range(0.999..1.001);
            // Roughly one tick in a thousand is dislocated enough to open
            // a triangular cycle against the other legs.
            if rng.gen_bool(0.001) {
                mid *= 1.005;
            }
            let half_spread = mid * 0.0001;
            let admitted = engine.update_price(
                exchange,
                symbol,
                mid - half_spread,
                mid + half_spread,
                rng.gen_range(0.1..5.0),
            );
            if !admitted {
                rejected += 1;
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    if rejected > 0 {
        info!(%exchange, rejected, "feed finished with rejected ticks");
    }
}

/// Nominal mid prices for the demo universe.
fn reference_mid(symbol: &str) -> f64 {
    match symbol {
        "BTC/USDT" => 50_000.0,
        "ETH/USDT" => 2_000.0,
        "BNB/USDT" => 300.0,
        "ADA/USDT" => 0.5,
        "ETH/BTC" => 2_000.0 / 50_000.0,
        _ => 1.0,
    }
}
