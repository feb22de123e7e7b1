//! Gathering quotes, the FX rate and watchlist history from a quote port.
//!
//! Failures never abort a run: a symbol without a quote is valued at cost,
//! a failed FX fetch uses the configured fallback rate, and a watchlist
//! symbol without history is skipped. Every failure is recorded.

use std::collections::HashMap;

use crate::domain::currency::FxRate;
use crate::domain::ledger::Ledger;
use crate::domain::quote::Quote;
use crate::domain::signal::{Signal, SignalThresholds, holding_signal, watchlist_signal};
use crate::domain::valuation::PortfolioValuation;
use crate::ports::quote_port::QuotePort;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub quotes: HashMap<String, Quote>,
    pub fx: FxRate,
    pub fx_is_live: bool,
    pub failures: Vec<FetchFailure>,
}

pub fn fetch_fx(port: &dyn QuotePort, pair: &str, fallback: FxRate) -> (FxRate, Option<FetchFailure>) {
    match port.fetch_fx_rate(pair) {
        Ok(rate) => match FxRate::new(rate) {
            Some(fx) => (fx, None),
            None => (
                fallback,
                Some(FetchFailure {
                    symbol: pair.to_string(),
                    reason: format!("non-positive rate {}", rate),
                }),
            ),
        },
        Err(e) => (
            fallback,
            Some(FetchFailure {
                symbol: pair.to_string(),
                reason: e.to_string(),
            }),
        ),
    }
}

/// Fetch quotes for every holding without a manual override, plus the FX rate.
pub fn fetch_snapshot(
    port: &dyn QuotePort,
    ledger: &Ledger,
    manual_prices: &HashMap<String, f64>,
    fx_pair: &str,
    fallback_fx: FxRate,
) -> MarketSnapshot {
    let mut failures = Vec::new();

    let (fx, fx_failure) = fetch_fx(port, fx_pair, fallback_fx);
    let fx_is_live = fx_failure.is_none();
    if let Some(f) = fx_failure {
        log::warn!("FX rate {} unavailable ({}), using {:.4}", f.symbol, f.reason, fx.usd_ils);
        failures.push(f);
    }

    let mut quotes = HashMap::new();
    for holding in &ledger.holdings {
        let has_manual = manual_prices
            .get(&holding.symbol)
            .is_some_and(|p| p.is_finite() && *p > 0.0);
        if has_manual {
            log::debug!("{}: manual price, skipping fetch", holding.symbol);
            continue;
        }
        match port.fetch_quote(&holding.symbol) {
            Ok(q) => {
                quotes.insert(holding.symbol.clone(), q);
            }
            Err(e) => {
                log::warn!("{}: no quote, valuing at cost ({})", holding.symbol, e);
                failures.push(FetchFailure {
                    symbol: holding.symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    MarketSnapshot {
        quotes,
        fx,
        fx_is_live,
        failures,
    }
}

/// Signals for every valued holding followed by every watchlist symbol.
pub fn collect_signals(
    port: &dyn QuotePort,
    valuation: &PortfolioValuation,
    watchlist: &[String],
    sentiment: &HashMap<String, f64>,
    thresholds: &SignalThresholds,
    history_days: u32,
) -> (Vec<Signal>, Vec<FetchFailure>) {
    let score = |symbol: &str| sentiment.get(symbol).copied().unwrap_or(0.0);

    let mut signals: Vec<Signal> = valuation
        .positions
        .iter()
        .map(|p| holding_signal(p, score(&p.symbol), thresholds))
        .collect();
    let mut failures = Vec::new();

    for symbol in watchlist {
        match port.fetch_closes(symbol, history_days) {
            Ok(closes) => match watchlist_signal(symbol, &closes, score(symbol), thresholds) {
                Some(s) => signals.push(s),
                None => failures.push(FetchFailure {
                    symbol: symbol.clone(),
                    reason: "empty price history".into(),
                }),
            },
            Err(e) => {
                log::warn!("{}: no history ({})", symbol, e);
                failures.push(FetchFailure {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (signals, failures)
}
