//! Hold/sell/watch actions for holdings and watchlist symbols.

use std::fmt;

use super::indicator::sma;
use super::valuation::PositionValuation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TakeProfit,
    BuyDip,
    Hold,
    UptrendEntry,
    HotNews,
    Watch,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::TakeProfit => "TAKE PROFIT",
            Action::BuyDip => "BUY DIP",
            Action::Hold => "HOLD",
            Action::UptrendEntry => "UPTREND ENTRY",
            Action::HotNews => "HOT NEWS",
            Action::Watch => "WATCH",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalThresholds {
    /// P/L percentage above which a holding is flagged for profit taking.
    pub take_profit_pct: f64,
    /// P/L percentage below which a holding with positive sentiment is a dip buy.
    pub buy_dip_pct: f64,
    pub hot_news_score: f64,
    pub fast_sma: usize,
    pub slow_sma: usize,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            take_profit_pct: 15.0,
            buy_dip_pct: -5.0,
            hot_news_score: 0.7,
            fast_sma: 50,
            slow_sma: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub price: f64,
    pub pnl_pct: Option<f64>,
    pub sentiment: f64,
    pub action: Action,
}

pub fn holding_action(pnl_pct: f64, sentiment: f64, t: &SignalThresholds) -> Action {
    if pnl_pct > t.take_profit_pct {
        Action::TakeProfit
    } else if pnl_pct < t.buy_dip_pct && sentiment > 0.0 {
        Action::BuyDip
    } else {
        Action::Hold
    }
}

pub fn watchlist_action(closes: &[f64], sentiment: f64, t: &SignalThresholds) -> Action {
    if sentiment > t.hot_news_score {
        return Action::HotNews;
    }
    match (sma(closes, t.fast_sma), sma(closes, t.slow_sma)) {
        (Some(fast), Some(slow)) if fast > slow => Action::UptrendEntry,
        _ => Action::Watch,
    }
}

pub fn holding_signal(
    position: &PositionValuation,
    sentiment: f64,
    t: &SignalThresholds,
) -> Signal {
    Signal {
        symbol: position.symbol.clone(),
        price: position.last_price,
        pnl_pct: Some(position.total_pnl_pct),
        sentiment,
        action: holding_action(position.total_pnl_pct, sentiment, t),
    }
}

/// `closes` are oldest first; an empty series yields `None`.
pub fn watchlist_signal(
    symbol: &str,
    closes: &[f64],
    sentiment: f64,
    t: &SignalThresholds,
) -> Option<Signal> {
    let price = *closes.last()?;
    Some(Signal {
        symbol: symbol.to_string(),
        price,
        pnl_pct: None,
        sentiment,
        action: watchlist_action(closes, sentiment, t),
    })
}
