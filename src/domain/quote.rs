//! Price quotes and the manual/live/fallback resolution rule.

use std::fmt;

use super::holding::Holding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    Live,
    Manual,
    Fallback,
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSource::Live => write!(f, "live"),
            QuoteSource::Manual => write!(f, "manual"),
            QuoteSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A price in the instrument's quote unit (agorot for Tel Aviv listings).
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub last: f64,
    pub previous_close: f64,
    pub source: QuoteSource,
}

impl Quote {
    pub fn live(symbol: &str, last: f64, previous_close: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            last,
            previous_close,
            source: QuoteSource::Live,
        }
    }
}

/// Pick the price used to value `holding`.
///
/// A positive manual override wins and carries no day change. Otherwise a
/// live quote with a positive last price is used. Failing both, the buy
/// price stands in for last and previous close.
pub fn resolve_quote(holding: &Holding, manual: Option<f64>, live: Option<&Quote>) -> Quote {
    if let Some(price) = manual.filter(|p| p.is_finite() && *p > 0.0) {
        return Quote {
            symbol: holding.symbol.clone(),
            last: price,
            previous_close: price,
            source: QuoteSource::Manual,
        };
    }

    if let Some(q) = live.filter(|q| q.last.is_finite() && q.last > 0.0) {
        return Quote {
            symbol: holding.symbol.clone(),
            last: q.last,
            previous_close: if q.previous_close.is_finite() {
                q.previous_close
            } else {
                0.0
            },
            source: QuoteSource::Live,
        };
    }

    Quote {
        symbol: holding.symbol.clone(),
        last: holding.buy_price,
        previous_close: holding.buy_price,
        source: QuoteSource::Fallback,
    }
}
