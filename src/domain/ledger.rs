//! The hand-entered ledger: holdings, sales, watchlist and cash.

use std::collections::HashSet;

use super::error::FolioError;
use super::holding::{Holding, Sale};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CashBalances {
    pub usd: f64,
    pub ils: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    pub holdings: Vec<Holding>,
    pub sales: Vec<Sale>,
    pub watchlist: Vec<String>,
    pub cash: CashBalances,
}

impl Ledger {
    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), FolioError> {
        let mut seen = HashSet::new();
        for h in &self.holdings {
            validate_symbol(&h.symbol)?;
            if !seen.insert(h.symbol.as_str()) {
                return Err(invalid(&h.symbol, "duplicate holding"));
            }
            if !positive(h.quantity) {
                return Err(invalid(&h.symbol, "quantity must be positive and finite"));
            }
            if !non_negative(h.buy_price) {
                return Err(invalid(&h.symbol, "buy_price must be non-negative and finite"));
            }
            if !non_negative(h.fee) {
                return Err(invalid(&h.symbol, "fee must be non-negative and finite"));
            }
        }

        for s in &self.sales {
            validate_symbol(&s.symbol)?;
            if !positive(s.quantity) {
                return Err(invalid(&s.symbol, "sale quantity must be positive and finite"));
            }
            if !non_negative(s.sell_price) || !non_negative(s.buy_price) {
                return Err(invalid(&s.symbol, "sale prices must be non-negative and finite"));
            }
            if let Some(fee) = s.fee_total {
                if !non_negative(fee) {
                    return Err(invalid(&s.symbol, "fee_total must be non-negative"));
                }
            }
        }

        for w in &self.watchlist {
            validate_symbol(w)?;
        }

        if !self.cash.usd.is_finite() || !self.cash.ils.is_finite() {
            return Err(invalid("cash", "balances must be finite"));
        }
        Ok(())
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn validate_symbol(symbol: &str) -> Result<(), FolioError> {
    if symbol.trim().is_empty() {
        return Err(invalid("<blank>", "symbol must not be empty"));
    }
    Ok(())
}

fn invalid(symbol: &str, reason: &str) -> FolioError {
    FolioError::LedgerInvalid {
        symbol: symbol.to_string(),
        reason: reason.to_string(),
    }
}
