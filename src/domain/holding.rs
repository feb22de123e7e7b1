//! Open positions and closed sales.

use chrono::NaiveDate;

use super::currency::Currency;

/// An open position as entered in the ledger.
///
/// `buy_price` is in the instrument's quote unit: dollars for USD, agorot for
/// ILS. `fee` is the purchase commission in major units of `currency`.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub name: Option<String>,
    pub quantity: f64,
    pub buy_price: f64,
    pub date: NaiveDate,
    pub fee: f64,
    pub currency: Currency,
}

impl Holding {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.symbol.replace(".TA", " (IL)"),
        }
    }

    pub fn buy_price_major(&self) -> f64 {
        self.currency.to_major(self.buy_price)
    }

    pub fn cost_basis(&self) -> f64 {
        self.buy_price_major() * self.quantity
    }

    /// Cost basis plus purchase fee, in major units.
    pub fn total_cost(&self) -> f64 {
        self.cost_basis() + self.fee
    }

    pub fn market_value(&self, price_major: f64) -> f64 {
        self.quantity * price_major
    }

    pub fn unrealized_pnl(&self, price_major: f64) -> f64 {
        self.quantity * (price_major - self.buy_price_major())
    }
}

/// A completed sale. Sales are recorded in USD.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub symbol: String,
    pub quantity: f64,
    pub sell_price: f64,
    pub buy_price: f64,
    pub date: NaiveDate,
    /// Entry plus exit commission; `None` uses the configured round-trip fee.
    pub fee_total: Option<f64>,
}

impl Sale {
    pub fn fee_or(&self, default_fee: f64) -> f64 {
        self.fee_total.unwrap_or(default_fee)
    }

    pub fn proceeds(&self) -> f64 {
        self.sell_price * self.quantity
    }

    pub fn cost(&self) -> f64 {
        self.buy_price * self.quantity
    }

    pub fn gross_pnl(&self) -> f64 {
        (self.sell_price - self.buy_price) * self.quantity
    }

    pub fn net_pnl(&self, default_fee: f64) -> f64 {
        self.gross_pnl() - self.fee_or(default_fee)
    }
}
