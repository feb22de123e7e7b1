//! Portfolio valuation and profit/loss.
//!
//! Every open holding is priced with [`resolve_quote`], converted to major
//! units and to USD, and summed into a [`PortfolioValuation`]. Realized P/L
//! comes from the sale history independently of the open holdings, so an
//! empty portfolio still reports realized profit and fees paid.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::currency::{Currency, FxRate};
use super::holding::{Holding, Sale};
use super::ledger::{CashBalances, Ledger};
use super::quote::{Quote, QuoteSource, resolve_quote};

/// Per-trade commission when the config does not set one.
pub const DEFAULT_COMMISSION: f64 = 7.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionValuation {
    pub symbol: String,
    pub display_name: String,
    pub quantity: f64,
    pub currency: Currency,
    pub last_price: f64,
    pub previous_close: f64,
    pub buy_price: f64,
    pub market_value: f64,
    pub cost_basis: f64,
    pub total_pnl: f64,
    pub total_pnl_pct: f64,
    pub day_change: f64,
    pub day_change_pct: f64,
    pub market_value_usd: f64,
    pub cost_basis_usd: f64,
    pub source: QuoteSource,
    pub next_report: String,
}

impl PositionValuation {
    pub fn unrealized_pnl_usd(&self) -> f64 {
        self.market_value_usd - self.cost_basis_usd
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealizedRow {
    pub symbol: String,
    pub quantity: f64,
    pub date: NaiveDate,
    pub proceeds: f64,
    pub cost: f64,
    pub fee: f64,
    pub net_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RealizedSummary {
    pub rows: Vec<RealizedRow>,
    pub net_pnl: f64,
    pub fees_paid: f64,
}

impl RealizedSummary {
    pub fn compute(sales: &[Sale], default_fee: f64) -> Self {
        let mut summary = RealizedSummary::default();
        for sale in sales {
            let fee = sale.fee_or(default_fee);
            let net_pnl = sale.gross_pnl() - fee;
            summary.net_pnl += net_pnl;
            summary.fees_paid += fee;
            summary.rows.push(RealizedRow {
                symbol: sale.symbol.clone(),
                quantity: sale.quantity,
                date: sale.date,
                proceeds: sale.proceeds(),
                cost: sale.cost(),
                fee,
                net_pnl,
            });
        }
        summary
    }

    pub fn winners(&self) -> usize {
        self.rows.iter().filter(|r| r.net_pnl > 0.0).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuyLogRow {
    pub display_name: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
    pub total_cost: f64,
    pub currency: Currency,
}

impl BuyLogRow {
    pub fn from_holding(h: &Holding) -> Self {
        Self {
            display_name: h.display_name(),
            date: h.date,
            quantity: h.quantity,
            price: h.buy_price_major(),
            fee: h.fee,
            total_cost: h.total_cost(),
            currency: h.currency,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValuation {
    pub positions: Vec<PositionValuation>,
    pub buy_log: Vec<BuyLogRow>,
    pub realized: RealizedSummary,
    pub fx: FxRate,
    pub cash: CashBalances,
    pub market_value_usd: f64,
    pub unrealized_pnl_usd: f64,
    pub open_fees_usd: f64,
    pub lifetime_fees_usd: f64,
    pub net_worth_usd: f64,
    pub net_worth_ils: f64,
    pub net_profit_usd: f64,
}

impl PortfolioValuation {
    pub fn cash_usd_equivalent(&self) -> f64 {
        self.cash.usd + self.fx.to_usd(self.cash.ils, Currency::Ils)
    }

    pub fn fallback_count(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| p.source == QuoteSource::Fallback)
            .count()
    }
}

/// Everything needed to value a ledger at one point in time.
pub struct ValuationInput<'a> {
    pub ledger: &'a Ledger,
    pub quotes: &'a HashMap<String, Quote>,
    pub manual_prices: &'a HashMap<String, f64>,
    pub earnings: &'a HashMap<String, String>,
    pub fx: FxRate,
    pub default_sale_fee: f64,
}

pub fn value_position(
    holding: &Holding,
    quote: &Quote,
    fx: FxRate,
    next_report: Option<&str>,
) -> PositionValuation {
    let currency = holding.currency;
    let last = currency.to_major(quote.last);
    let prev = currency.to_major(quote.previous_close);
    let buy = holding.buy_price_major();

    let market_value = holding.market_value(last);
    let cost_basis = holding.cost_basis();

    let total_pnl_pct = if buy > 0.0 {
        (last - buy) / buy * 100.0
    } else {
        0.0
    };
    let day_change_pct = if prev > 0.0 {
        (last - prev) / prev * 100.0
    } else {
        0.0
    };
    let day_change = if prev > 0.0 {
        (last - prev) * holding.quantity
    } else {
        0.0
    };

    PositionValuation {
        symbol: holding.symbol.clone(),
        display_name: holding.display_name(),
        quantity: holding.quantity,
        currency,
        last_price: last,
        previous_close: prev,
        buy_price: buy,
        market_value,
        cost_basis,
        total_pnl: holding.unrealized_pnl(last),
        total_pnl_pct,
        day_change,
        day_change_pct,
        market_value_usd: fx.to_usd(market_value, currency),
        cost_basis_usd: fx.to_usd(cost_basis, currency),
        source: quote.source,
        next_report: next_report.unwrap_or("-").to_string(),
    }
}

pub fn value_portfolio(input: &ValuationInput) -> PortfolioValuation {
    let ledger = input.ledger;
    let fx = input.fx;

    let positions: Vec<PositionValuation> = ledger
        .holdings
        .iter()
        .map(|h| {
            let quote = resolve_quote(
                h,
                input.manual_prices.get(&h.symbol).copied(),
                input.quotes.get(&h.symbol),
            );
            value_position(h, &quote, fx, input.earnings.get(&h.symbol).map(String::as_str))
        })
        .collect();

    let market_value_usd: f64 = positions.iter().map(|p| p.market_value_usd).sum();
    let unrealized_pnl_usd: f64 = positions.iter().map(|p| p.unrealized_pnl_usd()).sum();
    let open_fees_usd: f64 = ledger
        .holdings
        .iter()
        .map(|h| fx.to_usd(h.fee, h.currency))
        .sum();

    let realized = RealizedSummary::compute(&ledger.sales, input.default_sale_fee);
    let lifetime_fees_usd = open_fees_usd + realized.fees_paid;

    let net_worth_usd =
        market_value_usd + ledger.cash.usd + fx.to_usd(ledger.cash.ils, Currency::Ils);
    let net_worth_ils = fx.usd_to_ils(net_worth_usd);
    let net_profit_usd = unrealized_pnl_usd + realized.net_pnl - open_fees_usd;

    PortfolioValuation {
        positions,
        buy_log: ledger.holdings.iter().map(BuyLogRow::from_holding).collect(),
        realized,
        fx,
        cash: ledger.cash,
        market_value_usd,
        unrealized_pnl_usd,
        open_fees_usd,
        lifetime_fees_usd,
        net_worth_usd,
        net_worth_ils,
        net_profit_usd,
    }
}
