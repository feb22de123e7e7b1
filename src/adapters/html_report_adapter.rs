//! HTML report adapter implementing ReportPort.
//!
//! Renders `templates/report.html` with Askama: account snapshot, live
//! assets, buy log, realized P/L and signals. Gains are green, losses red.

use std::fs;
use std::path::Path;

use crate::domain::currency::{Currency, format_money, group_thousands};
use crate::domain::error::FolioError;
use crate::domain::quote::QuoteSource;
use crate::domain::signal::{Action, Signal};
use crate::domain::valuation::{BuyLogRow, PortfolioValuation, PositionValuation, RealizedRow};
use crate::ports::report_port::{PortfolioReport, ReportPort};

use askama::Template;

const GAIN_COLOR: &str = "#2ecc71";
const LOSS_COLOR: &str = "#e74c3c";

/// Pre-formatted text with its P/L colour.
struct Cell {
    text: String,
    color: &'static str,
}

impl Cell {
    fn signed(text: String, value: f64) -> Self {
        let color = if value >= 0.0 { GAIN_COLOR } else { LOSS_COLOR };
        Self { text, color }
    }

    fn money(value: f64, currency: Currency) -> Self {
        Self::signed(format_money(value, currency), value)
    }

    fn pct(value: f64) -> Self {
        Self::signed(format!("{:.2}%", value), value)
    }
}

struct Metric {
    label: &'static str,
    value: String,
    /// Empty for an uncoloured value.
    color: &'static str,
    note: String,
}

struct PositionRow {
    name: String,
    quantity: String,
    price: String,
    /// Empty for live quotes.
    source: String,
    day_change: Cell,
    day_pct: Cell,
    avg_cost: String,
    value: String,
    pnl: Cell,
    pnl_pct: Cell,
    next_report: String,
}

struct BuyRow {
    name: String,
    date: String,
    quantity: String,
    price: String,
    fee: String,
    total_cost: String,
}

struct RealizedView {
    symbol: String,
    date: String,
    quantity: String,
    proceeds: String,
    cost: String,
    fee: String,
    net: Cell,
}

struct SignalRow {
    symbol: String,
    price: String,
    pnl: Option<Cell>,
    sentiment: String,
    action: String,
    background: &'static str,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    as_of: String,
    metrics: Vec<Metric>,
    positions: Vec<PositionRow>,
    buy_log: Vec<BuyRow>,
    realized: Vec<RealizedView>,
    realized_total: Cell,
    signals: Vec<SignalRow>,
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &PortfolioReport) -> Result<String, FolioError> {
        let v = report.valuation;
        let template = ReportTemplate {
            title: report.title,
            as_of: report.as_of.format("%d.%m.%Y").to_string(),
            metrics: snapshot_metrics(v),
            positions: v.positions.iter().map(position_row).collect(),
            buy_log: v.buy_log.iter().map(buy_row).collect(),
            realized: v.realized.rows.iter().map(realized_row).collect(),
            realized_total: Cell::money(v.realized.net_pnl, Currency::Usd),
            signals: report.signals.iter().map(signal_row).collect(),
        };

        template.render().map_err(|e| FolioError::Report {
            reason: format!("failed to render HTML report: {}", e),
        })
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_error(path: &str, e: std::io::Error) -> FolioError {
    FolioError::Report {
        reason: format!("failed to write {}: {}", path, e),
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, report: &PortfolioReport, output_path: &str) -> Result<(), FolioError> {
        let html = self.render(report)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(output_path, e))?;
        }
        fs::write(path, html).map_err(|e| write_error(output_path, e))?;
        Ok(())
    }
}

fn format_quantity(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{}", q as i64)
    } else {
        format!("{:.4}", q)
    }
}

fn snapshot_metrics(v: &PortfolioValuation) -> Vec<Metric> {
    let profit = Cell::money(v.net_profit_usd, Currency::Usd);
    vec![
        Metric {
            label: "Net Worth ($)",
            value: format_money(v.net_worth_usd, Currency::Usd),
            color: "",
            note: String::new(),
        },
        Metric {
            label: "Net Worth (₪)",
            value: format_money(v.net_worth_ils, Currency::Ils),
            color: "",
            note: format!("Rate: {:.2}", v.fx.usd_ils),
        },
        Metric {
            label: "Liquid Cash ($)",
            value: format_money(v.cash.usd, Currency::Usd),
            color: "",
            note: format!("₪ cash: {}", format_money(v.cash.ils, Currency::Ils)),
        },
        Metric {
            label: "Total Net Profit",
            value: profit.text,
            color: profit.color,
            note: format!(
                "Lifetime fees: {}",
                format_money(v.lifetime_fees_usd, Currency::Usd)
            ),
        },
    ]
}

fn position_row(p: &PositionValuation) -> PositionRow {
    let source = match p.source {
        QuoteSource::Live => String::new(),
        other => other.to_string(),
    };
    PositionRow {
        name: p.display_name.clone(),
        quantity: format_quantity(p.quantity),
        price: format_money(p.last_price, p.currency),
        source,
        day_change: Cell::money(p.day_change, p.currency),
        day_pct: Cell::pct(p.day_change_pct),
        avg_cost: format_money(p.buy_price, p.currency),
        value: format_money(p.market_value, p.currency),
        pnl: Cell::money(p.total_pnl, p.currency),
        pnl_pct: Cell::pct(p.total_pnl_pct),
        next_report: p.next_report.clone(),
    }
}

fn buy_row(r: &BuyLogRow) -> BuyRow {
    BuyRow {
        name: r.display_name.clone(),
        date: r.date.format("%d.%m.%Y").to_string(),
        quantity: format_quantity(r.quantity),
        price: format_money(r.price, r.currency),
        fee: group_thousands(r.fee),
        total_cost: format_money(r.total_cost, r.currency),
    }
}

fn realized_row(r: &RealizedRow) -> RealizedView {
    RealizedView {
        symbol: r.symbol.clone(),
        date: r.date.format("%d.%m.%Y").to_string(),
        quantity: format_quantity(r.quantity),
        proceeds: format_money(r.proceeds, Currency::Usd),
        cost: format_money(r.cost, Currency::Usd),
        fee: format_money(r.fee, Currency::Usd),
        net: Cell::money(r.net_pnl, Currency::Usd),
    }
}

/// Holdings shade by P/L sign; watchlist rows are yellow only for hot news.
fn signal_background(s: &Signal) -> &'static str {
    match s.pnl_pct {
        Some(p) if p > 0.0 => "#e6ffe6",
        Some(_) => "#ffe6e6",
        None if s.action == Action::HotNews => "#ffffcc",
        None => "#ffffff",
    }
}

fn signal_row(s: &Signal) -> SignalRow {
    SignalRow {
        symbol: s.symbol.clone(),
        price: group_thousands(s.price),
        pnl: s.pnl_pct.map(Cell::pct),
        sentiment: format!("{:.2}", s.sentiment),
        action: s.action.to_string(),
        background: signal_background(s),
    }
}
