//! CSV ledger adapter.
//!
//! Holdings: `symbol,name,quantity,buy_price,date,fee,currency`.
//! Sales: `symbol,quantity,sell_price,buy_price,date,fee_total`.
//! Empty `name`, `fee`, `currency` and `fee_total` cells are allowed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::currency::Currency;
use crate::domain::error::FolioError;
use crate::domain::holding::{Holding, Sale};
use crate::domain::ledger::{CashBalances, Ledger};
use crate::ports::ledger_port::LedgerPort;

#[derive(Debug, Deserialize)]
struct HoldingRow {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    quantity: f64,
    buy_price: f64,
    date: String,
    #[serde(default)]
    fee: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    symbol: String,
    quantity: f64,
    sell_price: f64,
    buy_price: f64,
    date: String,
    #[serde(default)]
    fee_total: Option<f64>,
}

pub struct CsvLedgerAdapter {
    holdings_path: PathBuf,
    sales_path: Option<PathBuf>,
    watchlist: Vec<String>,
    cash: CashBalances,
}

impl CsvLedgerAdapter {
    pub fn new(holdings_path: PathBuf) -> Self {
        Self {
            holdings_path,
            sales_path: None,
            watchlist: Vec::new(),
            cash: CashBalances::default(),
        }
    }

    pub fn with_sales(mut self, sales_path: PathBuf) -> Self {
        self.sales_path = Some(sales_path);
        self
    }

    pub fn with_watchlist(mut self, watchlist: Vec<String>) -> Self {
        self.watchlist = watchlist;
        self
    }

    pub fn with_cash(mut self, cash: CashBalances) -> Self {
        self.cash = cash;
        self
    }

    fn read_holdings(&self) -> Result<Vec<Holding>, FolioError> {
        let content = read_file(&self.holdings_path)?;
        parse_holdings(&content, &self.holdings_path.display().to_string())
    }

    fn read_sales(&self) -> Result<Vec<Sale>, FolioError> {
        match &self.sales_path {
            Some(path) => parse_sales(&read_file(path)?, &path.display().to_string()),
            None => Ok(Vec::new()),
        }
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn load(&self) -> Result<Ledger, FolioError> {
        let ledger = Ledger {
            holdings: self.read_holdings()?,
            sales: self.read_sales()?,
            watchlist: self.watchlist.clone(),
            cash: self.cash,
        };
        log::debug!(
            "loaded ledger: {} holdings, {} sales, {} watchlist symbols",
            ledger.holdings.len(),
            ledger.sales.len(),
            ledger.watchlist.len()
        );
        Ok(ledger)
    }
}

fn read_file(path: &Path) -> Result<String, FolioError> {
    fs::read_to_string(path).map_err(|e| FolioError::Ledger {
        source_name: path.display().to_string(),
        reason: format!("failed to read: {}", e),
    })
}

/// Accepts `DD.MM.YYYY` and `YYYY-MM-DD`.
pub fn parse_ledger_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes())
}

pub fn parse_holdings(content: &str, source_name: &str) -> Result<Vec<Holding>, FolioError> {
    let ledger_err = |line: usize, reason: String| FolioError::Ledger {
        source_name: source_name.to_string(),
        reason: format!("row {}: {}", line, reason),
    };

    let mut holdings = Vec::new();
    for (i, result) in reader(content).deserialize::<HoldingRow>().enumerate() {
        let row = result.map_err(|e| ledger_err(i + 1, e.to_string()))?;
        let date = parse_ledger_date(&row.date)
            .ok_or_else(|| ledger_err(i + 1, format!("invalid date '{}'", row.date)))?;
        let currency = row
            .currency
            .as_deref()
            .unwrap_or("")
            .parse::<Currency>()
            .map_err(|e| ledger_err(i + 1, e))?;

        holdings.push(Holding {
            symbol: row.symbol.to_uppercase(),
            name: row.name.filter(|n| !n.is_empty()),
            quantity: row.quantity,
            buy_price: row.buy_price,
            date,
            fee: row.fee.unwrap_or(0.0),
            currency,
        });
    }
    Ok(holdings)
}

pub fn parse_sales(content: &str, source_name: &str) -> Result<Vec<Sale>, FolioError> {
    let ledger_err = |line: usize, reason: String| FolioError::Ledger {
        source_name: source_name.to_string(),
        reason: format!("row {}: {}", line, reason),
    };

    let mut sales = Vec::new();
    for (i, result) in reader(content).deserialize::<SaleRow>().enumerate() {
        let row = result.map_err(|e| ledger_err(i + 1, e.to_string()))?;
        let date = parse_ledger_date(&row.date)
            .ok_or_else(|| ledger_err(i + 1, format!("invalid date '{}'", row.date)))?;
        sales.push(Sale {
            symbol: row.symbol.to_uppercase(),
            quantity: row.quantity,
            sell_price: row.sell_price,
            buy_price: row.buy_price,
            date,
            fee_total: row.fee_total,
        });
    }
    sales.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(sales)
}
