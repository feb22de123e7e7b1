#![allow(dead_code)]

use chrono::NaiveDate;
use folio::domain::currency::Currency;
use folio::domain::error::FolioError;
use folio::domain::holding::{Holding, Sale};
use folio::domain::ledger::{CashBalances, Ledger};
use folio::domain::quote::Quote;
use folio::ports::ledger_port::LedgerPort;
use folio::ports::quote_port::QuotePort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockQuotePort {
    pub quotes: HashMap<String, Quote>,
    pub errors: HashMap<String, String>,
    pub closes: HashMap<String, Vec<f64>>,
    pub fx: Option<f64>,
    pub requested: RefCell<Vec<String>>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            errors: HashMap::new(),
            closes: HashMap::new(),
            fx: None,
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn with_quote(mut self, symbol: &str, last: f64, previous_close: f64) -> Self {
        self.quotes
            .insert(symbol.to_string(), Quote::live(symbol, last, previous_close));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(symbol.to_string(), closes);
        self
    }

    pub fn with_fx(mut self, rate: f64) -> Self {
        self.fx = Some(rate);
        self
    }
}

impl QuotePort for MockQuotePort {
    fn fetch_quote(&self, symbol: &str) -> Result<Quote, FolioError> {
        self.requested.borrow_mut().push(symbol.to_string());
        if let Some(reason) = self.errors.get(symbol) {
            return Err(FolioError::Quote {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        self.quotes.get(symbol).cloned().ok_or_else(|| FolioError::Quote {
            symbol: symbol.to_string(),
            reason: "unknown symbol".into(),
        })
    }

    fn fetch_fx_rate(&self, pair: &str) -> Result<f64, FolioError> {
        self.fx.ok_or_else(|| FolioError::Quote {
            symbol: pair.to_string(),
            reason: "fx unavailable".into(),
        })
    }

    fn fetch_closes(&self, symbol: &str, _days: u32) -> Result<Vec<f64>, FolioError> {
        self.closes.get(symbol).cloned().ok_or_else(|| FolioError::Quote {
            symbol: symbol.to_string(),
            reason: "no history".into(),
        })
    }
}

pub struct MockLedgerPort {
    pub result: Result<Ledger, String>,
}

impl LedgerPort for MockLedgerPort {
    fn load(&self) -> Result<Ledger, FolioError> {
        self.result.clone().map_err(|reason| FolioError::Ledger {
            source_name: "mock".into(),
            reason,
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn usd_holding(symbol: &str, quantity: f64, buy_price: f64, fee: f64) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        name: None,
        quantity,
        buy_price,
        date: date(2026, 1, 15),
        fee,
        currency: Currency::Usd,
    }
}

/// Tel Aviv listing; `buy_price_agorot` is in agorot as the broker reports it.
pub fn ils_holding(symbol: &str, quantity: f64, buy_price_agorot: f64) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        name: None,
        quantity,
        buy_price: buy_price_agorot,
        date: date(2026, 1, 20),
        fee: 0.0,
        currency: Currency::Ils,
    }
}

pub fn sale(symbol: &str, quantity: f64, sell: f64, buy: f64, fee_total: Option<f64>) -> Sale {
    Sale {
        symbol: symbol.to_string(),
        quantity,
        sell_price: sell,
        buy_price: buy,
        date: date(2026, 2, 1),
        fee_total,
    }
}

/// Two US holdings, one TASE holding, two closed trades and some cash.
pub fn sample_ledger() -> Ledger {
    Ledger {
        holdings: vec![
            usd_holding("SMH", 11.0, 400.0, 7.0),
            usd_holding("PESI", 100.0, 12.0, 7.0),
            ils_holding("YELN-F5.TA", 50.0, 10_000.0),
        ],
        sales: vec![
            sale("DIS", 40.0, 107.52, 105.0, Some(14.0)),
            sale("AMTM", 20.0, 25.0, 30.0, None),
        ],
        watchlist: vec!["NVDA".to_string()],
        cash: CashBalances {
            usd: 1_000.0,
            ils: 3_650.0,
        },
    }
}
