//! Offline quote adapter backed by CSV files.
//!
//! The price file holds `symbol,last,previous_close`; FX pairs such as
//! `ILS=X` are ordinary rows. Close history for a symbol lives in
//! `<history_dir>/<SYMBOL>.csv` as `date,close`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::error::FolioError;
use crate::domain::quote::Quote;
use crate::ports::quote_port::QuotePort;

#[derive(Debug)]
pub struct CsvQuoteAdapter {
    prices: HashMap<String, (f64, f64)>,
    history_dir: Option<PathBuf>,
}

impl CsvQuoteAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FolioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FolioError::Quote {
            symbol: "*".into(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_string(&content)
    }

    pub fn from_string(content: &str) -> Result<Self, FolioError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut prices = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FolioError::Quote {
                symbol: "*".into(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let symbol = record
                .get(0)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| FolioError::Quote {
                    symbol: "*".into(),
                    reason: "missing symbol column".into(),
                })?
                .to_uppercase();

            let last = parse_price(&symbol, record.get(1), "last")?;
            let previous_close = match record.get(2) {
                Some(s) if !s.is_empty() => parse_price(&symbol, Some(s), "previous_close")?,
                _ => last,
            };
            prices.insert(symbol, (last, previous_close));
        }

        Ok(Self {
            prices,
            history_dir: None,
        })
    }

    pub fn with_history_dir(mut self, dir: PathBuf) -> Self {
        self.history_dir = Some(dir);
        self
    }

    fn lookup(&self, symbol: &str) -> Result<(f64, f64), FolioError> {
        self.prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| FolioError::Quote {
                symbol: symbol.to_string(),
                reason: "no price in CSV".into(),
            })
    }
}

fn parse_price(symbol: &str, value: Option<&str>, column: &str) -> Result<f64, FolioError> {
    value
        .ok_or_else(|| FolioError::Quote {
            symbol: symbol.to_string(),
            reason: format!("missing {} column", column),
        })?
        .parse()
        .map_err(|e| FolioError::Quote {
            symbol: symbol.to_string(),
            reason: format!("invalid {} value: {}", column, e),
        })
}

impl QuotePort for CsvQuoteAdapter {
    fn fetch_quote(&self, symbol: &str) -> Result<Quote, FolioError> {
        let (last, previous_close) = self.lookup(symbol)?;
        Ok(Quote::live(symbol, last, previous_close))
    }

    fn fetch_fx_rate(&self, pair: &str) -> Result<f64, FolioError> {
        self.lookup(pair).map(|(last, _)| last)
    }

    fn fetch_closes(&self, symbol: &str, days: u32) -> Result<Vec<f64>, FolioError> {
        let dir = self.history_dir.as_ref().ok_or_else(|| FolioError::Quote {
            symbol: symbol.to_string(),
            reason: "no history directory configured".into(),
        })?;
        let path = dir.join(format!("{}.csv", symbol.to_uppercase()));
        let content = fs::read_to_string(&path).map_err(|e| FolioError::Quote {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| FolioError::Quote {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;
            let date_str = record.get(0).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                FolioError::Quote {
                    symbol: symbol.to_string(),
                    reason: format!("invalid date format: {}", e),
                }
            })?;
            let close = parse_price(symbol, record.get(1), "close")?;
            rows.push((date, close));
        }
        rows.sort_by_key(|(d, _)| *d);

        if let Some(&(latest, _)) = rows.last() {
            let cutoff = latest - chrono::Duration::days(i64::from(days));
            rows.retain(|(d, _)| *d > cutoff);
        }
        Ok(rows.into_iter().map(|(_, c)| c).collect())
    }
}
