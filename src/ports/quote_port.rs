//! Market data port trait.

use crate::domain::error::FolioError;
use crate::domain::quote::Quote;

pub trait QuotePort {
    /// Latest price and previous close in the instrument's quote unit.
    fn fetch_quote(&self, symbol: &str) -> Result<Quote, FolioError>;

    /// Spot rate for a currency pair ticker such as `ILS=X`.
    fn fetch_fx_rate(&self, pair: &str) -> Result<f64, FolioError>;

    /// Daily closes covering roughly the last `days` calendar days, oldest first.
    fn fetch_closes(&self, symbol: &str, days: u32) -> Result<Vec<f64>, FolioError>;
}
