//! Currencies and USD/ILS conversion.

use std::fmt;
use std::str::FromStr;

/// USD/ILS rate used when no live rate is available.
pub const DEFAULT_USD_ILS: f64 = 3.65;

/// Yahoo-style ticker for the USD/ILS spot rate.
pub const USD_ILS_PAIR: &str = "ILS=X";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    Usd,
    Ils,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Ils => "₪",
        }
    }

    /// Tel Aviv prices are quoted in agorot; everything else in major units.
    pub fn to_major(&self, minor: f64) -> f64 {
        match self {
            Currency::Usd => minor,
            Currency::Ils => minor / 100.0,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Ils => write!(f, "ILS"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" | "USD" => Ok(Currency::Usd),
            "ILS" | "NIS" => Ok(Currency::Ils),
            other => Err(format!("unsupported currency '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxRate {
    pub usd_ils: f64,
}

impl FxRate {
    /// Returns `None` for a non-positive or non-finite rate.
    pub fn new(usd_ils: f64) -> Option<Self> {
        if usd_ils.is_finite() && usd_ils > 0.0 {
            Some(Self { usd_ils })
        } else {
            None
        }
    }

    pub fn to_usd(&self, amount: f64, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => amount,
            Currency::Ils => amount / self.usd_ils,
        }
    }

    pub fn usd_to_ils(&self, amount_usd: f64) -> f64 {
        amount_usd * self.usd_ils
    }
}

impl Default for FxRate {
    fn default() -> Self {
        Self {
            usd_ils: DEFAULT_USD_ILS,
        }
    }
}

/// Format an amount with thousands separators and two decimals, e.g. `$1,234.50`.
pub fn format_money(amount: f64, currency: Currency) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, currency.symbol(), group_thousands(amount.abs()))
}

pub fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    format!("{}.{}", grouped, frac_part)
}
