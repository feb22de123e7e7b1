//! Configuration validation.
//!
//! Validates all config fields before any quote is fetched.

use crate::domain::error::FolioError;
use crate::ports::config_port::ConfigPort;

pub const PROVIDERS: &[&str] = &["yahoo", "csv"];
pub const REPORT_FORMATS: &[&str] = &["html", "csv"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FolioError> {
    validate_ledger_paths(config)?;
    validate_cash(config)?;
    validate_fees(config)?;
    validate_fx(config)?;
    validate_quotes(config)?;
    validate_manual_prices(config)?;
    validate_signals(config)?;
    validate_report(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> FolioError {
    FolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_ledger_paths(config: &dyn ConfigPort) -> Result<(), FolioError> {
    match config.get_string("ledger", "holdings") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FolioError::ConfigMissing {
            section: "ledger".to_string(),
            key: "holdings".to_string(),
        }),
    }
}

/// Cash balances may be negative (margin), but must be numbers when present.
fn validate_cash(config: &dyn ConfigPort) -> Result<(), FolioError> {
    for key in ["usd", "ils"] {
        if let Some(raw) = config.get_string("cash", key) {
            if raw.trim().parse::<f64>().map(|v| !v.is_finite()).unwrap_or(true) {
                return Err(invalid("cash", key, format!("'{}' is not a number", raw)));
            }
        }
    }
    Ok(())
}

fn validate_fees(config: &dyn ConfigPort) -> Result<(), FolioError> {
    let commission = config.get_double("fees", "commission", 0.0);
    if !commission.is_finite() || commission < 0.0 {
        return Err(invalid("fees", "commission", "commission must be non-negative"));
    }
    let round_trip = config.get_double("fees", "round_trip", 0.0);
    if !round_trip.is_finite() || round_trip < 0.0 {
        return Err(invalid("fees", "round_trip", "round_trip must be non-negative"));
    }
    Ok(())
}

fn validate_fx(config: &dyn ConfigPort) -> Result<(), FolioError> {
    let value = config.get_double("fx", "fallback_usd_ils", 1.0);
    if value <= 0.0 {
        return Err(invalid(
            "fx",
            "fallback_usd_ils",
            "fallback_usd_ils must be positive",
        ));
    }
    Ok(())
}

fn validate_quotes(config: &dyn ConfigPort) -> Result<(), FolioError> {
    let provider = config
        .get_string("quotes", "provider")
        .unwrap_or_else(|| "yahoo".to_string())
        .to_lowercase();
    if !PROVIDERS.contains(&provider.as_str()) {
        return Err(invalid(
            "quotes",
            "provider",
            format!("unknown provider '{}', expected one of {}", provider, PROVIDERS.join(", ")),
        ));
    }
    if provider == "csv" {
        match config.get_string("quotes", "csv_path") {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(FolioError::ConfigMissing {
                    section: "quotes".to_string(),
                    key: "csv_path".to_string(),
                });
            }
        }
    }
    if config.get_int("quotes", "timeout_secs", 10) <= 0 {
        return Err(invalid("quotes", "timeout_secs", "timeout_secs must be positive"));
    }
    let history_days = config.get_int("quotes", "history_days", 365);
    if history_days <= 0 || u32::try_from(history_days).is_err() {
        return Err(invalid("quotes", "history_days", "history_days must be positive and fit in 32 bits"));
    }
    Ok(())
}

fn validate_manual_prices(config: &dyn ConfigPort) -> Result<(), FolioError> {
    for (symbol, raw) in config.get_section("manual_prices") {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => {}
            _ => {
                return Err(invalid(
                    "manual_prices",
                    &symbol,
                    format!("'{}' is not a finite non-negative price", raw),
                ));
            }
        }
    }
    for (symbol, raw) in config.get_section("sentiment") {
        match raw.trim().parse::<f64>() {
            Ok(v) if (-1.0..=1.0).contains(&v) => {}
            _ => {
                return Err(invalid(
                    "sentiment",
                    &symbol,
                    "sentiment must be between -1 and 1",
                ));
            }
        }
    }
    Ok(())
}

fn validate_signals(config: &dyn ConfigPort) -> Result<(), FolioError> {
    let take_profit = config.get_double("signals", "take_profit_pct", 15.0);
    let buy_dip = config.get_double("signals", "buy_dip_pct", -5.0);
    if take_profit <= buy_dip {
        return Err(invalid(
            "signals",
            "take_profit_pct",
            "take_profit_pct must be greater than buy_dip_pct",
        ));
    }
    let fast = config.get_int("signals", "fast_sma", 50);
    let slow = config.get_int("signals", "slow_sma", 200);
    if fast < 1 {
        return Err(invalid("signals", "fast_sma", "fast_sma must be at least 1"));
    }
    if fast >= slow {
        return Err(invalid(
            "signals",
            "slow_sma",
            "slow_sma must be greater than fast_sma",
        ));
    }
    Ok(())
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), FolioError> {
    if let Some(format) = config.get_string("report", "format") {
        if !REPORT_FORMATS.contains(&format.to_lowercase().as_str()) {
            return Err(invalid(
                "report",
                "format",
                format!("unknown format '{}'", format),
            ));
        }
    }
    Ok(())
}
