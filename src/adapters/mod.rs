//! Concrete adapter implementations for ports.

pub mod csv_ledger_adapter;
pub mod csv_quote_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod html_report_adapter;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
