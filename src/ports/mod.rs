//! Port traits implemented by the adapters.

pub mod config_port;
pub mod ledger_port;
pub mod quote_port;
pub mod report_port;
