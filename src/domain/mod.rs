//! Core domain types and logic.

pub mod config_validation;
pub mod currency;
pub mod error;
pub mod holding;
pub mod indicator;
pub mod ledger;
pub mod market;
pub mod quote;
pub mod signal;
pub mod valuation;
