//! Ledger source port trait.

use crate::domain::error::FolioError;
use crate::domain::ledger::Ledger;

pub trait LedgerPort {
    fn load(&self) -> Result<Ledger, FolioError>;
}
