//! Report generation port trait.

use crate::domain::error::FolioError;
use crate::domain::signal::Signal;
use crate::domain::valuation::PortfolioValuation;

/// Everything a report renders.
pub struct PortfolioReport<'a> {
    pub title: &'a str,
    pub as_of: chrono::NaiveDate,
    pub valuation: &'a PortfolioValuation,
    pub signals: &'a [Signal],
}

/// Port for writing portfolio reports.
pub trait ReportPort {
    fn write(&self, report: &PortfolioReport, output_path: &str) -> Result<(), FolioError>;
}
