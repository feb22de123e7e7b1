//! CSV export of the live-assets table.

use std::fs;
use std::path::Path;

use crate::domain::error::FolioError;
use crate::ports::report_port::{PortfolioReport, ReportPort};

pub const HEADER: &[&str] = &[
    "symbol",
    "name",
    "quantity",
    "currency",
    "price",
    "previous_close",
    "avg_cost",
    "market_value",
    "total_pnl",
    "total_pnl_pct",
    "day_change",
    "day_change_pct",
    "market_value_usd",
    "source",
    "action",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &PortfolioReport) -> Result<String, FolioError> {
        let report_err = |e: csv::Error| FolioError::Report {
            reason: format!("CSV write error: {}", e),
        };

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(HEADER).map_err(report_err)?;

        for p in &report.valuation.positions {
            let action = report
                .signals
                .iter()
                .find(|s| s.symbol == p.symbol)
                .map(|s| s.action.to_string())
                .unwrap_or_default();
            wtr.write_record([
                p.symbol.clone(),
                p.display_name.clone(),
                p.quantity.to_string(),
                p.currency.to_string(),
                format!("{:.4}", p.last_price),
                format!("{:.4}", p.previous_close),
                format!("{:.4}", p.buy_price),
                format!("{:.2}", p.market_value),
                format!("{:.2}", p.total_pnl),
                format!("{:.2}", p.total_pnl_pct),
                format!("{:.2}", p.day_change),
                format!("{:.2}", p.day_change_pct),
                format!("{:.2}", p.market_value_usd),
                p.source.to_string(),
                action,
            ])
            .map_err(report_err)?;
        }

        let bytes = wtr.into_inner().map_err(|e| FolioError::Report {
            reason: format!("CSV flush error: {}", e),
        })?;
        String::from_utf8(bytes).map_err(|e| FolioError::Report {
            reason: e.to_string(),
        })
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_error(path: &str, e: std::io::Error) -> FolioError {
    FolioError::Report {
        reason: format!("failed to write {}: {}", path, e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &PortfolioReport, output_path: &str) -> Result<(), FolioError> {
        let content = self.render(report)?;
        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(output_path, e))?;
        }
        fs::write(path, content).map_err(|e| write_error(output_path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::{Currency, FxRate};
    use crate::domain::holding::Holding;
    use crate::domain::ledger::Ledger;
    use crate::domain::quote::Quote;
    use crate::domain::signal::{Action, Signal};
    use crate::domain::valuation::{PortfolioValuation, ValuationInput, value_portfolio};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn valuation() -> PortfolioValuation {
        let ledger = Ledger {
            holdings: vec![Holding {
                symbol: "SMH".into(),
                name: Some("VanEck, Semis".into()),
                quantity: 11.0,
                buy_price: 400.0,
                date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
                fee: 7.0,
                currency: Currency::Usd,
            }],
            ..Default::default()
        };
        let quotes: HashMap<String, Quote> = [("SMH".to_string(), Quote::live("SMH", 420.0, 410.0))]
            .into_iter()
            .collect();
        value_portfolio(&ValuationInput {
            ledger: &ledger,
            quotes: &quotes,
            manual_prices: &HashMap::new(),
            earnings: &HashMap::new(),
            fx: FxRate::default(),
            default_sale_fee: 14.0,
        })
    }

    #[test]
    fn render_writes_header_and_rows() {
        let v = valuation();
        let signals = vec![Signal {
            symbol: "SMH".into(),
            price: 420.0,
            pnl_pct: Some(5.0),
            sentiment: 0.0,
            action: Action::Hold,
        }];
        let report = PortfolioReport {
            title: "t",
            as_of: NaiveDate::from_ymd_opt(2026, 2, 13).unwrap(),
            valuation: &v,
            signals: &signals,
        };
        let out = CsvReportAdapter::new().render(&report).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("SMH,\"VanEck, Semis\",11,USD,420.0000"));
        assert!(row.contains(",220.00,5.00,"));
        assert!(row.ends_with(",live,HOLD"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn write_to_nested_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/report.csv");
        let v = valuation();
        let report = PortfolioReport {
            title: "t",
            as_of: NaiveDate::from_ymd_opt(2026, 2, 13).unwrap(),
            valuation: &v,
            signals: &[],
        };
        CsvReportAdapter::new()
            .write(&report, path.to_str().unwrap())
            .unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("SMH"));
    }
}
