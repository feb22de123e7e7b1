//! Integration tests for the valuation pipeline.
//!
//! Tests cover:
//! - Snapshot -> valuation -> signals with MockQuotePort
//! - Fallback pricing when quotes or the FX rate are unavailable
//! - Manual price overrides
//! - Report rendering from a full valuation
//! - Portfolio invariants (property-based)

mod common;

use approx::assert_relative_eq;
use common::*;
use folio::adapters::csv_report_adapter::CsvReportAdapter;
use folio::adapters::html_report_adapter::HtmlReportAdapter;
use folio::domain::currency::{Currency, FxRate};
use folio::domain::ledger::{CashBalances, Ledger};
use folio::domain::market::{collect_signals, fetch_snapshot};
use folio::domain::quote::QuoteSource;
use folio::domain::signal::{Action, SignalThresholds};
use folio::domain::valuation::{PortfolioValuation, ValuationInput, value_portfolio};
use folio::ports::report_port::PortfolioReport;
use std::collections::HashMap;

fn value_with(
    port: &MockQuotePort,
    ledger: &Ledger,
    manual: &HashMap<String, f64>,
) -> PortfolioValuation {
    let snapshot = fetch_snapshot(port, ledger, manual, "ILS=X", FxRate::default());
    value_portfolio(&ValuationInput {
        ledger,
        quotes: &snapshot.quotes,
        manual_prices: manual,
        earnings: &HashMap::new(),
        fx: snapshot.fx,
        default_sale_fee: 14.0,
    })
}

fn sample_port() -> MockQuotePort {
    MockQuotePort::new()
        .with_quote("SMH", 420.0, 410.0)
        .with_error("PESI", "rate limited")
        .with_quote("YELN-F5.TA", 11_000.0, 10_900.0)
        .with_fx(3.65)
}

mod pipeline {
    use super::*;

    #[test]
    fn full_pipeline_with_mock_quote_port() {
        let ledger = sample_ledger();
        let v = value_with(&sample_port(), &ledger, &HashMap::new());

        assert_eq!(v.positions.len(), 3);
        assert_relative_eq!(v.fx.usd_ils, 3.65);

        let smh = &v.positions[0];
        assert_eq!(smh.source, QuoteSource::Live);
        assert_relative_eq!(smh.market_value, 4_620.0);
        assert_relative_eq!(smh.total_pnl, 220.0);
        assert_relative_eq!(smh.total_pnl_pct, 5.0);
        assert_relative_eq!(smh.day_change, 110.0);

        let pesi = &v.positions[1];
        assert_eq!(pesi.source, QuoteSource::Fallback);
        assert_relative_eq!(pesi.market_value, 1_200.0);
        assert_relative_eq!(pesi.total_pnl, 0.0);

        let yeln = &v.positions[2];
        assert_eq!(yeln.currency, Currency::Ils);
        assert_relative_eq!(yeln.last_price, 110.0);
        assert_relative_eq!(yeln.previous_close, 109.0);
        assert_relative_eq!(yeln.market_value, 5_500.0);
        assert_relative_eq!(yeln.total_pnl, 500.0);
        assert_relative_eq!(yeln.market_value_usd, 5_500.0 / 3.65, epsilon = 1e-9);
    }

    #[test]
    fn account_totals() {
        let v = value_with(&sample_port(), &sample_ledger(), &HashMap::new());

        let mv = 4_620.0 + 1_200.0 + 5_500.0 / 3.65;
        assert_relative_eq!(v.market_value_usd, mv, epsilon = 1e-9);
        assert_relative_eq!(v.cash_usd_equivalent(), 2_000.0, epsilon = 1e-9);
        assert_relative_eq!(v.net_worth_usd, mv + 2_000.0, epsilon = 1e-9);
        assert_relative_eq!(v.net_worth_ils, (mv + 2_000.0) * 3.65, epsilon = 1e-6);

        assert_relative_eq!(v.realized.net_pnl, 86.8 - 114.0, epsilon = 1e-9);
        assert_relative_eq!(v.realized.fees_paid, 28.0);
        assert_eq!(v.realized.winners(), 1);
        assert_relative_eq!(v.open_fees_usd, 14.0);
        assert_relative_eq!(v.lifetime_fees_usd, 42.0);

        let unrealized = 220.0 + 500.0 / 3.65;
        assert_relative_eq!(v.unrealized_pnl_usd, unrealized, epsilon = 1e-9);
        assert_relative_eq!(
            v.net_profit_usd,
            unrealized + (86.8 - 114.0) - 14.0,
            epsilon = 1e-9
        );
        assert_eq!(v.fallback_count(), 1);
    }

    #[test]
    fn fx_failure_uses_fallback_rate() {
        let port = MockQuotePort::new().with_quote("SMH", 420.0, 410.0);
        let ledger = Ledger {
            holdings: vec![usd_holding("SMH", 1.0, 400.0, 0.0)],
            cash: CashBalances { usd: 0.0, ils: 365.0 },
            ..Default::default()
        };
        let snapshot = fetch_snapshot(&port, &ledger, &HashMap::new(), "ILS=X", FxRate::default());
        assert!(!snapshot.fx_is_live);
        assert_eq!(snapshot.failures.len(), 1);

        let v = value_with(&port, &ledger, &HashMap::new());
        assert_relative_eq!(v.fx.usd_ils, 3.65);
        assert_relative_eq!(v.net_worth_usd, 520.0, epsilon = 1e-9);
    }

    #[test]
    fn manual_price_overrides_and_skips_fetch() {
        let port = sample_port();
        let manual: HashMap<String, f64> = [("YELN-F5.TA".to_string(), 12_000.0)].into_iter().collect();
        let v = value_with(&port, &sample_ledger(), &manual);

        assert!(!port.requested.borrow().contains(&"YELN-F5.TA".to_string()));
        let yeln = &v.positions[2];
        assert_eq!(yeln.source, QuoteSource::Manual);
        assert_relative_eq!(yeln.last_price, 120.0);
        assert_relative_eq!(yeln.day_change, 0.0);
    }

    #[test]
    fn zero_manual_price_is_ignored() {
        let port = sample_port();
        let manual: HashMap<String, f64> = [("SMH".to_string(), 0.0)].into_iter().collect();
        let v = value_with(&port, &sample_ledger(), &manual);
        assert_eq!(v.positions[0].source, QuoteSource::Live);
        assert_relative_eq!(v.positions[0].last_price, 420.0);
    }

    #[test]
    fn empty_portfolio_still_reports_realized() {
        let ledger = Ledger {
            sales: vec![sale("DIS", 40.0, 107.52, 105.0, Some(14.0))],
            ..Default::default()
        };
        let v = value_with(&MockQuotePort::new().with_fx(3.7), &ledger, &HashMap::new());
        assert!(v.positions.is_empty());
        assert_relative_eq!(v.market_value_usd, 0.0);
        assert_relative_eq!(v.realized.net_pnl, 86.8, epsilon = 1e-9);
        assert_relative_eq!(v.net_profit_usd, 86.8, epsilon = 1e-9);
    }
}

mod signals {
    use super::*;

    #[test]
    fn holdings_and_watchlist_signals() {
        let port = MockQuotePort::new()
            .with_quote("SMH", 470.0, 460.0)
            .with_quote("PESI", 11.0, 11.5)
            .with_quote("YELN-F5.TA", 10_100.0, 10_000.0)
            .with_closes("NVDA", vec![5.0, 4.0, 3.0, 2.0])
            .with_fx(3.65);
        let ledger = sample_ledger();
        let v = value_with(&port, &ledger, &HashMap::new());

        let sentiment: HashMap<String, f64> = [("PESI".to_string(), 0.4)].into_iter().collect();
        let thresholds = SignalThresholds {
            fast_sma: 2,
            slow_sma: 4,
            ..Default::default()
        };
        let (signals, failures) =
            collect_signals(&port, &v, &ledger.watchlist, &sentiment, &thresholds, 30);

        assert!(failures.is_empty());
        let actions: Vec<(&str, Action)> = signals
            .iter()
            .map(|s| (s.symbol.as_str(), s.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("SMH", Action::TakeProfit),
                ("PESI", Action::BuyDip),
                ("YELN-F5.TA", Action::Hold),
                ("NVDA", Action::Watch),
            ]
        );
    }

    #[test]
    fn hot_news_beats_trend_on_watchlist() {
        let port = MockQuotePort::new().with_closes("NVDA", vec![5.0, 4.0, 3.0, 2.0]);
        let v = value_with(&port, &Ledger::default(), &HashMap::new());
        let sentiment: HashMap<String, f64> = [("NVDA".to_string(), 0.9)].into_iter().collect();
        let thresholds = SignalThresholds {
            fast_sma: 2,
            slow_sma: 4,
            ..Default::default()
        };
        let (signals, _) = collect_signals(
            &port,
            &v,
            &["NVDA".to_string()],
            &sentiment,
            &thresholds,
            30,
        );
        assert_eq!(signals[0].action, Action::HotNews);
        assert_eq!(signals[0].pnl_pct, None);
    }
}

mod reports {
    use super::*;
    use folio::ports::report_port::ReportPort;

    #[test]
    fn html_report_from_full_valuation() {
        let v = value_with(&sample_port(), &sample_ledger(), &HashMap::new());
        let report = PortfolioReport {
            title: "My Global Portfolio",
            as_of: date(2026, 2, 13),
            valuation: &v,
            signals: &[],
        };
        let html = HtmlReportAdapter::new().render(&report).unwrap();
        assert!(html.contains("My Global Portfolio"));
        assert!(html.contains("SMH"));
        assert!(html.contains("YELN-F5 (IL)"));
        assert!(html.contains("DIS"));
    }

    #[test]
    fn csv_report_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let v = value_with(&sample_port(), &sample_ledger(), &HashMap::new());
        let report = PortfolioReport {
            title: "t",
            as_of: date(2026, 2, 13),
            valuation: &v,
            signals: &[],
        };
        CsvReportAdapter::new()
            .write(&report, path.to_str().unwrap())
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains(",fallback,"));
    }
}

mod invariants {
    use super::*;
    use folio::domain::holding::Holding;
    use proptest::prelude::*;

    fn arb_holding() -> impl Strategy<Value = Holding> {
        (
            "[A-Z]{2,5}",
            1.0f64..1_000.0,
            0.5f64..5_000.0,
            0.0f64..20.0,
            prop::bool::ANY,
        )
            .prop_map(|(symbol, qty, price, fee, ils)| Holding {
                currency: if ils { Currency::Ils } else { Currency::Usd },
                ..usd_holding(&symbol, qty.round(), price, fee)
            })
    }

    proptest! {
        #[test]
        fn net_profit_identity(
            holdings in prop::collection::vec(arb_holding(), 0..6),
            multiplier in 0.5f64..2.0,
            rate in 2.5f64..5.0,
            cash_usd in -5_000.0f64..5_000.0,
            cash_ils in 0.0f64..20_000.0,
        ) {
            let mut seen = std::collections::HashSet::new();
            let holdings: Vec<Holding> = holdings
                .into_iter()
                .filter(|h| seen.insert(h.symbol.clone()))
                .collect();

            let mut port = MockQuotePort::new().with_fx(rate);
            for h in &holdings {
                let last = h.buy_price * multiplier;
                port = port.with_quote(&h.symbol, last, last);
            }
            let ledger = Ledger {
                holdings,
                cash: CashBalances { usd: cash_usd, ils: cash_ils },
                ..Default::default()
            };
            let v = value_with(&port, &ledger, &HashMap::new());

            let fx = FxRate::new(rate).unwrap();
            prop_assert!((v.net_worth_ils - v.net_worth_usd * rate).abs() < 1e-6);
            prop_assert!(
                (v.net_worth_usd - (v.market_value_usd + cash_usd + fx.to_usd(cash_ils, Currency::Ils))).abs() < 1e-6
            );
            prop_assert!(
                (v.net_profit_usd - (v.unrealized_pnl_usd + v.realized.net_pnl - v.open_fees_usd)).abs() < 1e-6
            );
            prop_assert!((v.lifetime_fees_usd - (v.open_fees_usd + v.realized.fees_paid)).abs() < 1e-9);
            prop_assert_eq!(v.fallback_count(), 0);
            for p in &v.positions {
                prop_assert!((p.day_change).abs() < 1e-9);
                if multiplier >= 1.0 {
                    prop_assert!(p.total_pnl >= -1e-9);
                }
            }
        }
    }
}
