//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::csv_quote_adapter::CsvQuoteAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::config_validation::validate_config;
use crate::domain::currency::{Currency, DEFAULT_USD_ILS, FxRate, USD_ILS_PAIR, format_money};
use crate::domain::error::FolioError;
use crate::domain::ledger::{CashBalances, Ledger};
use crate::domain::market::{collect_signals, fetch_snapshot};
use crate::domain::signal::SignalThresholds;
use crate::domain::valuation::{DEFAULT_COMMISSION, PortfolioValuation, ValuationInput, value_portfolio};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;
use crate::ports::report_port::{PortfolioReport, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Portfolio valuation and P/L reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Html,
    Csv,
}

impl ReportFormat {
    fn default_file(&self) -> &'static str {
        match self {
            ReportFormat::Html => "report.html",
            ReportFormat::Csv => "report.csv",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Value the portfolio and write a report
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,
        /// Read quotes from the configured CSV price file instead of the network
        #[arg(long)]
        offline: bool,
    },
    /// Validate the configuration and ledger files
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print hold/sell/watch actions for holdings and the watchlist
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        offline: bool,
    },
    /// Print current quotes for symbols
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        offline: bool,
    },
}

/// Everything read from the config file, with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub holdings_path: PathBuf,
    pub sales_path: Option<PathBuf>,
    pub watchlist: Vec<String>,
    pub cash: CashBalances,
    pub default_sale_fee: f64,
    pub fx_pair: String,
    pub fallback_fx: FxRate,
    pub manual_prices: HashMap<String, f64>,
    pub sentiment: HashMap<String, f64>,
    pub earnings: HashMap<String, String>,
    pub thresholds: SignalThresholds,
    pub history_days: u32,
    pub title: String,
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report {
            config,
            output,
            format,
            offline,
        } => run_report(&config, output.as_ref(), format, offline),
        Command::Validate { config } => run_validate(&config),
        Command::Signals { config, offline } => run_signals(&config, offline),
        Command::Quote {
            symbols,
            config,
            offline,
        } => run_quote(&symbols, &config, offline),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FolioError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value.trim());
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

/// Parse a `SYMBOL = number` section; symbols come back uppercased.
fn numeric_section(config: &dyn ConfigPort, section: &str) -> Result<HashMap<String, f64>, FolioError> {
    config
        .get_section(section)
        .into_iter()
        .map(|(symbol, raw)| {
            raw.trim()
                .parse::<f64>()
                .map(|v| (symbol.to_uppercase(), v))
                .map_err(|_| FolioError::ConfigInvalid {
                    section: section.to_string(),
                    key: symbol.clone(),
                    reason: format!("'{}' is not a number", raw),
                })
        })
        .collect()
}

pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn build_settings(config: &dyn ConfigPort, base_dir: &Path) -> Result<Settings, FolioError> {
    let holdings = config
        .get_string("ledger", "holdings")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FolioError::ConfigMissing {
            section: "ledger".into(),
            key: "holdings".into(),
        })?;

    let commission = config.get_double("fees", "commission", DEFAULT_COMMISSION);
    let default_sale_fee = config.get_double("fees", "round_trip", 2.0 * commission);

    let fallback_rate = config.get_double("fx", "fallback_usd_ils", DEFAULT_USD_ILS);
    let fallback_fx = FxRate::new(fallback_rate).ok_or_else(|| FolioError::ConfigInvalid {
        section: "fx".into(),
        key: "fallback_usd_ils".into(),
        reason: "fallback_usd_ils must be positive".into(),
    })?;

    let defaults = SignalThresholds::default();
    let thresholds = SignalThresholds {
        take_profit_pct: config.get_double("signals", "take_profit_pct", defaults.take_profit_pct),
        buy_dip_pct: config.get_double("signals", "buy_dip_pct", defaults.buy_dip_pct),
        hot_news_score: config.get_double("signals", "hot_news_score", defaults.hot_news_score),
        fast_sma: config.get_int("signals", "fast_sma", defaults.fast_sma as i64).max(1) as usize,
        slow_sma: config.get_int("signals", "slow_sma", defaults.slow_sma as i64).max(1) as usize,
    };

    let raw_days = config.get_int("quotes", "history_days", 365);
    let history_days = u32::try_from(raw_days)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| FolioError::ConfigInvalid {
            section: "quotes".into(),
            key: "history_days".into(),
            reason: format!("history_days must be between 1 and {}, got {}", u32::MAX, raw_days),
        })?;

    let format = match config.get_string("report", "format") {
        Some(f) => ReportFormat::from_str(&f, true).map_err(|_| FolioError::ConfigInvalid {
            section: "report".into(),
            key: "format".into(),
            reason: format!("unknown format '{}'", f),
        })?,
        None => ReportFormat::Html,
    };

    Ok(Settings {
        holdings_path: resolve_path(base_dir, &holdings),
        sales_path: config
            .get_string("ledger", "sales")
            .filter(|s| !s.trim().is_empty())
            .map(|s| resolve_path(base_dir, &s)),
        watchlist: config
            .get_string("ledger", "watchlist")
            .map(|s| parse_symbol_list(&s))
            .unwrap_or_default(),
        cash: CashBalances {
            usd: config.get_double("cash", "usd", 0.0),
            ils: config.get_double("cash", "ils", 0.0),
        },
        default_sale_fee,
        fx_pair: config
            .get_string("fx", "pair")
            .unwrap_or_else(|| USD_ILS_PAIR.to_string()),
        fallback_fx,
        manual_prices: numeric_section(config, "manual_prices")?,
        sentiment: numeric_section(config, "sentiment")?,
        earnings: config
            .get_section("earnings")
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect(),
        thresholds,
        history_days,
        title: config
            .get_string("report", "title")
            .unwrap_or_else(|| "My Global Portfolio".to_string()),
        output: config
            .get_string("report", "output")
            .map(|s| resolve_path(base_dir, &s)),
        format,
    })
}

pub fn build_quote_port(
    config: &dyn ConfigPort,
    base_dir: &Path,
    offline: bool,
) -> Result<Box<dyn QuotePort>, FolioError> {
    let provider = config
        .get_string("quotes", "provider")
        .unwrap_or_else(|| "yahoo".to_string())
        .to_lowercase();

    let offline = offline || config.get_bool("quotes", "offline", false);
    if offline || provider == "csv" {
        let csv_path = config
            .get_string("quotes", "csv_path")
            .ok_or_else(|| FolioError::ConfigMissing {
                section: "quotes".into(),
                key: "csv_path".into(),
            })?;
        let mut adapter = CsvQuoteAdapter::from_file(resolve_path(base_dir, &csv_path))?;
        if let Some(dir) = config.get_string("quotes", "history_dir") {
            adapter = adapter.with_history_dir(resolve_path(base_dir, &dir));
        }
        return Ok(Box::new(adapter));
    }

    #[cfg(feature = "yahoo")]
    {
        use crate::adapters::yahoo_adapter::YahooAdapter;
        Ok(Box::new(YahooAdapter::from_config(config)?))
    }

    #[cfg(not(feature = "yahoo"))]
    {
        Err(FolioError::ConfigInvalid {
            section: "quotes".into(),
            key: "provider".into(),
            reason: "yahoo feature is not enabled; use provider = csv".into(),
        })
    }
}

fn base_dir_of(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load the config, validate it, and build settings.
fn prepare(config_path: &Path) -> Result<(FileConfigAdapter, Settings), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let settings = validate_config(&adapter)
        .and_then(|()| build_settings(&adapter, &base_dir_of(config_path)))
        .map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        })?;
    Ok((adapter, settings))
}

pub fn ledger_adapter(settings: &Settings) -> CsvLedgerAdapter {
    let mut adapter = CsvLedgerAdapter::new(settings.holdings_path.clone())
        .with_watchlist(settings.watchlist.clone())
        .with_cash(settings.cash);
    if let Some(sales) = &settings.sales_path {
        adapter = adapter.with_sales(sales.clone());
    }
    adapter
}

fn load_ledger(port: &dyn LedgerPort) -> Result<Ledger, FolioError> {
    let ledger = port.load()?;
    ledger.validate()?;
    Ok(ledger)
}

fn run_report(
    config_path: &Path,
    output_override: Option<&PathBuf>,
    format_override: Option<ReportFormat>,
    offline: bool,
) -> ExitCode {
    let (adapter, mut settings) = match prepare(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    if let Some(format) = format_override {
        settings.format = format;
    }
    if let Some(output) = output_override {
        settings.output = Some(output.clone());
    }

    let quote_port = match build_quote_port(&adapter, &base_dir_of(config_path), offline) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    run_report_pipeline(
        &ledger_adapter(&settings),
        quote_port.as_ref(),
        &settings,
        Local::now().date_naive(),
    )
}

/// Load the ledger, fetch quotes, value, summarise and write the report.
pub fn run_report_pipeline(
    ledger_port: &dyn LedgerPort,
    quote_port: &dyn QuotePort,
    settings: &Settings,
    as_of: NaiveDate,
) -> ExitCode {
    // Stage 1: Ledger
    let ledger = match load_ledger(ledger_port) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Loaded {} holdings, {} sales, {} watchlist symbols",
        ledger.holdings.len(),
        ledger.sales.len(),
        ledger.watchlist.len()
    );

    // Stage 2: Market data
    eprintln!("Fetching quotes...");
    let snapshot = fetch_snapshot(
        quote_port,
        &ledger,
        &settings.manual_prices,
        &settings.fx_pair,
        settings.fallback_fx,
    );
    for f in &snapshot.failures {
        eprintln!("warning: {} ({})", f.symbol, f.reason);
    }

    // Stage 3: Valuation
    let valuation = value_portfolio(&ValuationInput {
        ledger: &ledger,
        quotes: &snapshot.quotes,
        manual_prices: &settings.manual_prices,
        earnings: &settings.earnings,
        fx: snapshot.fx,
        default_sale_fee: settings.default_sale_fee,
    });

    // Stage 4: Signals
    let (signals, signal_failures) = collect_signals(
        quote_port,
        &valuation,
        &ledger.watchlist,
        &settings.sentiment,
        &settings.thresholds,
        settings.history_days,
    );
    for f in &signal_failures {
        eprintln!("warning: skipping watchlist {} ({})", f.symbol, f.reason);
    }

    // Stage 5: Console summary
    print_summary(&valuation, snapshot.fx_is_live);

    // Stage 6: Report
    let output = settings
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(settings.format.default_file()));
    let report = PortfolioReport {
        title: &settings.title,
        as_of,
        valuation: &valuation,
        signals: &signals,
    };
    let writer: Box<dyn ReportPort> = match settings.format {
        ReportFormat::Html => Box::new(HtmlReportAdapter::new()),
        ReportFormat::Csv => Box::new(CsvReportAdapter::new()),
    };

    match writer.write(&report, &output.to_string_lossy()) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn print_summary(v: &PortfolioValuation, fx_is_live: bool) {
    let rate_note = if fx_is_live { "" } else { " (fallback)" };
    eprintln!("\n=== Account Snapshot ===");
    eprintln!("Net Worth ($):     {}", format_money(v.net_worth_usd, Currency::Usd));
    eprintln!(
        "Net Worth (₪):     {}  [USD/ILS {:.4}{}]",
        format_money(v.net_worth_ils, Currency::Ils),
        v.fx.usd_ils,
        rate_note
    );
    eprintln!("Market Value ($):  {}", format_money(v.market_value_usd, Currency::Usd));
    eprintln!("Liquid Cash ($):   {}", format_money(v.cash.usd, Currency::Usd));
    eprintln!("Unrealized P/L:    {}", format_money(v.unrealized_pnl_usd, Currency::Usd));
    eprintln!("Realized P/L:      {}", format_money(v.realized.net_pnl, Currency::Usd));
    eprintln!("Lifetime Fees:     {}", format_money(v.lifetime_fees_usd, Currency::Usd));
    eprintln!("Total Net Profit:  {}", format_money(v.net_profit_usd, Currency::Usd));

    if !v.positions.is_empty() {
        eprintln!("\n=== Positions ===");
        for p in &v.positions {
            let sign = if p.total_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} @ {}  {}{:.2}%  ({})",
                p.display_name,
                p.quantity,
                format_money(p.last_price, p.currency),
                sign,
                p.total_pnl_pct,
                p.source,
            );
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (_adapter, settings) = match prepare(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    let ledger = match load_ledger(&ledger_adapter(&settings)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nLedger:");
    eprintln!("  holdings:  {}", ledger.holdings.len());
    eprintln!("  sales:     {}", ledger.sales.len());
    if !ledger.watchlist.is_empty() {
        eprintln!("  watchlist: {}", ledger.watchlist.join(", "));
    }
    let unknown_manual: Vec<&String> = settings
        .manual_prices
        .keys()
        .filter(|s| !ledger.holdings.iter().any(|h| &h.symbol == *s))
        .collect();
    for s in unknown_manual {
        eprintln!("warning: manual price for {} which is not held", s);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_signals(config_path: &Path, offline: bool) -> ExitCode {
    let (adapter, settings) = match prepare(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let port = match build_quote_port(&adapter, &base_dir_of(config_path), offline) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let ledger = match load_ledger(&ledger_adapter(&settings)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let snapshot = fetch_snapshot(
        port.as_ref(),
        &ledger,
        &settings.manual_prices,
        &settings.fx_pair,
        settings.fallback_fx,
    );
    let valuation = value_portfolio(&ValuationInput {
        ledger: &ledger,
        quotes: &snapshot.quotes,
        manual_prices: &settings.manual_prices,
        earnings: &settings.earnings,
        fx: snapshot.fx,
        default_sale_fee: settings.default_sale_fee,
    });
    let (signals, failures) = collect_signals(
        port.as_ref(),
        &valuation,
        &ledger.watchlist,
        &settings.sentiment,
        &settings.thresholds,
        settings.history_days,
    );
    for f in snapshot.failures.iter().chain(failures.iter()) {
        eprintln!("warning: {} ({})", f.symbol, f.reason);
    }

    for s in &signals {
        let pnl = s
            .pnl_pct
            .map(|p| format!("{:+.2}%", p))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<14} {:>12.2} {:>9}  {}", s.symbol, s.price, pnl, s.action);
    }
    ExitCode::SUCCESS
}

fn run_quote(symbols: &[String], config_path: &Path, offline: bool) -> ExitCode {
    let (adapter, settings) = match prepare(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let port = match build_quote_port(&adapter, &base_dir_of(config_path), offline) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut failed = None;
    for raw in symbols {
        let symbol = raw.to_uppercase();
        match port.fetch_quote(&symbol) {
            Ok(q) => {
                let manual = settings.manual_prices.get(&symbol).copied();
                let shown = match manual {
                    Some(m) if m > 0.0 => format!("{:.4} (manual, live {:.4})", m, q.last),
                    _ => format!("{:.4}", q.last),
                };
                println!("{}: {}  prev {:.4}", symbol, shown, q.previous_close);
            }
            Err(e) => {
                eprintln!("error: {e}");
                failed = Some(e);
            }
        }
    }
    match failed {
        Some(e) => (&e).into(),
        None => ExitCode::SUCCESS,
    }
}
