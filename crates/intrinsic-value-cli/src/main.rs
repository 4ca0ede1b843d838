mod input;
mod output;
mod report;

use std::path::{Path, PathBuf};
use std::process;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser, ValueEnum};
use colored::Colorize;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use intrinsic_value_core::provider::{normalize_ticker, CachedProvider, FileDataProvider};
use intrinsic_value_core::{
    ConfigOverrides, DataProvider, ForecastMethod, IntrinsicError, ValuationConfig,
    ValuationResult, ValuationService,
};

use output::{BatchSummary, SummaryRow};

type Provider = CachedProvider<FileDataProvider>;

/// Estimate intrinsic share prices from historical statements
#[derive(Parser, Debug)]
#[command(
    name = "valuate",
    version,
    about = "Estimate intrinsic share prices with a discounted cash flow model",
    long_about = "Forecasts free cash flow from historical annual statements, discounts it \
                  with a Gordon growth terminal value and compares the resulting price per \
                  share with the market close. Writes one spreadsheet report per ticker."
)]
#[command(group(ArgGroup::new("tickers").required(true).args(["ticker", "ticker_file"])))]
struct Cli {
    /// Fiscal year to value
    year: i32,

    /// Single ticker symbol
    #[arg(short = 't', long)]
    ticker: Option<String>,

    /// File with one ticker per line
    #[arg(long)]
    ticker_file: Option<String>,

    /// Directory holding <TICKER>.json statement documents
    #[arg(long, default_value = "financial-data")]
    data_dir: PathBuf,

    /// YAML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Annual discount rate (e.g. 0.0975 for 9.75%)
    #[arg(long, allow_hyphen_values = true)]
    discount_rate: Option<Decimal>,

    /// Perpetual growth rate after the forecast horizon
    #[arg(long, allow_hyphen_values = true)]
    terminal_growth: Option<Decimal>,

    /// Number of explicitly forecast years
    #[arg(long)]
    horizon: Option<u32>,

    /// Forecasting method
    #[arg(long)]
    method: Option<MethodArg>,

    /// Market price date (defaults to Dec 31 of the fiscal year)
    #[arg(long)]
    price_date: Option<NaiveDate>,

    /// Directory for <TICKER>-<YEAR>.csv reports
    #[arg(long, default_value = ".")]
    report_dir: PathBuf,

    /// Skip writing reports
    #[arg(long)]
    no_report: bool,

    /// Output format for the batch summary
    #[arg(long, default_value = "table")]
    output: OutputFormat,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Jimmy,
    RevenueMargin,
}

impl From<MethodArg> for ForecastMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Jimmy => ForecastMethod::Jimmy,
            MethodArg::RevenueMargin => ForecastMethod::RevenueMargin,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            output::format_output(&cli.output, &summary);
            process::exit(if summary.all_valued() { 0 } else { 1 });
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: &Cli) -> Result<BatchSummary, Box<dyn std::error::Error>> {
    let tickers = match (&cli.ticker, &cli.ticker_file) {
        (Some(ticker), _) => vec![normalize_ticker(ticker)],
        (None, Some(path)) => input::file::read_ticker_file(path)?,
        (None, None) => return Err("one of --ticker or --ticker-file is required".into()),
    };

    let config = build_config(cli)?;
    debug!(?config, "effective configuration");

    let provider = CachedProvider::new(FileDataProvider::new(&cli.data_dir));
    let service = ValuationService::new(provider, config)?;

    let mut summary = BatchSummary::new(cli.year);
    for outcome in service.valuate_batch(cli.year, &tickers) {
        let row = match outcome.result {
            Ok(result) => {
                log_valuation(&result);
                if cli.no_report {
                    SummaryRow::valued(&result, None)
                } else {
                    match write_ticker_report(&service, &cli.report_dir, &result) {
                        Ok(path) => SummaryRow::valued(&result, Some(&path)),
                        Err(e) => {
                            report_failure(&outcome.ticker, cli.year, &e.to_string());
                            let mut row = SummaryRow::valued(&result, None);
                            row.status = "report_failed".into();
                            row.error = Some(e.to_string());
                            row
                        }
                    }
                }
            }
            Err(e) => {
                report_failure(&outcome.ticker, cli.year, &describe(&e));
                SummaryRow::failed(&outcome.ticker, cli.year, &e)
            }
        };
        summary.push(row);
    }

    let skipped = tickers.len() - summary.results.len();
    if skipped > 0 {
        warn!(skipped, "batch stopped early; remaining tickers were not valued");
    }
    let stats = service.provider().stats();
    debug!(hits = stats.hits, misses = stats.misses, "provider cache");

    Ok(summary)
}

/// Defaults, then the YAML file, then command-line flags.
fn build_config(cli: &Cli) -> Result<ValuationConfig, Box<dyn std::error::Error>> {
    let base = match &cli.config {
        Some(path) => ValuationConfig::from_file(input::file::resolve_path(path)?)?,
        None => ValuationConfig::default(),
    };
    let overrides = ConfigOverrides {
        discount_rate: cli.discount_rate,
        terminal_growth_rate: cli.terminal_growth,
        forecast_horizon: cli.horizon,
        method: cli.method.map(ForecastMethod::from),
        shares_outstanding: None,
        price_as_of: cli.price_date,
    };
    Ok(base.apply(&overrides))
}

fn write_ticker_report(
    service: &ValuationService<Provider>,
    dir: &Path,
    result: &ValuationResult,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Served from the cache filled by the valuation itself.
    let series = service
        .provider()
        .get_statement_series(&result.ticker, result.fiscal_year)?;
    let grid = match service.sensitivity(result) {
        Ok(grid) => Some(grid),
        Err(e) => {
            warn!(ticker = %result.ticker, "sensitivity grid skipped: {e}");
            None
        }
    };
    let path = report::write_report(dir, &series, result, grid.as_ref())?;
    debug!(ticker = %result.ticker, path = %path.display(), "report written");
    Ok(path)
}

fn log_valuation(result: &ValuationResult) {
    let current = result
        .market_price
        .map(|p| format!("{:.6}", p))
        .unwrap_or_else(|| "n/a".into());
    info!(
        "Ticker: {}, Model {}, Intrinsic Price: {:.6}, Current Price: {}",
        result.ticker, result.method, result.intrinsic_price, current
    );
}

fn describe(err: &IntrinsicError) -> String {
    format!("{} [{}]", err, err.kind())
}

fn report_failure(ticker: &str, fiscal_year: i32, reason: &str) {
    eprintln!(
        "{}: Could not valuate {}, {} because: {}",
        "error".red().bold(),
        ticker,
        fiscal_year,
        reason
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::fs;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("valuate").chain(args.iter().copied()))
    }

    #[test]
    fn test_requires_exactly_one_ticker_source() {
        assert!(parse(&["2018"]).is_err());
        assert!(parse(&["2018", "-t", "ACME", "--ticker-file", "t.txt"]).is_err());
        let cli = parse(&["2018", "-t", "acme"]).unwrap();
        assert_eq!(cli.ticker.as_deref(), Some("acme"));
        assert_eq!(cli.report_dir, PathBuf::from("."));
    }

    #[test]
    fn test_parses_rates_method_and_date() {
        let cli = parse(&[
            "2018",
            "--ticker-file",
            "tickers.txt",
            "--discount-rate",
            "0.11",
            "--terminal-growth",
            "-0.01",
            "--method",
            "revenue-margin",
            "--price-date",
            "2019-01-15",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.discount_rate, Some(dec!(0.11)));
        assert_eq!(cli.terminal_growth, Some(dec!(-0.01)));
        assert!(matches!(cli.method, Some(MethodArg::RevenueMargin)));
        assert_eq!(cli.price_date, NaiveDate::from_ymd_opt(2019, 1, 15));
    }

    #[test]
    fn test_flags_override_yaml_which_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuation.yaml");
        fs::write(&path, "discount_rate: 0.12\nforecast_horizon: 7\n").unwrap();

        let cli = parse(&[
            "2018",
            "-t",
            "ACME",
            "--config",
            path.to_str().unwrap(),
            "--horizon",
            "3",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert_eq!(config.discount_rate, dec!(0.12));
        assert_eq!(config.forecast_horizon, 3);
        assert_eq!(
            config.terminal_growth_rate,
            ValuationConfig::default().terminal_growth_rate
        );
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = parse(&["2018", "-t", "ACME", "--config", "/nonexistent/valuation.yaml"]).unwrap();
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_run_values_tickers_and_writes_reports() {
        let data = tempfile::tempdir().unwrap();
        let reports = tempfile::tempdir().unwrap();
        fs::write(
            data.path().join("ACME.json"),
            r#"{
                "ticker": "ACME",
                "statements": [
                    {"fiscal_year": 2015, "revenue": 500, "operating_cash_flow": 120, "capital_expenditure": -20, "shares_outstanding": 10},
                    {"fiscal_year": 2016, "revenue": 550, "operating_cash_flow": 130, "capital_expenditure": -20, "shares_outstanding": 10},
                    {"fiscal_year": 2017, "revenue": 605, "operating_cash_flow": 141, "capital_expenditure": -20, "shares_outstanding": 10},
                    {"fiscal_year": 2018, "revenue": "665.5", "operating_cash_flow": "153.1", "capital_expenditure": -20, "shares_outstanding": 10}
                ],
                "prices": {"2018-12-31": "180"}
            }"#,
        )
        .unwrap();
        let tickers = data.path().join("tickers.txt");
        fs::write(&tickers, "acme\nmissing\n").unwrap();

        let cli = parse(&[
            "2018",
            "--ticker-file",
            tickers.to_str().unwrap(),
            "--data-dir",
            data.path().to_str().unwrap(),
            "--report-dir",
            reports.path().to_str().unwrap(),
            "--horizon",
            "4",
        ])
        .unwrap();
        let summary = run(&cli).unwrap();

        assert_eq!(summary.valued, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results[1].status, "data_unavailable");
        assert!(reports.path().join("ACME-2018.csv").is_file());
        assert!(!reports.path().join("MISSING-2018.csv").exists());
    }

    #[test]
    fn test_run_rejects_invalid_rates_before_valuing() {
        let cli = parse(&[
            "2018",
            "-t",
            "ACME",
            "--discount-rate",
            "0.02",
            "--terminal-growth",
            "0.02",
            "--no-report",
        ])
        .unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("Invalid rate configuration"));
    }
}
