//! Per-ticker spreadsheet report written as `<TICKER>-<YEAR>.csv`.
//!
//! Sections, top to bottom: header, historical statements, forecast and
//! discounting, terminal value, result, sensitivity grid.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;

use intrinsic_value_core::statements::StatementSeries;
use intrinsic_value_core::valuation::sensitivity::SensitivityGrid;
use intrinsic_value_core::ValuationResult;

pub fn report_path(dir: &Path, ticker: &str, fiscal_year: i32) -> PathBuf {
    dir.join(format!("{}-{}.csv", ticker, fiscal_year))
}

/// Create `dir` if needed and write the report into it.
pub fn write_report(
    dir: &Path,
    series: &StatementSeries,
    result: &ValuationResult,
    grid: Option<&SensitivityGrid>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;
    let path = report_path(dir, &result.ticker, result.fiscal_year);
    let file = File::create(&path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    render_report(file, series, result, grid)?;
    Ok(path)
}

pub fn render_report<W: Write>(
    writer: W,
    series: &StatementSeries,
    result: &ValuationResult,
    grid: Option<&SensitivityGrid>,
) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let dcf = &result.breakdown;

    // --- Header ---
    wtr.write_record(["Intrinsic Value Report"])?;
    wtr.write_record(["Ticker", result.ticker.as_str()])?;
    wtr.write_record(["Fiscal Year".to_string(), result.fiscal_year.to_string()])?;
    wtr.write_record(["Model", result.method.as_str()])?;
    wtr.write_record(["Discount Rate".to_string(), num(dcf.discount_rate)])?;
    wtr.write_record(["Terminal Growth Rate".to_string(), num(dcf.terminal_growth_rate)])?;
    wtr.write_record(["Forecast Growth Rate".to_string(), num(result.forecast.growth_rate)])?;
    wtr.write_record(["Shares Outstanding".to_string(), num(dcf.shares_outstanding)])?;
    blank(&mut wtr)?;

    // --- Historical statements ---
    wtr.write_record(["Historical Statements"])?;
    wtr.write_record([
        "Fiscal Year",
        "Revenue",
        "Operating Cash Flow",
        "Capital Expenditure",
        "Free Cash Flow",
        "Shares Outstanding",
    ])?;
    for year in series.years() {
        wtr.write_record([
            year.fiscal_year.to_string(),
            num(year.revenue),
            num(year.operating_cash_flow),
            num(year.capital_expenditure),
            num(year.free_cash_flow()),
            num(year.shares_outstanding),
        ])?;
    }
    blank(&mut wtr)?;

    // --- Forecast and discounting ---
    wtr.write_record(["Forecast"])?;
    wtr.write_record([
        "Fiscal Year",
        "Period",
        "Revenue",
        "Free Cash Flow",
        "Discount Factor",
        "Present Value",
    ])?;
    for (year, discounted) in result
        .forecast
        .years
        .iter()
        .zip(&dcf.discounted_cash_flows)
    {
        wtr.write_record([
            discounted.fiscal_year.to_string(),
            discounted.period.to_string(),
            year.revenue.map(num).unwrap_or_default(),
            num(discounted.cash_flow),
            num(discounted.discount_factor),
            num(discounted.present_value),
        ])?;
    }
    wtr.write_record(["Sum of Present Values".to_string(), num(dcf.sum_of_present_values)])?;
    blank(&mut wtr)?;

    // --- Terminal value ---
    wtr.write_record(["Terminal"])?;
    wtr.write_record(["Terminal Value".to_string(), num(dcf.terminal_value)])?;
    wtr.write_record(["PV of Terminal Value".to_string(), num(dcf.pv_of_terminal)])?;
    wtr.write_record(["Terminal Value % of EV".to_string(), num(dcf.terminal_value_pct)])?;
    blank(&mut wtr)?;

    // --- Result ---
    wtr.write_record(["Result"])?;
    wtr.write_record(["Enterprise Value".to_string(), num(dcf.enterprise_value)])?;
    wtr.write_record(["Intrinsic Price".to_string(), num(result.intrinsic_price)])?;
    wtr.write_record([
        "Market Price".to_string(),
        result.market_price.map(num).unwrap_or_default(),
    ])?;
    wtr.write_record([
        "Price Date".to_string(),
        result.price_date.map(|d| d.to_string()).unwrap_or_default(),
    ])?;
    wtr.write_record([
        "Upside".to_string(),
        result.upside().map(num).unwrap_or_default(),
    ])?;
    for warning in result.warnings() {
        wtr.write_record(["Warning", warning.as_str()])?;
    }

    // --- Sensitivity ---
    if let Some(grid) = grid {
        blank(&mut wtr)?;
        wtr.write_record(["Sensitivity (intrinsic price)"])?;
        let mut header = vec!["Discount Rate \\ Terminal Growth".to_string()];
        header.extend(grid.terminal_growth_rates.iter().map(|g| num(*g)));
        wtr.write_record(&header)?;
        for (rate, row) in grid.discount_rates.iter().zip(&grid.matrix) {
            let mut record = vec![num(*rate)];
            record.extend(row.iter().map(|cell| cell.map(num).unwrap_or_default()));
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn num(value: Decimal) -> String {
    value.normalize().to_string()
}

fn blank<W: Write>(wtr: &mut csv::Writer<W>) -> csv::Result<()> {
    wtr.write_record([""])
}
