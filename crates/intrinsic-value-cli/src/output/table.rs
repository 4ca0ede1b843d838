use tabled::{builder::Builder, Table};

use super::{format_decimal, BatchSummary};

const HEADERS: [&str; 6] = [
    "Ticker",
    "Model",
    "Intrinsic Price",
    "Current Price",
    "Upside",
    "Status",
];

/// Format the summary as a table using the tabled crate.
pub fn print_table(summary: &BatchSummary) {
    println!("{}", render_table(summary));

    let failures: Vec<_> = summary.results.iter().filter(|r| !r.is_ok()).collect();
    if !failures.is_empty() {
        println!("\nFailures:");
        for row in failures {
            println!("  - {}: {}", row.ticker, row.error.as_deref().unwrap_or_default());
        }
    }

    println!(
        "\nValued {} of {} tickers for fiscal year {}",
        summary.valued,
        summary.results.len(),
        summary.fiscal_year
    );
}

pub fn render_table(summary: &BatchSummary) -> String {
    if summary.results.is_empty() {
        return "(empty)".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(HEADERS);
    for row in &summary.results {
        builder.push_record([
            row.ticker.clone(),
            row.method.clone().unwrap_or_default(),
            format_decimal(row.intrinsic_price),
            format_decimal(row.market_price),
            row.upside
                .and_then(|u| u.checked_mul(rust_decimal::Decimal::ONE_HUNDRED))
                .map(|pct| format!("{}%", pct.round_dp(2)))
                .unwrap_or_default(),
            row.status.clone(),
        ]);
    }
    Table::from(builder).to_string()
}
