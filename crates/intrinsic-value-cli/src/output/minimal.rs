use super::{format_decimal, BatchSummary, SummaryRow};

/// Print one `TICKER value` line per ticker; failures show their error kind.
pub fn print_minimal(summary: &BatchSummary) {
    for row in &summary.results {
        println!("{}", minimal_line(row));
    }
}

fn minimal_line(row: &SummaryRow) -> String {
    if row.is_ok() {
        format!("{} {}", row.ticker, format_decimal(row.intrinsic_price))
    } else {
        format!("{} {}", row.ticker, row.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intrinsic_value_core::IntrinsicError;

    #[test]
    fn test_failed_row_shows_kind() {
        let err = IntrinsicError::InsufficientHistory {
            ticker: "FOO".into(),
            required: 4,
            available: 2,
        };
        let row = SummaryRow::failed("FOO", 2018, &err);
        assert_eq!(minimal_line(&row), "FOO insufficient_history");
    }
}
