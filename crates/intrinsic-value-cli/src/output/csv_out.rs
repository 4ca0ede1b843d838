use std::io::{self, Write};

use super::BatchSummary;

/// Write the summary rows as CSV to stdout.
pub fn print_csv(summary: &BatchSummary) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), summary) {
        eprintln!("CSV output error: {}", e);
    }
}

/// One header row, then one record per ticker.
pub fn write_csv<W: Write>(writer: W, summary: &BatchSummary) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in &summary.results {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SummaryRow;
    use intrinsic_value_core::IntrinsicError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_csv_rows() {
        let mut summary = BatchSummary::new(2018);
        summary.push(SummaryRow {
            ticker: "ACME".into(),
            fiscal_year: 2018,
            status: "ok".into(),
            method: Some("Jimmy DCF".into()),
            intrinsic_price: Some(dec!(224.378196)),
            market_price: Some(dec!(180)),
            upside: None,
            report: Some("ACME-2018.csv".into()),
            error: None,
        });
        let err = IntrinsicError::DataUnavailable {
            ticker: "FOO".into(),
            fiscal_year: 2018,
            reason: "unknown ticker 'FOO'".into(),
        };
        summary.push(SummaryRow::failed("FOO", 2018, &err));

        let mut buf = Vec::new();
        write_csv(&mut buf, &summary).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ticker,fiscal_year,status,method,intrinsic_price"));
        assert!(lines[1].starts_with("ACME,2018,ok,Jimmy DCF,224.378196,180,"));
        assert!(lines[2].starts_with("FOO,2018,data_unavailable,"));
    }
}
