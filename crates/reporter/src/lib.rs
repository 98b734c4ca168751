use crate::error::ReportError;
use chrono::{NaiveDate, Utc};
use comfy_table::Table;
use core_types::{Alert, Ledger, PriceSeries};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub mod error;

/// Extracts the time-ordered (date, portfolio value) pairs for charting.
/// A derived view over the ledger; the ledger itself is never mutated.
pub fn equity_curve(ledger: &Ledger) -> Vec<(NaiveDate, Decimal)> {
    ledger
        .entries()
        .iter()
        .map(|e| (e.date, e.portfolio_value))
        .collect()
}

/// Renders the ledger as a table, one row per processed period.
pub fn render_ledger(ledger: &Ledger) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "Date",
        "Contributed",
        "Price",
        "Shares Bought",
        "Total Invested",
        "Total Shares",
        "Value",
        "Unrealized Gain",
    ]);

    for entry in ledger.entries() {
        table.add_row(vec![
            entry.date.to_string(),
            entry.amount_contributed.to_string(),
            entry.price_at_purchase.round_dp(4).to_string(),
            entry.shares_bought.round_dp(6).to_string(),
            entry.cumulative_invested.to_string(),
            entry.cumulative_shares.round_dp(6).to_string(),
            entry.portfolio_value.round_dp(2).to_string(),
            entry.unrealized_gain.round_dp(2).to_string(),
        ]);
    }

    table.to_string()
}

/// Writes the ledger to a CSV file, one row per period (spreadsheet export).
pub fn write_ledger_csv(ledger: &Ledger, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in ledger.entries() {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// An append-only log of raised alerts.
///
/// Each call appends one row per alert, keyed by the evaluation timestamp.
/// The header is written only when the file is created, so repeated sessions
/// keep appending to the same log.
pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, alerts: &[Alert]) -> Result<(), ReportError> {
        if alerts.is_empty() {
            return Ok(());
        }

        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(["timestamp", "symbol", "direction", "target", "observed"])?;
        }

        let stamp = Utc::now().to_rfc3339();
        for alert in alerts {
            writer.write_record([
                stamp.as_str(),
                &alert.symbol,
                &alert.direction.to_string(),
                &alert.target.to_string(),
                &alert.observed.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Appends each symbol's most recent observations to `<symbol>.csv` under a
/// directory.
///
/// Writes are keyed by symbol: the header goes out once when a symbol's file
/// is created and is never duplicated when several appends for the same
/// symbol happen in one session.
pub struct ObservationWriter {
    dir: PathBuf,
    headers_written: HashSet<String>,
}

impl ObservationWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            headers_written: HashSet::new(),
        }
    }

    /// Appends the last `tail` points of `series` and returns the file path.
    pub fn append(
        &mut self,
        symbol: &str,
        series: &PriceSeries,
        tail: usize,
    ) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{symbol}.csv"));

        let needs_header = !self.headers_written.contains(symbol) && !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(["date", "close"])?;
        }

        let start = series.len().saturating_sub(tail);
        for point in &series.points()[start..] {
            writer.write_record([point.date.to_string(), point.close.to_string()])?;
        }
        writer.flush()?;

        self.headers_written.insert(symbol.to_string());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{AlertDirection, LedgerEntry, PricePoint};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_ledger() -> Ledger {
        Ledger::new(vec![
            LedgerEntry {
                date: date(2024, 1, 1),
                amount_contributed: dec!(100),
                price_at_purchase: dec!(10),
                shares_bought: dec!(10),
                cumulative_invested: dec!(100),
                cumulative_shares: dec!(10),
                portfolio_value: dec!(100),
                unrealized_gain: dec!(0),
            },
            LedgerEntry {
                date: date(2024, 2, 1),
                amount_contributed: dec!(100),
                price_at_purchase: dec!(20),
                shares_bought: dec!(5),
                cumulative_invested: dec!(200),
                cumulative_shares: dec!(15),
                portfolio_value: dec!(150),
                unrealized_gain: dec!(-50),
            },
        ])
    }

    fn sample_alerts() -> Vec<Alert> {
        vec![Alert {
            symbol: "AAPL".to_string(),
            direction: AlertDirection::Above,
            target: dec!(100),
            observed: dec!(105),
        }]
    }

    #[test]
    fn equity_curve_is_time_ordered_portfolio_values() {
        let curve = equity_curve(&sample_ledger());

        assert_eq!(
            curve,
            vec![
                (date(2024, 1, 1), dec!(100)),
                (date(2024, 2, 1), dec!(150)),
            ]
        );
    }

    #[test]
    fn ledger_table_has_one_row_per_period() {
        let rendered = render_ledger(&sample_ledger());

        assert!(rendered.contains("2024-01-01"));
        assert!(rendered.contains("2024-02-01"));
        assert!(rendered.contains("Unrealized Gain"));
    }

    #[test]
    fn ledger_csv_carries_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        write_ledger_csv(&sample_ledger(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("cumulative_invested"));
        assert!(lines[1].starts_with("2024-01-01"));
    }

    #[test]
    fn alert_log_never_duplicates_its_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.csv");
        let log = AlertLog::new(&path);

        log.append(&sample_alerts()).unwrap();
        log.append(&sample_alerts()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let headers = content.lines().filter(|l| l.starts_with("timestamp")).count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn empty_alert_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.csv");

        AlertLog::new(&path).append(&[]).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn observation_appends_are_keyed_by_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ObservationWriter::new(dir.path());
        let series = PriceSeries::from_points(vec![
            PricePoint { date: date(2024, 1, 1), close: dec!(10) },
            PricePoint { date: date(2024, 1, 2), close: dec!(11) },
        ])
        .unwrap();

        let path = writer.append("AAPL", &series, 5).unwrap();
        writer.append("AAPL", &series, 1).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let headers = content.lines().filter(|l| l.starts_with("date")).count();
        assert_eq!(headers, 1);
        // Two rows from the first append plus one from the second.
        assert_eq!(content.lines().count(), 4);
    }
}
