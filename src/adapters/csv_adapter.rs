//! CSV price directory adapter.
//!
//! One file per symbol, `{dir}/{SYMBOL}.csv`, with a header row and the
//! columns `date,open,high,low,close,volume` plus an optional `value`
//! (traded value; close × volume when absent). Snapshots are derived from
//! the files on every call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::error::StocklensError;
use crate::domain::price::PricePoint;
use crate::domain::relative_strength::apply_ranks;
use crate::domain::snapshot::{IndicatorSnapshot, build_snapshot};
use crate::ports::data_port::DataPort;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: i64,
    #[serde(default)]
    value: Option<Decimal>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `{dir}/{symbol}.csv`. The symbol must name a file directly inside the
    /// directory.
    fn csv_path(&self, symbol: &str) -> Result<PathBuf, StocklensError> {
        if symbol.is_empty() || symbol.contains(['/', '\\']) || symbol.contains("..") {
            return Err(StocklensError::invalid(
                "symbol",
                format!("'{symbol}' is not a plain ticker"),
            ));
        }
        Ok(self.base_path.join(format!("{symbol}.csv")))
    }

    /// Full history of one symbol in ascending date order.
    pub fn load_history(&self, symbol: &str) -> Result<Vec<PricePoint>, StocklensError> {
        let path = self.csv_path(symbol)?;
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StocklensError::not_found("symbol", symbol),
            _ => StocklensError::Data {
                reason: format!("failed to read {}: {e}", path.display()),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut points = Vec::new();
        for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| StocklensError::Data {
                reason: format!("{}: row {}: {e}", path.display(), line + 1),
            })?;
            points.push(PricePoint {
                symbol: symbol.to_string(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
                value: row
                    .value
                    .unwrap_or_else(|| row.close * Decimal::from(row.volume)),
            });
        }

        points.sort_by_key(|p| p.date);
        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(StocklensError::Data {
                reason: format!("{}: duplicate date {}", path.display(), pair[0].date),
            });
        }
        Ok(points)
    }
}

impl DataPort for CsvAdapter {
    fn get_price_window(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        max_points: usize,
    ) -> Result<Vec<PricePoint>, StocklensError> {
        let mut points = self.load_history(symbol)?;
        let end = points.partition_point(|p| p.date <= as_of);
        points.truncate(end);
        let start = points.len().saturating_sub(max_points);
        let mut window = points.split_off(start);
        window.reverse();
        Ok(window)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StocklensError::Data {
            reason: format!(
                "failed to read directory {}: {e}",
                self.base_path.display()
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StocklensError::Data {
                reason: format!("directory entry error: {e}"),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv")
                && let Some(stem) = path.file_stem()
            {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_indicator_snapshot(&self, symbol: &str) -> Result<IndicatorSnapshot, StocklensError> {
        self.csv_path(symbol)?;
        // RS ranks are cross-sectional, so one symbol's snapshot needs every
        // file in the directory read and ranked. No cache is kept between calls.
        self.get_all_indicator_snapshots()?
            .remove(symbol)
            .ok_or_else(|| StocklensError::not_found("symbol", symbol))
    }

    fn get_all_indicator_snapshots(
        &self,
    ) -> Result<HashMap<String, IndicatorSnapshot>, StocklensError> {
        let mut histories = HashMap::new();
        let mut snapshots = HashMap::new();

        for symbol in self.list_symbols()? {
            let history = match self.load_history(&symbol) {
                Ok(h) => h,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "skipping symbol");
                    continue;
                }
            };
            match build_snapshot(&history) {
                Ok(snap) => {
                    snapshots.insert(symbol.clone(), snap);
                    histories.insert(symbol, history);
                }
                Err(e) => warn!(symbol = %symbol, error = %e, "no snapshot"),
            }
        }

        apply_ranks(&mut snapshots, &histories);
        Ok(snapshots)
    }
}
