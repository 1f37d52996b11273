//! Daily OHLCV price point for one symbol.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    /// Traded value for the day (close × volume when the source omits it).
    pub value: Decimal,
}

impl PricePoint {
    /// Percentage change of this close versus `prev_close`.
    pub fn change_pct(&self, prev_close: Decimal) -> Option<Decimal> {
        if prev_close.is_zero() {
            return None;
        }
        Some((self.close - prev_close) / prev_close * Decimal::ONE_HUNDRED)
    }
}

/// Closes of a chronological window, oldest first.
pub fn closes(window: &[PricePoint]) -> Vec<Decimal> {
    window.iter().map(|p| p.close).collect()
}
