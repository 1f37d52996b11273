//! Technical indicator engine.
//!
//! Every calculation works on a chronological window of [`PricePoint`]s whose
//! last element is the target date, so the value is "as of" that date:
//! - `calculate_*` functions are pure and take the window directly
//! - [`IndicatorEngine`] fetches the window from a [`DataPort`] first
//!
//! Money-valued results are `Decimal`; only the square root inside the
//! standard deviation goes through `f64`.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;

pub use bollinger::{BollingerBands, calculate_bollinger};
pub use ema::calculate_ema;
pub use macd::{MacdValue, calculate_macd};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::{StochasticValue, calculate_stochastic};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

use crate::domain::error::StocklensError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd,
    Bollinger(usize),
    Stochastic(usize),
}

impl IndicatorType {
    /// Number of trailing points fetched to compute this indicator.
    pub fn window_size(&self) -> usize {
        match self {
            IndicatorType::Sma(p) | IndicatorType::Bollinger(p) | IndicatorType::Stochastic(p) => {
                *p
            }
            IndicatorType::Ema(p) => p * ema::CONTEXT_MULTIPLIER,
            IndicatorType::Rsi(p) => p + 1,
            IndicatorType::Macd => macd::SLOW_PERIOD * ema::CONTEXT_MULTIPLIER,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd => write!(f, "MACD({},{})", macd::FAST_PERIOD, macd::SLOW_PERIOD),
            IndicatorType::Bollinger(period) => write!(f, "BOLLINGER({})", period),
            IndicatorType::Stochastic(period) => write!(f, "STOCHASTIC({})", period),
        }
    }
}

/// Fail with `InsufficientData` unless the window holds at least `needed` points.
pub(crate) fn require(window: &[PricePoint], needed: usize) -> Result<(), StocklensError> {
    if window.len() < needed {
        return Err(StocklensError::InsufficientData {
            needed,
            available: window.len(),
        });
    }
    Ok(())
}

/// The last `n` points of a chronological window (or all of it when shorter).
pub(crate) fn trailing(window: &[PricePoint], n: usize) -> &[PricePoint] {
    &window[window.len().saturating_sub(n)..]
}

pub(crate) fn require_period(name: &str, period: usize) -> Result<(), StocklensError> {
    if period == 0 {
        return Err(StocklensError::invalid(name, "period must be greater than zero"));
    }
    Ok(())
}

/// Indicator calculations backed by a price data collaborator.
///
/// Holds no state besides the port reference, so one engine can serve any
/// number of concurrent callers.
pub struct IndicatorEngine<'a> {
    data: &'a dyn DataPort,
}

impl<'a> IndicatorEngine<'a> {
    pub fn new(data: &'a dyn DataPort) -> Self {
        Self { data }
    }

    /// Fetch up to `max_points` ending at `date` and put them in chronological order.
    pub fn window(
        &self,
        symbol: &str,
        date: NaiveDate,
        max_points: usize,
    ) -> Result<Vec<PricePoint>, StocklensError> {
        let mut points = self.data.get_price_window(symbol, date, max_points)?;
        points.reverse();
        Ok(points)
    }

    pub fn sma(&self, symbol: &str, period: usize, date: NaiveDate) -> Result<Decimal, StocklensError> {
        let window = self.window(symbol, date, IndicatorType::Sma(period).window_size())?;
        calculate_sma(&window, period)
    }

    pub fn ema(&self, symbol: &str, period: usize, date: NaiveDate) -> Result<Decimal, StocklensError> {
        let window = self.window(symbol, date, IndicatorType::Ema(period).window_size())?;
        calculate_ema(&window, period)
    }

    pub fn rsi(&self, symbol: &str, period: usize, date: NaiveDate) -> Result<Decimal, StocklensError> {
        let window = self.window(symbol, date, IndicatorType::Rsi(period).window_size())?;
        calculate_rsi(&window, period)
    }

    pub fn macd(&self, symbol: &str, date: NaiveDate) -> Result<MacdValue, StocklensError> {
        let window = self.window(symbol, date, IndicatorType::Macd.window_size())?;
        calculate_macd(&window)
    }

    pub fn bollinger(
        &self,
        symbol: &str,
        period: usize,
        date: NaiveDate,
    ) -> Result<BollingerBands, StocklensError> {
        let window = self.window(symbol, date, IndicatorType::Bollinger(period).window_size())?;
        calculate_bollinger(&window, period)
    }

    pub fn stochastic(
        &self,
        symbol: &str,
        period: usize,
        date: NaiveDate,
    ) -> Result<StochasticValue, StocklensError> {
        let window = self.window(symbol, date, IndicatorType::Stochastic(period).window_size())?;
        calculate_stochastic(&window, period)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn make_points(prices: &[i64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let close = Decimal::from(close);
                PricePoint {
                    symbol: "TEST".into(),
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1000,
                    value: close * Decimal::from(1000),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_points;
    use std::collections::HashMap;

    struct WindowPort {
        points: Vec<PricePoint>,
    }

    impl DataPort for WindowPort {
        fn get_price_window(
            &self,
            _symbol: &str,
            as_of: NaiveDate,
            max_points: usize,
        ) -> Result<Vec<PricePoint>, StocklensError> {
            let mut pts: Vec<PricePoint> = self
                .points
                .iter()
                .filter(|p| p.date <= as_of)
                .cloned()
                .collect();
            pts.reverse();
            pts.truncate(max_points);
            Ok(pts)
        }

        fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
            Ok(vec!["TEST".into()])
        }

        fn get_indicator_snapshot(
            &self,
            symbol: &str,
        ) -> Result<crate::domain::snapshot::IndicatorSnapshot, StocklensError> {
            Err(StocklensError::not_found("snapshot", symbol))
        }

        fn get_all_indicator_snapshots(
            &self,
        ) -> Result<HashMap<String, crate::domain::snapshot::IndicatorSnapshot>, StocklensError>
        {
            Ok(HashMap::new())
        }
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::Macd.to_string(), "MACD(12,26)");
        assert_eq!(IndicatorType::Bollinger(20).to_string(), "BOLLINGER(20)");
    }

    #[test]
    fn window_sizes() {
        assert_eq!(IndicatorType::Sma(20).window_size(), 20);
        assert_eq!(IndicatorType::Ema(12).window_size(), 36);
        assert_eq!(IndicatorType::Rsi(14).window_size(), 15);
        assert_eq!(IndicatorType::Macd.window_size(), 78);
    }

    #[test]
    fn engine_sma_uses_points_up_to_date() {
        let port = WindowPort {
            points: make_points(&[10, 20, 30, 40, 50]),
        };
        let engine = IndicatorEngine::new(&port);
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        // window ends at the third point: (10 + 20 + 30) / 3
        assert_eq!(engine.sma("TEST", 3, date).unwrap(), Decimal::from(20));
    }

    #[test]
    fn engine_sma_insufficient() {
        let port = WindowPort {
            points: make_points(&[10, 20]),
        };
        let engine = IndicatorEngine::new(&port);
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = engine.sma("TEST", 3, date).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn engine_is_deterministic() {
        let prices: Vec<i64> = (0..80).map(|i| 100 + (i * 7) % 13).collect();
        let port = WindowPort {
            points: make_points(&prices),
        };
        let engine = IndicatorEngine::new(&port);
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();

        assert_eq!(engine.ema("TEST", 12, date).unwrap(), engine.ema("TEST", 12, date).unwrap());
        assert_eq!(engine.rsi("TEST", 14, date).unwrap(), engine.rsi("TEST", 14, date).unwrap());
        assert_eq!(engine.macd("TEST", date).unwrap(), engine.macd("TEST", date).unwrap());
    }
}
