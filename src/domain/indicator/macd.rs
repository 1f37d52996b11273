//! MACD (Moving Average Convergence/Divergence).
//!
//! MACD = EMA(12) − EMA(26). The signal line is a fixed-ratio approximation,
//! `MACD × 0.9`, not a 9-period EMA of the MACD line; histogram = MACD − signal.

use rust_decimal::Decimal;

use crate::domain::error::StocklensError;
use crate::domain::indicator::calculate_ema;
use crate::domain::price::PricePoint;

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;

/// 0.9
pub fn signal_ratio() -> Decimal {
    Decimal::new(9, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdValue {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

pub fn calculate_macd(window: &[PricePoint]) -> Result<MacdValue, StocklensError> {
    let fast = calculate_ema(window, FAST_PERIOD)?;
    let slow = calculate_ema(window, SLOW_PERIOD)?;

    let macd = fast - slow;
    let signal = macd * signal_ratio();
    Ok(MacdValue {
        macd,
        signal,
        histogram: macd - signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_points;

    #[test]
    fn macd_flat_prices_is_zero() {
        let points = make_points(&[100; 80]);
        let v = calculate_macd(&points).unwrap();
        let tolerance = Decimal::new(1, 12);
        assert!(v.macd.abs() < tolerance);
        assert!(v.histogram.abs() < tolerance);
    }

    #[test]
    fn macd_rising_prices_positive() {
        let prices: Vec<i64> = (0..80).map(|i| 100 + i).collect();
        let v = calculate_macd(&make_points(&prices)).unwrap();
        assert!(v.macd > Decimal::ZERO);
        assert!(v.histogram > Decimal::ZERO);
    }

    #[test]
    fn macd_signal_is_fixed_ratio() {
        let prices: Vec<i64> = (0..80).map(|i| 200 - (i % 17) * 3).collect();
        let v = calculate_macd(&make_points(&prices)).unwrap();
        assert_eq!(v.signal, v.macd * signal_ratio());
        assert_eq!(v.histogram, v.macd - v.signal);
    }

    #[test]
    fn macd_needs_slow_period() {
        let points = make_points(&[100; 25]);
        assert!(calculate_macd(&points).unwrap_err().is_insufficient_data());
        let points = make_points(&[100; 26]);
        assert!(calculate_macd(&points).is_ok());
    }
}
