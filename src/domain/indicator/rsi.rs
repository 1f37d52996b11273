//! RSI (Relative Strength Index).
//!
//! Simple (non-smoothed) averages over the n + 1 most recent closes:
//! avg_gain = Σ gains / n, avg_loss = Σ |losses| / n,
//! RSI = 100 − 100 / (1 + avg_gain / avg_loss), and 100 when avg_loss is zero.

use rust_decimal::Decimal;

use crate::domain::error::StocklensError;
use crate::domain::indicator::{require, require_period, trailing};
use crate::domain::price::PricePoint;

pub fn calculate_rsi(window: &[PricePoint], period: usize) -> Result<Decimal, StocklensError> {
    require_period("rsi period", period)?;
    require(window, period + 1)?;

    let closes = trailing(window, period + 1);
    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;

    for pair in closes.windows(2) {
        let change = pair[1].close - pair[0].close;
        if change > Decimal::ZERO {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let n = Decimal::from(period);
    let avg_gain = gains / n;
    let avg_loss = losses / n;

    if avg_loss.is_zero() {
        return Ok(Decimal::ONE_HUNDRED);
    }

    let rs = avg_gain / avg_loss;
    Ok(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_points;
    use proptest::prelude::*;

    #[test]
    fn rsi_all_gains() {
        let prices: Vec<i64> = (0..15).map(|i| 100 + i).collect();
        let points = make_points(&prices);
        assert_eq!(calculate_rsi(&points, 14).unwrap(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn rsi_flat_is_hundred() {
        // No losses at all: avg_loss is zero.
        let points = make_points(&[50; 15]);
        assert_eq!(calculate_rsi(&points, 14).unwrap(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn rsi_all_losses() {
        let prices: Vec<i64> = (0..15).map(|i| 100 - i).collect();
        let points = make_points(&prices);
        assert_eq!(calculate_rsi(&points, 14).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn rsi_known_value() {
        // changes: +2, −1, +2, −1 → gains 4, losses 2, rs 2 → 100 − 100/3
        let points = make_points(&[10, 12, 11, 13, 12]);
        let expected = Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / Decimal::from(3);
        assert_eq!(calculate_rsi(&points, 4).unwrap(), expected);
    }

    #[test]
    fn rsi_needs_period_plus_one() {
        let points = make_points(&[10, 11, 12, 13]);
        let err = calculate_rsi(&points, 4).unwrap_err();
        assert!(matches!(
            err,
            StocklensError::InsufficientData {
                needed: 5,
                available: 4
            }
        ));
    }

    proptest! {
        #[test]
        fn rsi_stays_in_bounds(prices in proptest::collection::vec(1i64..100_000, 15..60)) {
            let points = make_points(&prices);
            let rsi = calculate_rsi(&points, 14).unwrap();
            prop_assert!(rsi >= Decimal::ZERO);
            prop_assert!(rsi <= Decimal::ONE_HUNDRED);
        }
    }
}
