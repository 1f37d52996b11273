//! Stochastic oscillator.
//!
//! %K = (close − lowest low) / (highest high − lowest low) × 100 over the
//! trailing n points; %D = %K × 0.85 (fixed-ratio approximation, not a moving
//! average of %K). A flat range yields %K = 50.

use rust_decimal::Decimal;

use crate::domain::error::StocklensError;
use crate::domain::indicator::{require, require_period, trailing};
use crate::domain::price::PricePoint;

/// 0.85
pub fn d_ratio() -> Decimal {
    Decimal::new(85, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticValue {
    pub k: Decimal,
    pub d: Decimal,
}

pub fn calculate_stochastic(
    window: &[PricePoint],
    period: usize,
) -> Result<StochasticValue, StocklensError> {
    require_period("stochastic period", period)?;
    require(window, period)?;

    let recent = trailing(window, period);
    let highest = recent.iter().map(|p| p.high).max().unwrap_or_default();
    let lowest = recent.iter().map(|p| p.low).min().unwrap_or_default();
    let close = recent[recent.len() - 1].close;

    let range = highest - lowest;
    let k = if range.is_zero() {
        Decimal::from(50)
    } else {
        (close - lowest) / range * Decimal::ONE_HUNDRED
    };

    Ok(StochasticValue { k, d: k * d_ratio() })
}
