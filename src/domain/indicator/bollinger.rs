//! Bollinger Bands.
//!
//! - Middle: SMA(n)
//! - Upper/Lower: Middle ± 2 × population StdDev of the same n closes

use rust_decimal::Decimal;

use crate::domain::error::StocklensError;
use crate::domain::indicator::stddev::population_stddev;
use crate::domain::indicator::{calculate_sma, trailing};
use crate::domain::price::{PricePoint, closes};

pub const STDDEV_MULTIPLIER: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BollingerBands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

pub fn calculate_bollinger(
    window: &[PricePoint],
    period: usize,
) -> Result<BollingerBands, StocklensError> {
    let middle = calculate_sma(window, period)?;
    let stddev = population_stddev(&closes(trailing(window, period)))
        .ok_or_else(|| StocklensError::invalid("bollinger", "variance out of range"))?;
    let band = Decimal::from(STDDEV_MULTIPLIER) * stddev;

    Ok(BollingerBands {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}
