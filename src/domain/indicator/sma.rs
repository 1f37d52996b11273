//! Simple Moving Average.
//!
//! SMA(n) = arithmetic mean of the n most recent closes ending at the target date.

use rust_decimal::Decimal;

use crate::domain::error::StocklensError;
use crate::domain::indicator::{require, require_period, trailing};
use crate::domain::price::PricePoint;

pub fn calculate_sma(window: &[PricePoint], period: usize) -> Result<Decimal, StocklensError> {
    require_period("sma period", period)?;
    require(window, period)?;

    let sum: Decimal = trailing(window, period).iter().map(|p| p.close).sum();
    Ok(sum / Decimal::from(period))
}
