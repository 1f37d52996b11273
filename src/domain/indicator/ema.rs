//! Exponential Moving Average.
//!
//! Uses up to `3 × n` trailing closes for convergence, seeds with the oldest
//! close of that window, then applies EMA = C × k + EMA_prev × (1 − k) with
//! k = 2/(n+1).

use rust_decimal::Decimal;

use crate::domain::error::StocklensError;
use crate::domain::indicator::{require, require_period, trailing};
use crate::domain::price::PricePoint;

pub const CONTEXT_MULTIPLIER: usize = 3;

pub fn smoothing_factor(period: usize) -> Decimal {
    Decimal::TWO / Decimal::from(period + 1)
}

pub fn calculate_ema(window: &[PricePoint], period: usize) -> Result<Decimal, StocklensError> {
    require_period("ema period", period)?;
    require(window, period)?;

    let context = trailing(window, period * CONTEXT_MULTIPLIER);
    let k = smoothing_factor(period);
    let one_minus_k = Decimal::ONE - k;

    let mut ema = context[0].close;
    for point in &context[1..] {
        ema = point.close * k + ema * one_minus_k;
    }
    Ok(ema)
}
