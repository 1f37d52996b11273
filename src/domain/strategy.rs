//! Backtest strategy configuration and the per-bar trade signal.
//!
//! Parameters arrive as a JSON object tagged with a strategy type and are
//! parsed once into a typed [`StrategyParams`]. Missing keys take their
//! documented defaults; keys present with the wrong shape fall back to the
//! default with a warning.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;
use tracing::warn;

use crate::domain::error::StocklensError;
use crate::domain::indicator::{calculate_macd, calculate_rsi, calculate_sma, ema, macd};
use crate::domain::price::PricePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyParams {
    SmaCrossover {
        short_period: usize,
        long_period: usize,
    },
    Rsi {
        period: usize,
        oversold: Decimal,
        overbought: Decimal,
    },
    Macd,
    Breakout {
        lookback: usize,
        volume_multiplier: Decimal,
    },
}

impl StrategyParams {
    pub fn type_tag(&self) -> &'static str {
        match self {
            StrategyParams::SmaCrossover { .. } => "sma_crossover",
            StrategyParams::Rsi { .. } => "rsi_strategy",
            StrategyParams::Macd => "macd_strategy",
            StrategyParams::Breakout { .. } => "breakout_strategy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub params: StrategyParams,
}

fn param_usize(params: &Value, key: &str, default: usize) -> usize {
    match params.get(key) {
        None | Some(Value::Null) => default,
        Some(v) => match v.as_u64() {
            Some(n) => n as usize,
            None => {
                warn!(key, value = %v, default, "malformed strategy parameter, using default");
                default
            }
        },
    }
}

fn param_decimal(params: &Value, key: &str, default: Decimal) -> Decimal {
    match params.get(key) {
        None | Some(Value::Null) => default,
        Some(v) => match v.as_f64().and_then(Decimal::from_f64) {
            Some(d) => d,
            None => {
                warn!(key, value = %v, %default, "malformed strategy parameter, using default");
                default
            }
        },
    }
}

fn positive(name: &str, value: usize) -> Result<usize, StocklensError> {
    if value == 0 {
        return Err(StocklensError::invalid(name, "must be greater than zero"));
    }
    Ok(value)
}

impl StrategyConfig {
    /// Parse a strategy from its type tag and JSON parameter object.
    pub fn from_json(name: &str, type_tag: &str, params: &Value) -> Result<Self, StocklensError> {
        let params = match type_tag.trim().to_ascii_lowercase().as_str() {
            "sma_crossover" => {
                let short_period = positive("short_period", param_usize(params, "short_period", 20))?;
                let long_period = positive("long_period", param_usize(params, "long_period", 50))?;
                if short_period >= long_period {
                    return Err(StocklensError::invalid(
                        "short_period",
                        format!("must be less than long_period ({long_period})"),
                    ));
                }
                StrategyParams::SmaCrossover {
                    short_period,
                    long_period,
                }
            }
            "rsi_strategy" => {
                let period = positive("period", param_usize(params, "period", 14))?;
                let oversold = param_decimal(params, "oversold", Decimal::from(30));
                let overbought = param_decimal(params, "overbought", Decimal::from(70));
                if oversold >= overbought {
                    return Err(StocklensError::invalid(
                        "oversold",
                        format!("must be less than overbought ({overbought})"),
                    ));
                }
                StrategyParams::Rsi {
                    period,
                    oversold,
                    overbought,
                }
            }
            "macd_strategy" => StrategyParams::Macd,
            "breakout_strategy" => {
                let lookback = positive("lookback", param_usize(params, "lookback", 20))?;
                let volume_multiplier =
                    param_decimal(params, "volume_multiplier", Decimal::new(15, 1));
                StrategyParams::Breakout {
                    lookback,
                    volume_multiplier,
                }
            }
            _ => return Err(StocklensError::not_found("strategy type", type_tag)),
        };
        Ok(Self {
            name: name.to_string(),
            params,
        })
    }

    /// Bars of history a signal needs, including the bar being evaluated.
    pub fn required_history(&self) -> usize {
        match &self.params {
            StrategyParams::SmaCrossover { long_period, .. } => long_period + 1,
            StrategyParams::Rsi { period, .. } => period + 1,
            StrategyParams::Macd => macd::SLOW_PERIOD * ema::CONTEXT_MULTIPLIER + 1,
            StrategyParams::Breakout { lookback, .. } => lookback + 1,
        }
    }

    /// Signal for the last bar of a chronological history.
    ///
    /// Not enough history is a HOLD, never an error.
    pub fn signal(&self, history: &[PricePoint]) -> TradeSignal {
        if history.len() < 2 {
            return TradeSignal::Hold;
        }
        let prev = &history[..history.len() - 1];

        match &self.params {
            StrategyParams::SmaCrossover {
                short_period,
                long_period,
            } => {
                let now = calculate_sma(history, *short_period)
                    .and_then(|s| Ok((s, calculate_sma(history, *long_period)?)));
                let before = calculate_sma(prev, *short_period)
                    .and_then(|s| Ok((s, calculate_sma(prev, *long_period)?)));
                match (now, before) {
                    (Ok((s, l)), Ok((ps, pl))) if s > l && ps <= pl => TradeSignal::Buy,
                    (Ok((s, l)), Ok((ps, pl))) if s < l && ps >= pl => TradeSignal::Sell,
                    _ => TradeSignal::Hold,
                }
            }
            StrategyParams::Rsi {
                period,
                oversold,
                overbought,
            } => match calculate_rsi(history, *period) {
                Ok(rsi) if rsi < *oversold => TradeSignal::Buy,
                Ok(rsi) if rsi > *overbought => TradeSignal::Sell,
                _ => TradeSignal::Hold,
            },
            StrategyParams::Macd => match (calculate_macd(history), calculate_macd(prev)) {
                (Ok(now), Ok(before)) => {
                    if now.histogram > Decimal::ZERO && before.histogram <= Decimal::ZERO {
                        TradeSignal::Buy
                    } else if now.histogram < Decimal::ZERO && before.histogram >= Decimal::ZERO {
                        TradeSignal::Sell
                    } else {
                        TradeSignal::Hold
                    }
                }
                _ => TradeSignal::Hold,
            },
            StrategyParams::Breakout {
                lookback,
                volume_multiplier,
            } => {
                if history.len() < lookback + 1 {
                    return TradeSignal::Hold;
                }
                let bar = &history[history.len() - 1];
                let prior = &prev[prev.len() - lookback..];
                let highest = prior.iter().map(|p| p.high).max().unwrap_or_default();
                let lowest = prior.iter().map(|p| p.low).min().unwrap_or_default();
                let avg_volume = Decimal::from(prior.iter().map(|p| p.volume).sum::<i64>())
                    / Decimal::from(*lookback);

                if bar.close > highest && Decimal::from(bar.volume) >= *volume_multiplier * avg_volume
                {
                    TradeSignal::Buy
                } else if bar.close < lowest {
                    TradeSignal::Sell
                } else {
                    TradeSignal::Hold
                }
            }
        }
    }
}
