//! Indicator snapshot: derived values for one symbol at one date.
//!
//! A snapshot is read-only once built. Indicators the data layer could not
//! compute (e.g. MA200 on a young listing) are `None`, never zero: zero is a
//! legitimate reading for RSI and the MACD family.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StocklensError;
use crate::domain::indicator::{calculate_macd, calculate_rsi, calculate_sma, macd, trailing};
use crate::domain::price::PricePoint;
use crate::domain::relative_strength::RsPeriod;

pub const RSI_PERIOD: usize = 14;
pub const VOLUME_AVERAGE_BARS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub current_price: Decimal,
    pub volume: i64,
    /// Bars of history the snapshot was derived from.
    #[serde(default)]
    pub bars: usize,
    pub rsi: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub macd_signal: Option<Decimal>,
    pub macd_hist: Option<Decimal>,
    pub ma10: Option<Decimal>,
    pub ma30: Option<Decimal>,
    pub ma50: Option<Decimal>,
    pub ma200: Option<Decimal>,
    pub rs_3d: Option<Decimal>,
    pub rs_1m: Option<Decimal>,
    pub rs_3m: Option<Decimal>,
    pub rs_1y: Option<Decimal>,
    pub rs_avg: Option<Decimal>,
    pub volume_ratio: Option<Decimal>,
    pub avg_trading_value: Decimal,
}

/// Named snapshot value addressable from condition definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotField {
    Rsi,
    Macd,
    MacdSignal,
    MacdHist,
    Ma10,
    Ma30,
    Ma50,
    Ma200,
    Rs3d,
    Rs1m,
    Rs3m,
    Rs1y,
    RsAvg,
    VolumeRatio,
    TradingValue,
    Price,
    Volume,
}

impl FromStr for SnapshotField {
    type Err = StocklensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_ascii_uppercase().as_str() {
            "RSI" => SnapshotField::Rsi,
            "MACD" => SnapshotField::Macd,
            "MACD_SIGNAL" => SnapshotField::MacdSignal,
            "MACD_HIST" | "MACD_HISTOGRAM" => SnapshotField::MacdHist,
            "MA10" => SnapshotField::Ma10,
            "MA30" => SnapshotField::Ma30,
            "MA50" => SnapshotField::Ma50,
            "MA200" => SnapshotField::Ma200,
            "RS_3D" => SnapshotField::Rs3d,
            "RS_1M" => SnapshotField::Rs1m,
            "RS_3M" => SnapshotField::Rs3m,
            "RS_1Y" => SnapshotField::Rs1y,
            "RS_AVG" => SnapshotField::RsAvg,
            "VOLUME_RATIO" => SnapshotField::VolumeRatio,
            "TRADING_VALUE" | "AVG_TRADING_VALUE" => SnapshotField::TradingValue,
            "PRICE" | "CLOSE" | "CURRENT_PRICE" => SnapshotField::Price,
            "VOLUME" => SnapshotField::Volume,
            other => {
                return Err(StocklensError::invalid(
                    "indicator",
                    format!("unknown indicator '{other}'"),
                ));
            }
        };
        Ok(field)
    }
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnapshotField::Rsi => "RSI",
            SnapshotField::Macd => "MACD",
            SnapshotField::MacdSignal => "MACD_SIGNAL",
            SnapshotField::MacdHist => "MACD_HIST",
            SnapshotField::Ma10 => "MA10",
            SnapshotField::Ma30 => "MA30",
            SnapshotField::Ma50 => "MA50",
            SnapshotField::Ma200 => "MA200",
            SnapshotField::Rs3d => "RS_3D",
            SnapshotField::Rs1m => "RS_1M",
            SnapshotField::Rs3m => "RS_3M",
            SnapshotField::Rs1y => "RS_1Y",
            SnapshotField::RsAvg => "RS_AVG",
            SnapshotField::VolumeRatio => "VOLUME_RATIO",
            SnapshotField::TradingValue => "TRADING_VALUE",
            SnapshotField::Price => "PRICE",
            SnapshotField::Volume => "VOLUME",
        };
        f.write_str(name)
    }
}

impl SnapshotField {
    /// Bars of history needed before this field can be computed.
    pub fn min_bars(&self) -> usize {
        match self {
            SnapshotField::Rsi => RSI_PERIOD + 1,
            SnapshotField::Macd | SnapshotField::MacdSignal | SnapshotField::MacdHist => {
                macd::SLOW_PERIOD
            }
            SnapshotField::Ma10 => 10,
            SnapshotField::Ma30 => 30,
            SnapshotField::Ma50 => 50,
            SnapshotField::Ma200 => 200,
            SnapshotField::Rs3d | SnapshotField::RsAvg => RsPeriod::ThreeDays.bars() + 1,
            SnapshotField::Rs1m => RsPeriod::OneMonth.bars() + 1,
            SnapshotField::Rs3m => RsPeriod::ThreeMonths.bars() + 1,
            SnapshotField::Rs1y => RsPeriod::OneYear.bars() + 1,
            SnapshotField::VolumeRatio => 2,
            SnapshotField::TradingValue | SnapshotField::Price | SnapshotField::Volume => 1,
        }
    }
}

impl IndicatorSnapshot {
    /// `None` when the field could not be computed for this symbol.
    pub fn value(&self, field: SnapshotField) -> Option<Decimal> {
        match field {
            SnapshotField::Rsi => self.rsi,
            SnapshotField::Macd => self.macd,
            SnapshotField::MacdSignal => self.macd_signal,
            SnapshotField::MacdHist => self.macd_hist,
            SnapshotField::Ma10 => self.ma10,
            SnapshotField::Ma30 => self.ma30,
            SnapshotField::Ma50 => self.ma50,
            SnapshotField::Ma200 => self.ma200,
            SnapshotField::Rs3d => self.rs_3d,
            SnapshotField::Rs1m => self.rs_1m,
            SnapshotField::Rs3m => self.rs_3m,
            SnapshotField::Rs1y => self.rs_1y,
            SnapshotField::RsAvg => self.rs_avg,
            SnapshotField::VolumeRatio => self.volume_ratio,
            SnapshotField::TradingValue => Some(self.avg_trading_value),
            SnapshotField::Price => Some(self.current_price),
            SnapshotField::Volume => Some(Decimal::from(self.volume)),
        }
    }

    pub fn value_f64(&self, field: SnapshotField) -> Option<f64> {
        self.value(field).and_then(|v| v.to_f64())
    }

    /// Value addressed by a condition's indicator name. A field that was
    /// never computed is `InsufficientData`.
    pub fn lookup(&self, name: &str) -> Result<Decimal, StocklensError> {
        let field: SnapshotField = name.parse()?;
        self.value(field).ok_or(StocklensError::InsufficientData {
            needed: field.min_bars(),
            available: self.bars,
        })
    }
}

/// Build a snapshot from one symbol's chronological history, as of its last
/// point. RS ranks are left unset: they depend on the whole universe, see
/// [`crate::domain::relative_strength`].
pub fn build_snapshot(history: &[PricePoint]) -> Result<IndicatorSnapshot, StocklensError> {
    let last = history.last().ok_or(StocklensError::InsufficientData {
        needed: 1,
        available: 0,
    })?;

    let ma = |period: usize| calculate_sma(history, period).ok();
    let macd = calculate_macd(history).ok();

    let prior = &history[..history.len() - 1];
    let volume_window = trailing(prior, VOLUME_AVERAGE_BARS);
    let volume_ratio = if volume_window.is_empty() {
        None
    } else {
        let avg_volume = Decimal::from(volume_window.iter().map(|p| p.volume).sum::<i64>())
            / Decimal::from(volume_window.len());
        (!avg_volume.is_zero()).then(|| Decimal::from(last.volume) / avg_volume)
    };

    let value_window = trailing(history, VOLUME_AVERAGE_BARS);
    let avg_trading_value =
        value_window.iter().map(|p| p.value).sum::<Decimal>() / Decimal::from(value_window.len());

    Ok(IndicatorSnapshot {
        symbol: last.symbol.clone(),
        date: Some(last.date),
        current_price: last.close,
        volume: last.volume,
        bars: history.len(),
        rsi: calculate_rsi(history, RSI_PERIOD).ok(),
        macd: macd.map(|m| m.macd),
        macd_signal: macd.map(|m| m.signal),
        macd_hist: macd.map(|m| m.histogram),
        ma10: ma(10),
        ma30: ma(30),
        ma50: ma(50),
        ma200: ma(200),
        volume_ratio,
        avg_trading_value,
        ..Default::default()
    })
}
