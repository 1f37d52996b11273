//! Built-in strategy scorers.
//!
//! Each strategy turns an [`IndicatorSnapshot`] into a [`StrategySignal`]:
//! a direction, a 0–100 strength, a 0–1 confidence and the reasons that
//! contributed. The set is closed, so dispatch is a `match` over
//! [`StrategyKind`] rather than a registry.

pub mod breakout;
pub mod composite;
pub mod mean_reversion;
pub mod momentum;
pub mod trend_following;

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StocklensError;
use crate::domain::snapshot::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Direction {
    /// Vote weight used by the composite aggregator.
    pub fn vote(&self) -> i32 {
        match self {
            Direction::StrongBuy => 2,
            Direction::Buy => 1,
            Direction::Hold => 0,
            Direction::Sell => -1,
            Direction::StrongSell => -2,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Direction::StrongBuy | Direction::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Direction::StrongSell | Direction::Sell)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::StrongBuy => "STRONG_BUY",
            Direction::Buy => "BUY",
            Direction::Hold => "HOLD",
            Direction::Sell => "SELL",
            Direction::StrongSell => "STRONG_SELL",
        };
        f.write_str(s)
    }
}

/// Shared strength → direction mapping.
pub fn direction_from_strength(strength: f64) -> Direction {
    if strength >= 80.0 {
        Direction::StrongBuy
    } else if strength >= 60.0 {
        Direction::Buy
    } else if strength <= 20.0 {
        Direction::StrongSell
    } else if strength <= 40.0 {
        Direction::Sell
    } else {
        Direction::Hold
    }
}

/// Distance from neutral, scaled to 0–1.
pub fn confidence_from_strength(strength: f64) -> f64 {
    ((strength - 50.0).abs() / 50.0).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Momentum,
    TrendFollowing,
    MeanReversion,
    Breakout,
    Composite,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Momentum,
        StrategyKind::TrendFollowing,
        StrategyKind::MeanReversion,
        StrategyKind::Breakout,
        StrategyKind::Composite,
    ];

    pub fn evaluate(&self, snap: &IndicatorSnapshot) -> StrategySignal {
        match self {
            StrategyKind::Momentum => momentum::evaluate(snap),
            StrategyKind::TrendFollowing => trend_following::evaluate(snap),
            StrategyKind::MeanReversion => mean_reversion::evaluate(snap),
            StrategyKind::Breakout => breakout::evaluate(snap),
            StrategyKind::Composite => composite::evaluate(snap),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::TrendFollowing => "trend_following",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::Breakout => "breakout",
            StrategyKind::Composite => "composite",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = StocklensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "momentum" => Ok(StrategyKind::Momentum),
            "trend_following" | "trend" => Ok(StrategyKind::TrendFollowing),
            "mean_reversion" => Ok(StrategyKind::MeanReversion),
            "breakout" => Ok(StrategyKind::Breakout),
            "composite" => Ok(StrategyKind::Composite),
            _ => Err(StocklensError::not_found("strategy", s)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySignal {
    pub strategy: StrategyKind,
    pub direction: Direction,
    pub strength: f64,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub target_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
}

impl StrategySignal {
    /// Attach percentage target/stop offsets from `price`, mirrored for sells.
    /// Holds and non-positive prices get none.
    pub(crate) fn with_targets(mut self, price: Decimal, target_pct: u32, stop_pct: u32) -> Self {
        if price <= Decimal::ZERO || self.direction == Direction::Hold {
            return self;
        }
        let target = Decimal::from(target_pct) / Decimal::ONE_HUNDRED;
        let stop = Decimal::from(stop_pct) / Decimal::ONE_HUNDRED;
        let (t, s) = if self.direction.is_buy() {
            (Decimal::ONE + target, Decimal::ONE - stop)
        } else {
            (Decimal::ONE - target, Decimal::ONE + stop)
        };
        self.target_price = Some(price * t);
        self.stop_loss = Some(price * s);
        self
    }
}

/// Running additive score against a running maximum.
#[derive(Debug, Default)]
pub(crate) struct ScoreCard {
    score: f64,
    max: f64,
    reasons: Vec<String>,
}

impl ScoreCard {
    pub(crate) fn new(max: f64) -> Self {
        Self {
            max,
            ..Default::default()
        }
    }

    pub(crate) fn starting_at(score: f64, max: f64) -> Self {
        Self {
            score,
            max,
            reasons: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, points: f64, reason: impl Into<String>) {
        self.score += points;
        self.reasons.push(reason.into());
    }

    pub(crate) fn strength(&self) -> f64 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (100.0 * self.score / self.max).clamp(0.0, 100.0)
    }

    /// Signal with the shared direction mapping.
    pub(crate) fn into_signal(self, strategy: StrategyKind) -> StrategySignal {
        let strength = self.strength();
        self.into_signal_with(strategy, direction_from_strength(strength))
    }

    pub(crate) fn into_signal_with(
        self,
        strategy: StrategyKind,
        direction: Direction,
    ) -> StrategySignal {
        let strength = self.strength();
        StrategySignal {
            strategy,
            direction,
            strength,
            confidence: confidence_from_strength(strength),
            reasons: self.reasons,
            target_price: None,
            stop_loss: None,
        }
    }
}

/// Evaluate a built-in strategy by name.
pub fn generate_strategy_signal(
    name: &str,
    snap: &IndicatorSnapshot,
) -> Result<StrategySignal, StocklensError> {
    let kind: StrategyKind = name.parse()?;
    Ok(kind.evaluate(snap))
}
