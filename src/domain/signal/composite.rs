//! Composite: weighted blend of the four scorers gated by a vote count.

use crate::domain::signal::{
    Direction, StrategyKind, StrategySignal, breakout, mean_reversion, momentum, trend_following,
};
use crate::domain::snapshot::IndicatorSnapshot;

pub const MOMENTUM_WEIGHT: f64 = 0.30;
pub const TREND_WEIGHT: f64 = 0.35;
pub const MEAN_REVERSION_WEIGHT: f64 = 0.15;
pub const BREAKOUT_WEIGHT: f64 = 0.20;

pub fn evaluate(snap: &IndicatorSnapshot) -> StrategySignal {
    let parts = [
        (momentum::evaluate(snap), MOMENTUM_WEIGHT),
        (trend_following::evaluate(snap), TREND_WEIGHT),
        (mean_reversion::evaluate(snap), MEAN_REVERSION_WEIGHT),
        (breakout::evaluate(snap), BREAKOUT_WEIGHT),
    ];

    let strength: f64 = parts.iter().map(|(s, w)| s.strength * w).sum();
    let confidence: f64 = parts.iter().map(|(s, w)| s.confidence * w).sum();
    let votes: i32 = parts.iter().map(|(s, _)| s.direction.vote()).sum();

    let direction = if strength >= 75.0 && votes >= 4 {
        Direction::StrongBuy
    } else if strength >= 60.0 && votes >= 2 {
        Direction::Buy
    } else if strength <= 25.0 && votes <= -4 {
        Direction::StrongSell
    } else if strength <= 40.0 && votes <= -2 {
        Direction::Sell
    } else {
        Direction::Hold
    };

    let mut reasons: Vec<String> = parts
        .iter()
        .map(|(s, _)| format!("{}: {} ({:.1})", s.strategy, s.direction, s.strength))
        .collect();
    reasons.push(format!("votes {votes:+}"));

    StrategySignal {
        strategy: StrategyKind::Composite,
        direction,
        strength,
        confidence: confidence.clamp(0.0, 1.0),
        reasons,
        target_price: None,
        stop_loss: None,
    }
    .with_targets(snap.current_price, 10, 5)
}
