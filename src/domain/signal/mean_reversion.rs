//! Mean reversion: fade RSI extremes and stretched prices around MA50.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::signal::{ScoreCard, StrategyKind, StrategySignal};
use crate::domain::snapshot::{IndicatorSnapshot, SnapshotField};

const NEUTRAL: f64 = 50.0;
const MAX_SCORE: f64 = 100.0;
const DEVIATION_PCT: f64 = 10.0;

pub fn evaluate(snap: &IndicatorSnapshot) -> StrategySignal {
    let mut card = ScoreCard::starting_at(NEUTRAL, MAX_SCORE);
    let rsi = snap.value_f64(SnapshotField::Rsi);

    let oversold = rsi.is_some_and(|r| r < 30.0);
    match rsi {
        Some(r) if r < 30.0 => card.add(30.0, format!("RSI {r:.1} oversold")),
        Some(r) if r > 70.0 => card.add(-30.0, format!("RSI {r:.1} overbought")),
        _ => {}
    }

    if let Some(ma50) = snap.ma50.filter(|m| *m > Decimal::ZERO) {
        let deviation = ((snap.current_price - ma50) / ma50 * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0);
        if deviation <= -DEVIATION_PCT {
            card.add(20.0, format!("price {deviation:.1}% below MA50"));
        } else if deviation >= DEVIATION_PCT {
            card.add(-20.0, format!("price {deviation:.1}% above MA50"));
        }
    }

    let uptrend = matches!(
        (snap.ma50, snap.ma200),
        (Some(mid), Some(long)) if long > Decimal::ZERO && mid > long
    );
    if oversold && uptrend {
        card.add(10.0, "oversold within a long-term uptrend");
    }

    card.into_signal(StrategyKind::MeanReversion)
        .with_targets(snap.current_price, 8, 4)
}
