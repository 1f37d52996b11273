//! Momentum: cross-sectional relative strength plus volume participation.

use crate::domain::signal::{Direction, ScoreCard, StrategyKind, StrategySignal};
use crate::domain::snapshot::{IndicatorSnapshot, SnapshotField};

const MAX_SCORE: f64 = 100.0;

/// (field, full weight, partial weight, weak threshold, weak penalty)
const RS_RULES: [(SnapshotField, f64, f64, f64, f64); 4] = [
    (SnapshotField::RsAvg, 30.0, 20.0, 30.0, -15.0),
    (SnapshotField::Rs1y, 25.0, 15.0, 30.0, -10.0),
    (SnapshotField::Rs3m, 20.0, 12.0, 30.0, -10.0),
    (SnapshotField::Rs3d, 15.0, 8.0, 20.0, -5.0),
];

pub fn evaluate(snap: &IndicatorSnapshot) -> StrategySignal {
    let mut card = ScoreCard::new(MAX_SCORE);

    for (field, full, partial, weak, penalty) in RS_RULES {
        let Some(rs) = snap.value_f64(field) else {
            continue;
        };
        if rs >= 80.0 {
            card.add(full, format!("{field} {rs:.0} is leading the market"));
        } else if rs >= 60.0 {
            card.add(partial, format!("{field} {rs:.0} above average"));
        } else if rs <= weak {
            card.add(penalty, format!("{field} {rs:.0} is lagging"));
        }
    }

    let volume_ratio = snap.value_f64(SnapshotField::VolumeRatio).unwrap_or(0.0);
    if volume_ratio >= 2.0 {
        card.add(10.0, format!("volume {volume_ratio:.1}x average"));
    } else if volume_ratio >= 1.5 {
        card.add(6.0, format!("volume {volume_ratio:.1}x average"));
    }

    let signal = card.into_signal(StrategyKind::Momentum);
    match signal.direction {
        Direction::StrongBuy => signal.with_targets(snap.current_price, 15, 5),
        _ => signal.with_targets(snap.current_price, 10, 5),
    }
}
