//! Breakout: volume spike with short-term leadership above every average.
//!
//! Never fires without volume confirmation; it only ever buys.

use rust_decimal::Decimal;

use crate::domain::signal::{Direction, ScoreCard, StrategyKind, StrategySignal};
use crate::domain::snapshot::{IndicatorSnapshot, SnapshotField};

const MAX_SCORE: f64 = 100.0;
pub const MIN_VOLUME_RATIO: f64 = 1.5;
const STRONG_BUY_STRENGTH: f64 = 75.0;
const BUY_STRENGTH: f64 = 60.0;

pub fn evaluate(snap: &IndicatorSnapshot) -> StrategySignal {
    let mut card = ScoreCard::new(MAX_SCORE);
    let volume_ratio = snap.value_f64(SnapshotField::VolumeRatio).unwrap_or(0.0);

    if volume_ratio >= 2.0 {
        card.add(35.0, format!("volume spike {volume_ratio:.1}x"));
    } else if volume_ratio >= MIN_VOLUME_RATIO {
        card.add(25.0, format!("volume {volume_ratio:.1}x average"));
    }

    match snap.value_f64(SnapshotField::Rs3d) {
        Some(rs) if rs >= 80.0 => card.add(30.0, format!("RS_3D {rs:.0} leading")),
        Some(rs) if rs >= 60.0 => card.add(15.0, format!("RS_3D {rs:.0} above average")),
        _ => {}
    }

    let price = snap.current_price;
    let mas = [snap.ma10, snap.ma30, snap.ma50];
    if mas
        .into_iter()
        .all(|ma| ma.is_some_and(|m| m > Decimal::ZERO && price > m))
    {
        card.add(20.0, "price above MA10, MA30 and MA50");
    }

    let macd_confirms = matches!(
        (snap.macd_hist, snap.macd, snap.macd_signal),
        (Some(hist), Some(line), Some(signal)) if hist > Decimal::ZERO && line > signal
    );
    if macd_confirms {
        card.add(15.0, "MACD confirms");
    }

    let strength = card.strength();
    let direction = if volume_ratio < MIN_VOLUME_RATIO {
        Direction::Hold
    } else if strength >= STRONG_BUY_STRENGTH {
        Direction::StrongBuy
    } else if strength >= BUY_STRENGTH {
        Direction::Buy
    } else {
        Direction::Hold
    };

    card.into_signal_with(StrategyKind::Breakout, direction)
        .with_targets(price, 20, 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::test_support::{bearish_snapshot, bullish_snapshot};

    #[test]
    fn confirmed_breakout() {
        let sig = evaluate(&bullish_snapshot());
        assert_eq!(sig.strength, 100.0);
        assert_eq!(sig.direction, Direction::StrongBuy);
        // 112 * 1.2
        assert_eq!(sig.target_price, Some(Decimal::new(1344, 1)));
    }

    #[test]
    fn no_volume_no_signal() {
        let mut snap = bullish_snapshot();
        snap.volume_ratio = Some(Decimal::new(14, 1));
        let sig = evaluate(&snap);
        // 30 + 20 + 15 without the volume component
        assert!((sig.strength - 65.0).abs() < 1e-9);
        assert_eq!(sig.direction, Direction::Hold);
        assert_eq!(sig.target_price, None);
    }

    #[test]
    fn never_sells() {
        let sig = evaluate(&bearish_snapshot());
        assert_eq!(sig.direction, Direction::Hold);
        assert_eq!(sig.strength, 0.0);
    }

    #[test]
    fn moderate_breakout_is_buy() {
        let mut snap = bullish_snapshot();
        snap.volume_ratio = Some(Decimal::new(16, 1));
        snap.rs_3d = Some(Decimal::from(65));
        // 25 + 15 + 20 + 15
        let sig = evaluate(&snap);
        assert!((sig.strength - 75.0).abs() < 1e-9);
        assert_eq!(sig.direction, Direction::StrongBuy);

        snap.macd_hist = Some(Decimal::new(-1, 1));
        let sig = evaluate(&snap);
        assert!((sig.strength - 60.0).abs() < 1e-9);
        assert_eq!(sig.direction, Direction::Buy);
    }

    #[test]
    fn unknown_volume_ratio_never_fires() {
        let mut snap = bullish_snapshot();
        snap.volume_ratio = None;
        assert_eq!(evaluate(&snap).direction, Direction::Hold);
    }
}
