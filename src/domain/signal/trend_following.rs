//! Trend following: moving-average stack and MACD direction.

use rust_decimal::Decimal;

use crate::domain::signal::{ScoreCard, StrategyKind, StrategySignal};
use crate::domain::snapshot::IndicatorSnapshot;

const MAX_SCORE: f64 = 100.0;

/// Both values known and positive, `a` strictly above `b`.
fn above(a: Option<Decimal>, b: Option<Decimal>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if b > Decimal::ZERO && a > b)
}

pub fn evaluate(snap: &IndicatorSnapshot) -> StrategySignal {
    let mut card = ScoreCard::new(MAX_SCORE);
    let price = Some(snap.current_price);

    if above(snap.ma10, snap.ma30) {
        card.add(20.0, "MA10 above MA30");
    }
    if above(snap.ma50, snap.ma200) {
        card.add(25.0, "golden cross: MA50 above MA200");
    } else if above(snap.ma200, snap.ma50) {
        card.add(0.0, "death cross: MA50 below MA200");
    }
    if above(price, snap.ma50) {
        card.add(20.0, "price above MA50");
    }
    if above(price, snap.ma200) {
        card.add(15.0, "price above MA200");
    }
    if snap.macd_hist.is_some_and(|h| h > Decimal::ZERO) {
        card.add(20.0, "MACD histogram positive");
    }

    card.into_signal(StrategyKind::TrendFollowing)
        .with_targets(snap.current_price, 12, 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Direction;
    use crate::domain::signal::test_support::{bearish_snapshot, bullish_snapshot};

    #[test]
    fn full_uptrend() {
        let sig = evaluate(&bullish_snapshot());
        assert_eq!(sig.strength, 100.0);
        assert_eq!(sig.direction, Direction::StrongBuy);
    }

    #[test]
    fn full_downtrend() {
        let sig = evaluate(&bearish_snapshot());
        assert_eq!(sig.strength, 0.0);
        assert_eq!(sig.direction, Direction::StrongSell);
        assert!(sig.reasons.iter().any(|r| r.contains("death cross")));
        // sell targets sit below price
        assert!(sig.target_price.unwrap() < Decimal::from(88));
    }

    #[test]
    fn missing_long_average_scores_nothing_for_it() {
        let mut snap = bullish_snapshot();
        snap.ma200 = None;
        // 20 + 20 + 20
        let sig = evaluate(&snap);
        assert!((sig.strength - 60.0).abs() < 1e-9);
        assert_eq!(sig.direction, Direction::Buy);
    }
}
