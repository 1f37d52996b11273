//! Cross-sectional relative strength ranks.
//!
//! For each lookback the percentage return of every symbol is ranked against
//! the rest of the universe and mapped onto a 1–99 percentile. RS_AVG is the
//! mean of whichever ranks could be computed.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::price::PricePoint;
use crate::domain::snapshot::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsPeriod {
    ThreeDays,
    OneMonth,
    ThreeMonths,
    OneYear,
}

impl RsPeriod {
    pub const ALL: [RsPeriod; 4] = [
        RsPeriod::ThreeDays,
        RsPeriod::OneMonth,
        RsPeriod::ThreeMonths,
        RsPeriod::OneYear,
    ];

    pub fn bars(&self) -> usize {
        match self {
            RsPeriod::ThreeDays => 3,
            RsPeriod::OneMonth => 21,
            RsPeriod::ThreeMonths => 63,
            RsPeriod::OneYear => 252,
        }
    }
}

/// Percentage return over the last `bars` bars, if the history is long enough.
pub fn period_return(history: &[PricePoint], bars: usize) -> Option<Decimal> {
    if history.len() <= bars {
        return None;
    }
    let base = history[history.len() - 1 - bars].close;
    history[history.len() - 1].change_pct(base)
}

/// Map each symbol's return onto a 1–99 percentile within the given set.
/// Equal returns share the average of the positions they span.
pub fn percentile_ranks(returns: &HashMap<String, Decimal>) -> HashMap<String, Decimal> {
    let mut sorted: Vec<(&String, &Decimal)> = returns.iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(b.1));

    let n = sorted.len();
    let mut ranks = HashMap::with_capacity(n);
    if n == 1 {
        ranks.insert(sorted[0].0.clone(), Decimal::from(50));
        return ranks;
    }

    let mut start = 0;
    while start < n {
        let value = sorted[start].1;
        let end = start + sorted[start..].iter().take_while(|(_, r)| *r == value).count();
        // mean of positions start..end, times two to stay integral
        let doubled_pos = start + end - 1;
        let rank = Decimal::ONE + Decimal::from(49 * doubled_pos) / Decimal::from(n - 1);
        for (symbol, _) in &sorted[start..end] {
            ranks.insert((*symbol).clone(), rank.round_dp(2));
        }
        start = end;
    }
    ranks
}

/// Fill the RS fields of `snapshots` from the symbols' histories.
pub fn apply_ranks(
    snapshots: &mut HashMap<String, IndicatorSnapshot>,
    histories: &HashMap<String, Vec<PricePoint>>,
) {
    let mut ranks_by_period: Vec<(RsPeriod, HashMap<String, Decimal>)> = Vec::new();
    for period in RsPeriod::ALL {
        let returns: HashMap<String, Decimal> = histories
            .iter()
            .filter_map(|(symbol, h)| period_return(h, period.bars()).map(|r| (symbol.clone(), r)))
            .collect();
        ranks_by_period.push((period, percentile_ranks(&returns)));
    }

    for (symbol, snap) in snapshots.iter_mut() {
        let mut available = Vec::new();
        for (period, ranks) in &ranks_by_period {
            let Some(rank) = ranks.get(symbol).copied() else {
                continue;
            };
            available.push(rank);
            match period {
                RsPeriod::ThreeDays => snap.rs_3d = Some(rank),
                RsPeriod::OneMonth => snap.rs_1m = Some(rank),
                RsPeriod::ThreeMonths => snap.rs_3m = Some(rank),
                RsPeriod::OneYear => snap.rs_1y = Some(rank),
            }
        }
        if !available.is_empty() {
            snap.rs_avg = Some(
                (available.iter().sum::<Decimal>() / Decimal::from(available.len())).round_dp(2),
            );
        }
    }
}
