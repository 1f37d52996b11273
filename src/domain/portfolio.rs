//! Mutable simulation state for one backtest run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::HashMap;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub cash: Decimal,
    /// Running maximum drawdown as of this point.
    pub max_drawdown: f64,
}

/// Cash, open positions and the running equity/drawdown record.
///
/// Owned by a single run. `max_drawdown` only ever grows.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestState {
    pub initial_capital: Decimal,
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub peak_equity: Decimal,
    pub max_drawdown: f64,
}

impl BacktestState {
    pub fn new(initial_capital: Decimal) -> Self {
        BacktestState {
            initial_capital,
            cash: initial_capital,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
            peak_equity: initial_capital,
            max_drawdown: 0.0,
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.symbol.clone(), position);
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn mark(&mut self, symbol: &str, price: Decimal) {
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.mark(price);
        }
    }

    /// cash + Σ(current price × quantity)
    pub fn equity(&self) -> Decimal {
        self.cash
            + self
                .positions
                .values()
                .map(Position::market_value)
                .sum::<Decimal>()
    }

    /// Record end-of-day equity and update peak and drawdown. A second
    /// record for the same date replaces the first.
    pub fn record_equity(&mut self, date: NaiveDate) {
        let equity = self.equity();
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = ((self.peak_equity - equity) / self.peak_equity)
                .to_f64()
                .unwrap_or(0.0);
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }

        let point = EquityPoint {
            date,
            equity,
            cash: self.cash,
            max_drawdown: self.max_drawdown,
        };
        match self.equity_curve.last_mut() {
            Some(last) if last.date == date => *last = point,
            _ => self.equity_curve.push(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    fn sample_position(symbol: &str, quantity: i64, price: i64) -> Position {
        Position {
            symbol: symbol.to_string(),
            quantity,
            cost_basis: d(quantity * price),
            entry_commission: Decimal::ZERO,
            entry_date: day(2),
            current_price: d(price),
        }
    }

    #[test]
    fn new_state() {
        let state = BacktestState::new(d(100_000));
        assert_eq!(state.cash, d(100_000));
        assert_eq!(state.equity(), d(100_000));
        assert_eq!(state.peak_equity, d(100_000));
        assert!(state.positions.is_empty());
        assert!(state.equity_curve.is_empty());
    }

    #[test]
    fn equity_includes_marked_positions() {
        let mut state = BacktestState::new(d(100_000));
        state.cash = d(90_000);
        state.add_position(sample_position("VNM", 100, 100));
        assert_eq!(state.equity(), d(100_000));

        state.mark("VNM", d(120));
        assert_eq!(state.equity(), d(102_000));
        state.mark("FPT", d(1));
        assert_eq!(state.equity(), d(102_000));
    }

    #[test]
    fn drawdown_tracks_peak() {
        let mut state = BacktestState::new(d(100_000));
        state.cash = d(90_000);
        state.add_position(sample_position("VNM", 100, 100));

        state.mark("VNM", d(200));
        state.record_equity(day(2));
        assert_eq!(state.peak_equity, d(110_000));
        assert_eq!(state.max_drawdown, 0.0);

        state.mark("VNM", d(10));
        state.record_equity(day(3));
        // (110000 - 91000) / 110000
        assert!((state.max_drawdown - 19_000.0 / 110_000.0).abs() < 1e-12);

        state.mark("VNM", d(150));
        state.record_equity(day(4));
        assert!((state.max_drawdown - 19_000.0 / 110_000.0).abs() < 1e-12);
        assert_eq!(state.equity_curve.len(), 3);
    }

    #[test]
    fn same_day_record_replaces() {
        let mut state = BacktestState::new(d(1000));
        state.record_equity(day(2));
        state.cash = d(990);
        state.record_equity(day(2));
        assert_eq!(state.equity_curve.len(), 1);
        assert_eq!(state.equity_curve[0].equity, d(990));
        assert!((state.max_drawdown - 0.01).abs() < 1e-12);
    }

    #[test]
    fn remove_position() {
        let mut state = BacktestState::new(d(1000));
        state.add_position(sample_position("VNM", 1, 10));
        assert!(state.has_position("VNM"));
        assert!(state.remove_position("VNM").is_some());
        assert!(!state.has_position("VNM"));
        assert!(state.get_position("VNM").is_none());
    }
}
