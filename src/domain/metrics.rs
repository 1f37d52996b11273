//! Performance metrics for a finished run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::portfolio::BacktestState;

const DAYS_PER_YEAR: f64 = 365.0;
const SHARPE_LIKE_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub final_capital: Decimal,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub total_commission: Decimal,
    /// total_return / (max_drawdown + 0.01). Not a risk-adjusted Sharpe.
    pub sharpe_like: f64,
}

impl Metrics {
    pub fn compute(state: &BacktestState, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let initial = state.initial_capital;
        let final_capital = state.equity();

        let total_return = if initial > Decimal::ZERO {
            ((final_capital - initial) / initial).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let days = (end_date - start_date).num_days().max(1) as f64;
        let annualized_return = if total_return <= -1.0 {
            -1.0
        } else {
            (1.0 + total_return).powf(DAYS_PER_YEAR / days) - 1.0
        };

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut gross_win = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut total_commission = Decimal::ZERO;

        for trade in &state.closed_trades {
            total_commission += trade.commissions();
            if trade.pnl > Decimal::ZERO {
                winning_trades += 1;
                gross_win += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                losing_trades += 1;
                gross_loss += trade.pnl.abs();
            }
        }

        let total_trades = state.closed_trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > Decimal::ZERO {
            (gross_win / gross_loss).to_f64().unwrap_or(0.0)
        } else if gross_win > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            gross_win / Decimal::from(winning_trades)
        } else {
            Decimal::ZERO
        };
        let avg_loss = if losing_trades > 0 {
            gross_loss / Decimal::from(losing_trades)
        } else {
            Decimal::ZERO
        };

        let max_drawdown = state.max_drawdown;

        Metrics {
            final_capital,
            total_return,
            annualized_return,
            max_drawdown,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            total_commission,
            sharpe_like: total_return / (max_drawdown + SHARPE_LIKE_FLOOR),
        }
    }
}
