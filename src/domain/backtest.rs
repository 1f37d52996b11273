//! Day-by-day backtest simulator.
//!
//! Walks calendar days from `start_date` to `end_date` inclusive, skipping
//! weekends. On each day every configured symbol with a price row is marked
//! to market and asked for a signal, in configuration order. At the end any
//! open position is closed at its latest price on or before `end_date`.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::domain::error::StocklensError;
use crate::domain::execution::{self, EntryResult, ExecutionConfig};
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::{BacktestState, EquityPoint};
use crate::domain::position::{ClosedTrade, ExitReason};
use crate::domain::price_history::SymbolHistory;
use crate::domain::strategy::{StrategyConfig, TradeSignal};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    pub commission_rate: Decimal,
    pub risk_per_trade: Decimal,
    pub allow_add_to_position: bool,
    pub symbols: Vec<String>,
    pub strategy: StrategyConfig,
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
            risk_per_trade: self.risk_per_trade,
            allow_add_to_position: self.allow_add_to_position,
        }
    }

    /// Calendar days covered by the run, inclusive.
    pub fn span_days(&self) -> usize {
        ((self.end_date - self.start_date).num_days() + 1).max(0) as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub final_capital: Decimal,
    pub total_return: f64,
    pub annual_return: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub sharpe_like: f64,
    pub trade_log: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
    /// Set when the run stopped early on its cancellation flag.
    pub cancelled: bool,
}

impl BacktestResult {
    fn from_state(state: BacktestState, config: &BacktestConfig, cancelled: bool) -> Self {
        let metrics = Metrics::compute(&state, config.start_date, config.end_date);
        BacktestResult {
            final_capital: metrics.final_capital,
            total_return: metrics.total_return,
            annual_return: metrics.annualized_return,
            max_drawdown: metrics.max_drawdown,
            total_trades: metrics.total_trades,
            win_rate: metrics.win_rate,
            profit_factor: metrics.profit_factor,
            sharpe_like: metrics.sharpe_like,
            trade_log: state.closed_trades,
            equity_curve: state.equity_curve,
            metrics,
            cancelled,
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn validate(config: &BacktestConfig) -> Result<(), StocklensError> {
    if config.start_date > config.end_date {
        return Err(StocklensError::invalid(
            "start_date",
            format!("{} is after end_date {}", config.start_date, config.end_date),
        ));
    }
    if config.initial_capital <= Decimal::ZERO {
        return Err(StocklensError::invalid("initial_capital", "must be positive"));
    }
    if config.symbols.is_empty() {
        return Err(StocklensError::invalid("symbols", "no symbols to backtest"));
    }
    Ok(())
}

/// Fetch every symbol's history once, in configuration order. Symbols whose
/// data cannot be read are skipped.
fn load_histories(config: &BacktestConfig, data: &dyn DataPort) -> Vec<SymbolHistory> {
    let max_points = config.span_days() + config.strategy.required_history();
    let mut histories = Vec::with_capacity(config.symbols.len());
    for symbol in &config.symbols {
        match data.get_price_window(symbol, config.end_date, max_points) {
            Ok(mut points) => {
                points.reverse();
                histories.push(SymbolHistory::new(symbol.clone(), points));
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "skipping symbol"),
        }
    }
    histories
}

fn process_symbol(
    state: &mut BacktestState,
    history: &SymbolHistory,
    index: usize,
    config: &BacktestConfig,
    execution: &ExecutionConfig,
) {
    let bar = &history.points[index];
    state.mark(&history.symbol, bar.close);

    match config.strategy.signal(history.through(index)) {
        TradeSignal::Buy => {
            match execution::enter_long(state, &history.symbol, bar.close, bar.date, execution) {
                EntryResult::Entered {
                    quantity, price, ..
                } => {
                    debug!(symbol = %history.symbol, date = %bar.date, quantity, %price, "entered");
                }
                EntryResult::Rejected { reason } => {
                    debug!(symbol = %history.symbol, date = %bar.date, ?reason, "entry rejected");
                }
            }
        }
        TradeSignal::Sell => {
            if let Some(trade) = execution::exit_position(
                state,
                &history.symbol,
                bar.close,
                bar.date,
                ExitReason::Signal,
                execution,
            ) {
                debug!(symbol = %trade.symbol, date = %bar.date, pnl = %trade.pnl, "exited");
            }
        }
        TradeSignal::Hold => {}
    }
}

/// Close whatever is still open at the latest price on or before `end_date`.
fn liquidate(
    state: &mut BacktestState,
    histories: &[SymbolHistory],
    config: &BacktestConfig,
    execution: &ExecutionConfig,
) {
    for history in histories {
        if !state.has_position(&history.symbol) {
            continue;
        }
        let Some(bar) = history.last_on_or_before(config.end_date) else {
            continue;
        };
        execution::exit_position(
            state,
            &history.symbol,
            bar.close,
            bar.date,
            ExitReason::EndOfPeriod,
            execution,
        );
    }
}

/// Replay `config.strategy` over the configured window.
///
/// `cancel` is checked at the top of every simulated day. A cancelled run
/// returns what it has so far with `cancelled` set and positions left open.
pub fn run_backtest(
    config: &BacktestConfig,
    data: &dyn DataPort,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, StocklensError> {
    validate(config)?;
    let execution = config.execution();
    let histories = load_histories(config, data);

    info!(
        strategy = %config.strategy.name,
        symbols = histories.len(),
        start = %config.start_date,
        end = %config.end_date,
        "starting backtest"
    );

    let mut state = BacktestState::new(config.initial_capital);
    let mut cancelled = false;
    let mut date = config.start_date;

    while date <= config.end_date {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            cancelled = true;
            info!(%date, "backtest cancelled");
            break;
        }

        if !is_weekend(date) {
            let mut traded = false;
            for history in &histories {
                if let Some(index) = history.index_of(date) {
                    traded = true;
                    process_symbol(&mut state, history, index, config, &execution);
                }
            }
            if traded {
                state.record_equity(date);
            }
        }

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    if !cancelled && !state.positions.is_empty() {
        liquidate(&mut state, &histories, config, &execution);
        let last = state
            .equity_curve
            .last()
            .map(|p| p.date)
            .unwrap_or(config.end_date);
        state.record_equity(last);
    }

    let result = BacktestResult::from_state(state, config, cancelled);
    info!(
        trades = result.total_trades,
        final_capital = %result.final_capital,
        total_return = result.total_return,
        "backtest finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            initial_capital: Decimal::from(100_000_000),
            commission_rate: Decimal::new(15, 4),
            risk_per_trade: Decimal::new(1, 1),
            allow_add_to_position: false,
            symbols: vec!["VNM".into()],
            strategy: StrategyConfig::from_json("sma", "sma_crossover", &json!({})).unwrap(),
        }
    }

    #[test]
    fn span_days_is_inclusive() {
        assert_eq!(sample_config().span_days(), 31);
    }

    #[test]
    fn execution_config_from_backtest() {
        let exec = sample_config().execution();
        assert_eq!(exec.commission_rate, Decimal::new(15, 4));
        assert!(!exec.allow_add_to_position);
    }

    #[test]
    fn weekend_detection() {
        // 2024-01-06 is a Saturday
        assert!(is_weekend(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));
    }

    #[test]
    fn rejects_inverted_range() {
        let config = BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ..sample_config()
        };
        assert!(matches!(
            validate(&config),
            Err(StocklensError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn rejects_empty_universe() {
        let config = BacktestConfig {
            symbols: Vec::new(),
            ..sample_config()
        };
        assert!(validate(&config).is_err());
    }
}
