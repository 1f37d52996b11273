//! Simulated order execution.
//!
//! Fills happen at the day's close. Sizing risks a fixed fraction of cash
//! and commission is a flat rate on gross notional, charged on both legs.
//! An order that cannot be sized or funded is rejected and leaves the state
//! untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::portfolio::BacktestState;
use super::position::{ClosedTrade, ExitReason, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: Decimal,
    pub risk_per_trade: Decimal,
    pub allow_add_to_position: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: Decimal::new(15, 4),
            risk_per_trade: Decimal::new(1, 1),
            allow_add_to_position: false,
        }
    }
}

pub fn calculate_commission(notional: Decimal, config: &ExecutionConfig) -> Decimal {
    notional * config.commission_rate
}

/// floor(cash × risk / price), zero for a non-positive price.
pub fn position_size(cash: Decimal, price: Decimal, config: &ExecutionConfig) -> i64 {
    if price <= Decimal::ZERO || cash <= Decimal::ZERO {
        return 0;
    }
    (cash * config.risk_per_trade / price)
        .floor()
        .to_i64()
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyHolding,
    ZeroQuantity,
    InsufficientCash,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: i64,
        price: Decimal,
        cost: Decimal,
        commission: Decimal,
    },
    Rejected {
        reason: RejectReason,
    },
}

/// Buy at `price`, opening a position or adding to one when allowed.
pub fn enter_long(
    state: &mut BacktestState,
    symbol: &str,
    price: Decimal,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    if state.has_position(symbol) && !config.allow_add_to_position {
        return EntryResult::Rejected {
            reason: RejectReason::AlreadyHolding,
        };
    }

    let quantity = position_size(state.cash, price, config);
    if quantity <= 0 {
        return EntryResult::Rejected {
            reason: RejectReason::ZeroQuantity,
        };
    }

    let cost = Decimal::from(quantity) * price;
    let commission = calculate_commission(cost, config);
    if cost + commission > state.cash {
        return EntryResult::Rejected {
            reason: RejectReason::InsufficientCash,
        };
    }

    state.cash -= cost + commission;

    match state.positions.get_mut(symbol) {
        Some(existing) => {
            existing.quantity += quantity;
            existing.cost_basis += cost;
            existing.entry_commission += commission;
            existing.mark(price);
        }
        None => state.add_position(Position {
            symbol: symbol.to_string(),
            quantity,
            cost_basis: cost,
            entry_commission: commission,
            entry_date: date,
            current_price: price,
        }),
    }

    EntryResult::Entered {
        quantity,
        price,
        cost,
        commission,
    }
}

/// Sell the whole position at `price` and record the closed trade.
pub fn exit_position(
    state: &mut BacktestState,
    symbol: &str,
    price: Decimal,
    date: NaiveDate,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<ClosedTrade> {
    let position = state.remove_position(symbol)?;

    let exit_value = Decimal::from(position.quantity) * price;
    let exit_commission = calculate_commission(exit_value, config);
    let gross_pnl = exit_value - position.cost_basis;

    state.cash += exit_value - exit_commission;

    let trade = ClosedTrade {
        symbol: position.symbol.clone(),
        quantity: position.quantity,
        entry_price: position.entry_price(),
        exit_price: price,
        entry_date: position.entry_date,
        exit_date: date,
        entry_commission: position.entry_commission,
        exit_commission,
        gross_pnl,
        pnl: gross_pnl - position.entry_commission - exit_commission,
        exit_reason: reason,
    };
    state.record_trade(trade.clone());
    Some(trade)
}
