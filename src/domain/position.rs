//! Open positions and closed trades.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A long holding. Only exists while `quantity > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    /// Total cost of the shares, excluding commission.
    pub cost_basis: Decimal,
    pub entry_commission: Decimal,
    pub entry_date: NaiveDate,
    pub current_price: Decimal,
}

impl Position {
    pub fn entry_price(&self) -> Decimal {
        if self.quantity == 0 {
            return Decimal::ZERO;
        }
        self.cost_basis / Decimal::from(self.quantity)
    }

    pub fn market_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.current_price
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.market_value() - self.cost_basis
    }

    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    EndOfPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_commission: Decimal,
    pub exit_commission: Decimal,
    /// Price difference times quantity, before commissions.
    pub gross_pnl: Decimal,
    /// Gross PnL less both commissions.
    pub pnl: Decimal,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    pub fn commissions(&self) -> Decimal {
        self.entry_commission + self.exit_commission
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            symbol: "VNM".into(),
            quantity: 100,
            cost_basis: Decimal::from(5000),
            entry_commission: Decimal::new(75, 1),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            current_price: Decimal::from(50),
        }
    }

    #[test]
    fn entry_price_from_cost_basis() {
        assert_eq!(sample_position().entry_price(), Decimal::from(50));
    }

    #[test]
    fn mark_to_market() {
        let mut pos = sample_position();
        pos.mark(Decimal::from(55));
        assert_eq!(pos.market_value(), Decimal::from(5500));
        assert_eq!(pos.unrealized_pnl(), Decimal::from(500));

        pos.mark(Decimal::from(45));
        assert_eq!(pos.unrealized_pnl(), Decimal::from(-500));
    }

    #[test]
    fn trade_commissions_and_duration() {
        let trade = ClosedTrade {
            symbol: "VNM".into(),
            quantity: 100,
            entry_price: Decimal::from(50),
            exit_price: Decimal::from(55),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
            entry_commission: Decimal::new(75, 1),
            exit_commission: Decimal::new(825, 2),
            gross_pnl: Decimal::from(500),
            pnl: Decimal::new(48425, 2),
            exit_reason: ExitReason::Signal,
        };
        assert_eq!(trade.commissions(), Decimal::new(1575, 2));
        assert_eq!(trade.holding_days(), 10);
    }
}
