//! Core domain types and logic.

pub mod backtest;
pub mod condition;
pub mod condition_eval;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod live;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod price;
pub mod price_history;
pub mod relative_strength;
pub mod screener;
pub mod signal;
pub mod snapshot;
pub mod strategy;
pub mod universe;
