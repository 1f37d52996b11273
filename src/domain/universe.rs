//! Symbol universe: parsing the configured symbol list and checking that
//! each symbol has enough price history to be worth running.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::domain::error::StocklensError;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma separated list into upper-cased symbols, preserving order.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct UniverseCheck {
    pub ready: Vec<(String, usize)>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Count the bars each symbol has at or before `as_of`, up to `needed`.
///
/// Fails only when no symbol at all has enough history.
pub fn check_universe(
    data: &dyn DataPort,
    symbols: &[String],
    as_of: NaiveDate,
    needed: usize,
) -> Result<UniverseCheck, StocklensError> {
    let mut check = UniverseCheck::default();

    for symbol in symbols {
        let bars = match data.get_price_window(symbol, as_of, needed) {
            Ok(window) => window.len(),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "no price data");
                check.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars == 0 {
            check.skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::NoData,
            });
        } else if bars < needed {
            warn!(symbol = %symbol, bars, needed, "not enough history");
            check.skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::InsufficientBars { bars },
            });
        } else {
            check.ready.push((symbol.clone(), bars));
        }
    }

    if check.ready.is_empty() {
        let available = check
            .skipped
            .iter()
            .map(|s| match s.reason {
                SkipReason::InsufficientBars { bars } => bars,
                SkipReason::NoData => 0,
            })
            .max()
            .unwrap_or(0);
        return Err(StocklensError::InsufficientData { needed, available });
    }

    info!(
        ready = check.ready.len(),
        skipped = check.skipped.len(),
        "universe checked"
    );
    Ok(check)
}
