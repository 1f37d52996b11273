//! Bulk screening of one rule or template across every tracked symbol.
//!
//! Snapshots are fetched once, filtered by average trading value, then
//! evaluated in spawned tasks gated by a semaphore. Fired signals are
//! collected behind a mutex and sorted best-first after all tasks finish,
//! so scheduling order never affects the result.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::domain::condition::{ResolvedRule, RuleSignal, SignalTemplate};
use crate::domain::condition_eval::{evaluate_rule, evaluate_template, resolve_rule};
use crate::domain::error::StocklensError;
use crate::domain::snapshot::IndicatorSnapshot;
use crate::ports::data_port::DataPort;
use crate::ports::signal_store_port::SignalStorePort;

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTarget {
    Rule(i64),
    Template(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerConfig {
    pub concurrency: usize,
    pub min_trading_value: Decimal,
    pub limit: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        ScreenerConfig {
            concurrency: DEFAULT_CONCURRENCY,
            min_trading_value: Decimal::ZERO,
            limit: 20,
        }
    }
}

/// The loaded rule or template shared by every worker.
#[derive(Debug, Clone)]
enum Evaluator {
    Rule(Arc<ResolvedRule>),
    Template(Arc<SignalTemplate>),
}

impl Evaluator {
    fn load(store: &dyn SignalStorePort, target: ScreenTarget) -> Result<Self, StocklensError> {
        Ok(match target {
            ScreenTarget::Rule(id) => Evaluator::Rule(Arc::new(resolve_rule(store, id)?)),
            ScreenTarget::Template(id) => {
                Evaluator::Template(Arc::new(store.load_signal_template(id)?))
            }
        })
    }

    fn evaluate(&self, snap: &IndicatorSnapshot) -> Option<RuleSignal> {
        match self {
            Evaluator::Rule(rule) => evaluate_rule(rule, snap),
            Evaluator::Template(template) => evaluate_template(template, snap),
        }
    }

    /// Rules rank by score, templates by confidence.
    fn sort(&self, signals: &mut [RuleSignal]) {
        match self {
            Evaluator::Rule(_) => signals.sort_by(|a, b| b.score.total_cmp(&a.score)),
            Evaluator::Template(_) => {
                signals.sort_by(|a, b| b.confidence.total_cmp(&a.confidence))
            }
        }
    }
}

/// Screen every symbol the data port knows about.
///
/// A missing rule, template or group aborts the screen. Symbols below
/// `min_trading_value` are dropped before dispatch. Setting `cancel` stops
/// workers that have not started and turns the result into `Cancelled`.
pub async fn screen_all_symbols(
    data: Arc<dyn DataPort + Send + Sync>,
    store: &dyn SignalStorePort,
    target: ScreenTarget,
    config: &ScreenerConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<Vec<RuleSignal>, StocklensError> {
    let evaluator = Evaluator::load(store, target)?;
    let snapshots = data.get_all_indicator_snapshots()?;
    let total = snapshots.len();

    let candidates: Vec<IndicatorSnapshot> = snapshots
        .into_values()
        .filter(|s| s.avg_trading_value >= config.min_trading_value)
        .collect();
    info!(
        ?target,
        symbols = total,
        candidates = candidates.len(),
        concurrency = config.concurrency,
        "screening"
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let results: Arc<Mutex<Vec<RuleSignal>>> = Arc::new(Mutex::new(Vec::new()));
    let mut tasks = Vec::with_capacity(candidates.len());

    for snap in candidates {
        let permit = Arc::clone(&semaphore);
        let results = Arc::clone(&results);
        let evaluator = evaluator.clone();
        let cancel = cancel.clone();

        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = permit.acquire_owned().await else {
                return;
            };
            if cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                return;
            }
            match evaluator.evaluate(&snap) {
                Some(signal) => results.lock().await.push(signal),
                None => debug!(symbol = %snap.symbol, "no signal"),
            }
        }));
    }

    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "screening task failed");
        }
    }

    if cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
        return Err(StocklensError::Cancelled);
    }

    let mut signals = std::mem::take(&mut *results.lock().await);
    evaluator.sort(&mut signals);
    signals.truncate(config.limit);
    info!(fired = signals.len(), "screen finished");
    Ok(signals)
}
