//! Live polling cycle over the latest snapshots.
//!
//! A cycle evaluates one built-in strategy for every symbol. Cycles never
//! overlap: one requested while another is running is skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::domain::error::StocklensError;
use crate::domain::signal::{Direction, StrategyKind, StrategySignal};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct LiveSignal {
    pub symbol: String,
    pub signal: StrategySignal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(Vec<LiveSignal>),
    Skipped,
}

pub struct LivePoller {
    data: Arc<dyn DataPort + Send + Sync>,
    strategy: StrategyKind,
    running: AtomicBool,
}

/// Clears the running flag however the cycle ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LivePoller {
    pub fn new(data: Arc<dyn DataPort + Send + Sync>, strategy: StrategyKind) -> Self {
        Self {
            data,
            strategy,
            running: AtomicBool::new(false),
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn run_cycle(&self) -> Result<CycleOutcome, StocklensError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("previous cycle still running, skipping");
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = RunningGuard(&self.running);

        let snapshots = self.data.get_all_indicator_snapshots()?;
        let mut signals: Vec<LiveSignal> = snapshots
            .into_iter()
            .map(|(symbol, snap)| LiveSignal {
                symbol,
                signal: self.strategy.evaluate(&snap),
            })
            .filter(|s| s.signal.direction != Direction::Hold)
            .collect();
        signals.sort_by(|a, b| {
            b.signal
                .strength
                .total_cmp(&a.signal.strength)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        info!(strategy = %self.strategy, signals = signals.len(), "live cycle complete");
        Ok(CycleOutcome::Completed(signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use crate::domain::signal::test_support::{bearish_snapshot, bullish_snapshot};
    use crate::domain::snapshot::IndicatorSnapshot;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::mpsc::{Receiver, Sender, channel};
    use std::thread;

    struct SnapshotPort {
        snapshots: HashMap<String, IndicatorSnapshot>,
        entered: Option<Sender<()>>,
        release: Option<Mutex<Receiver<()>>>,
    }

    impl DataPort for SnapshotPort {
        fn get_price_window(
            &self,
            _symbol: &str,
            _as_of: NaiveDate,
            _max_points: usize,
        ) -> Result<Vec<PricePoint>, StocklensError> {
            Ok(Vec::new())
        }

        fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
            Ok(self.snapshots.keys().cloned().collect())
        }

        fn get_indicator_snapshot(&self, symbol: &str) -> Result<IndicatorSnapshot, StocklensError> {
            self.snapshots
                .get(symbol)
                .cloned()
                .ok_or_else(|| StocklensError::not_found("symbol", symbol))
        }

        fn get_all_indicator_snapshots(
            &self,
        ) -> Result<HashMap<String, IndicatorSnapshot>, StocklensError> {
            if let Some(tx) = &self.entered {
                let _ = tx.send(());
            }
            if let Some(rx) = &self.release {
                let _ = rx.lock().unwrap().recv();
            }
            Ok(self.snapshots.clone())
        }
    }

    fn snapshots() -> HashMap<String, IndicatorSnapshot> {
        let mut map = HashMap::new();
        map.insert("BULL".to_string(), bullish_snapshot());
        map.insert("BEAR".to_string(), bearish_snapshot());
        map
    }

    #[test]
    fn cycle_returns_signals_best_first() {
        let port = SnapshotPort {
            snapshots: snapshots(),
            entered: None,
            release: None,
        };
        let poller = LivePoller::new(Arc::new(port), StrategyKind::TrendFollowing);
        let CycleOutcome::Completed(signals) = poller.run_cycle().unwrap() else {
            panic!("cycle skipped");
        };
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].symbol, "BULL");
        assert_eq!(signals[0].signal.direction, Direction::StrongBuy);
        assert_eq!(signals[1].signal.direction, Direction::StrongSell);
        assert!(!poller.is_running());
    }

    #[test]
    fn overlapping_cycle_is_skipped() {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let port = SnapshotPort {
            snapshots: snapshots(),
            entered: Some(entered_tx),
            release: Some(Mutex::new(release_rx)),
        };
        let poller = Arc::new(LivePoller::new(Arc::new(port), StrategyKind::Composite));

        let background = {
            let poller = Arc::clone(&poller);
            thread::spawn(move || poller.run_cycle())
        };
        entered_rx.recv().unwrap();
        assert!(poller.is_running());
        assert_eq!(poller.run_cycle().unwrap(), CycleOutcome::Skipped);

        release_tx.send(()).unwrap();
        let first = background.join().unwrap().unwrap();
        assert!(matches!(first, CycleOutcome::Completed(_)));
        assert!(!poller.is_running());
    }
}
