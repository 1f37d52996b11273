//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_signal_store::JsonSignalStore;
use crate::domain::backtest::{BacktestResult, run_backtest};
use crate::domain::condition::RuleSignal;
use crate::domain::config_validation::{
    build_backtest_config, build_live_settings, build_screener_config, build_strategy_config,
    data_dir, signal_store_path, validate_backtest_config,
};
use crate::domain::error::StocklensError;
use crate::domain::live::{CycleOutcome, LivePoller};
use crate::domain::screener::{ScreenTarget, screen_all_symbols};
use crate::domain::signal::{StrategySignal, generate_strategy_signal};
use crate::domain::universe::{SkipReason, UniverseCheck, check_universe};
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "stocklens", about = "Stock indicators, signals, screening and backtests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Signal rule id from the signal store
    #[arg(long)]
    pub rule: Option<i64>,
    /// Signal template id from the signal store
    #[arg(long)]
    pub template: Option<i64>,
}

impl TargetArgs {
    pub fn target(&self) -> Option<ScreenTarget> {
        match (self.rule, self.template) {
            (Some(id), _) => Some(ScreenTarget::Rule(id)),
            (None, Some(id)) => Some(ScreenTarget::Template(id)),
            (None, None) => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Screen every symbol with a rule or template
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        min_trading_value: Option<Decimal>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Evaluate one built-in strategy for one symbol
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        symbol: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Poll the latest snapshots with a built-in strategy
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,
    },
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Backtest { config, .. }
            | Command::Screen { config, .. }
            | Command::Signal { config, .. }
            | Command::Validate { config }
            | Command::Watch { config, .. } => config,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let adapter = match load_config(cli.command.config_path()) {
        Ok(a) => a,
        Err(e) => {
            init_logging(None);
            return fail(&e);
        }
    };
    init_logging(adapter.get_string("logging", "level").as_deref());

    let outcome = match &cli.command {
        Command::Backtest { json, .. } => run_backtest_command(&adapter, *json),
        Command::Screen {
            target,
            min_trading_value,
            limit,
            ..
        } => match target.target() {
            Some(target) => run_screen_command(&adapter, target, *min_trading_value, *limit),
            None => Err(StocklensError::invalid("target", "pass --rule or --template")),
        },
        Command::Signal {
            strategy, symbol, ..
        } => run_signal_command(&adapter, strategy, symbol),
        Command::Validate { .. } => run_validate_command(&adapter),
        Command::Watch { cycles, .. } => run_watch_command(&adapter, *cycles),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn fail(err: &StocklensError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StocklensError> {
    FileConfigAdapter::from_file(path)
}

fn csv_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, StocklensError> {
    Ok(CsvAdapter::new(data_dir(config)?))
}

fn multi_thread_runtime() -> Result<tokio::runtime::Runtime, StocklensError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?)
}

pub fn execute_backtest(config: &dyn ConfigPort) -> Result<BacktestResult, StocklensError> {
    let bt_config = build_backtest_config(config)?;
    let data = csv_adapter(config)?;
    run_backtest(&bt_config, &data, None)
}

fn run_backtest_command(config: &dyn ConfigPort, json: bool) -> Result<(), StocklensError> {
    let result = execute_backtest(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("=== Backtest Results ===");
    println!("Final Capital:    {}", result.final_capital.round_dp(0));
    println!("Total Return:     {:.2}%", result.total_return * 100.0);
    println!("Annualized:       {:.2}%", result.annual_return * 100.0);
    println!("Max Drawdown:     -{:.1}%", result.max_drawdown * 100.0);
    println!("Total Trades:     {}", result.total_trades);
    println!("Win Rate:         {:.1}%", result.win_rate * 100.0);
    println!("Profit Factor:    {:.2}", result.profit_factor);
    println!("Sharpe-like:      {:.2}", result.sharpe_like);
    println!("Commission Paid:  {}", result.metrics.total_commission.round_dp(0));

    if !result.trade_log.is_empty() {
        println!("\n=== Trades ===");
        for t in &result.trade_log {
            let sign = if t.pnl >= Decimal::ZERO { "+" } else { "" };
            println!(
                "  {} x{}  {} @ {} -> {} @ {}  {}{} [{:?}]",
                t.symbol,
                t.quantity,
                t.entry_date,
                t.entry_price.round_dp(2),
                t.exit_date,
                t.exit_price.round_dp(2),
                sign,
                t.pnl.round_dp(0),
                t.exit_reason,
            );
        }
    }
    Ok(())
}

pub fn execute_screen(
    config: &dyn ConfigPort,
    target: ScreenTarget,
    min_trading_value: Option<Decimal>,
    limit: Option<usize>,
) -> Result<Vec<RuleSignal>, StocklensError> {
    let mut screener = build_screener_config(config)?;
    if let Some(v) = min_trading_value {
        screener.min_trading_value = v;
    }
    if let Some(n) = limit {
        screener.limit = n;
    }

    let store = JsonSignalStore::from_file(signal_store_path(config)?)?;
    let data: Arc<dyn DataPort + Send + Sync> = Arc::new(csv_adapter(config)?);

    let runtime = multi_thread_runtime()?;
    runtime.block_on(screen_all_symbols(data, &store, target, &screener, None))
}

fn run_screen_command(
    config: &dyn ConfigPort,
    target: ScreenTarget,
    min_trading_value: Option<Decimal>,
    limit: Option<usize>,
) -> Result<(), StocklensError> {
    let signals = execute_screen(config, target, min_trading_value, limit)?;
    if signals.is_empty() {
        println!("No symbols matched.");
        return Ok(());
    }

    println!(
        "{:<8} {:<12} {:>7} {:>6} {:>12} {:>12}",
        "SYMBOL", "SIGNAL", "SCORE", "CONF", "TARGET", "STOP"
    );
    for s in &signals {
        println!(
            "{:<8} {:<12} {:>7.1} {:>5.0}% {:>12} {:>12}",
            s.symbol,
            s.signal_type.to_string(),
            s.score,
            s.confidence * 100.0,
            s.target_price.map(|p| p.round_dp(0).to_string()).unwrap_or_default(),
            s.stop_loss.map(|p| p.round_dp(0).to_string()).unwrap_or_default(),
        );
    }
    Ok(())
}

pub fn execute_signal(
    config: &dyn ConfigPort,
    strategy: &str,
    symbol: &str,
) -> Result<StrategySignal, StocklensError> {
    let data = csv_adapter(config)?;
    let snapshot = data.get_indicator_snapshot(&symbol.trim().to_uppercase())?;
    generate_strategy_signal(strategy, &snapshot)
}

fn print_signal(symbol: &str, signal: &StrategySignal) {
    println!(
        "{symbol}: {} via {} (strength {:.1}, confidence {:.2})",
        signal.direction, signal.strategy, signal.strength, signal.confidence
    );
    if let (Some(target), Some(stop)) = (signal.target_price, signal.stop_loss) {
        println!("  target {}  stop {}", target.round_dp(0), stop.round_dp(0));
    }
    for reason in &signal.reasons {
        println!("  - {reason}");
    }
}

fn run_signal_command(
    config: &dyn ConfigPort,
    strategy: &str,
    symbol: &str,
) -> Result<(), StocklensError> {
    let signal = execute_signal(config, strategy, symbol)?;
    print_signal(&symbol.trim().to_uppercase(), &signal);
    Ok(())
}

/// Check every section that is present. Price data is only inspected when
/// `[data] dir` is configured.
pub fn execute_validate(config: &dyn ConfigPort) -> Result<Option<UniverseCheck>, StocklensError> {
    validate_backtest_config(config)?;
    let backtest = build_backtest_config(config)?;
    build_strategy_config(config)?;
    build_screener_config(config)?;
    build_live_settings(config)?;

    if config.get_string("data", "dir").is_none() {
        return Ok(None);
    }
    let data = csv_adapter(config)?;
    let needed = backtest.strategy.required_history();
    check_universe(&data, &backtest.symbols, backtest.end_date, needed).map(Some)
}

fn run_validate_command(config: &dyn ConfigPort) -> Result<(), StocklensError> {
    let check = execute_validate(config)?;
    println!("Config validated successfully");

    if let Some(check) = check {
        println!("\nUniverse:");
        for (symbol, bars) in &check.ready {
            println!("  {symbol}: {bars} bars [OK]");
        }
        for skipped in &check.skipped {
            match skipped.reason {
                SkipReason::NoData => println!("  {}: no data [SKIP]", skipped.symbol),
                SkipReason::InsufficientBars { bars } => {
                    println!("  {}: only {bars} bars [SKIP]", skipped.symbol)
                }
            }
        }
    }
    Ok(())
}

fn run_watch_command(config: &dyn ConfigPort, cycles: Option<u64>) -> Result<(), StocklensError> {
    let settings = build_live_settings(config)?;
    let data: Arc<dyn DataPort + Send + Sync> = Arc::new(csv_adapter(config)?);
    let poller = Arc::new(LivePoller::new(data, settings.strategy));
    let runtime = multi_thread_runtime()?;

    runtime.block_on(watch(poller, settings.interval, cycles))
}

/// Tick on `period`; each tick starts a cycle on the blocking pool. A tick
/// that lands while the previous cycle is still running is skipped by the
/// poller itself.
async fn watch(
    poller: Arc<LivePoller>,
    period: Duration,
    cycles: Option<u64>,
) -> Result<(), StocklensError> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(strategy = %poller.strategy(), period_secs = period.as_secs(), "watching");

    let mut handles = Vec::new();
    let mut count = 0u64;
    loop {
        if cycles.is_some_and(|n| count >= n) {
            break;
        }
        ticker.tick().await;
        count += 1;

        let poller = Arc::clone(&poller);
        handles.push(tokio::task::spawn_blocking(move || {
            match poller.run_cycle() {
                Ok(CycleOutcome::Completed(signals)) => {
                    println!("--- cycle: {} signals ---", signals.len());
                    for s in &signals {
                        print_signal(&s.symbol, &s.signal);
                    }
                }
                Ok(CycleOutcome::Skipped) => {}
                Err(e) => warn!(error = %e, "live cycle failed"),
            }
        }));
        handles.retain(|h| !h.is_finished());
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "live cycle task failed");
        }
    }
    Ok(())
}
