#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use std::collections::HashMap;

use stocklens::domain::condition::{
    GroupConfig, LogicalOperator, Operator, SignalCondition, SignalConditionGroup, SignalRule,
    SignalTemplate, SignalType, TemplateCategory,
};
use stocklens::domain::error::StocklensError;
use stocklens::domain::price::PricePoint;
use stocklens::domain::relative_strength::apply_ranks;
use stocklens::domain::snapshot::{IndicatorSnapshot, build_snapshot};
use stocklens::ports::data_port::DataPort;
use stocklens::ports::signal_store_port::SignalStorePort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive weekdays starting at `start` (or the next weekday).
pub fn weekdays_from(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut d = start;
    while dates.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(d);
        }
        d = d.succ_opt().unwrap();
    }
    dates
}

pub fn make_point(symbol: &str, date: NaiveDate, close: i64) -> PricePoint {
    let close = Decimal::from(close);
    PricePoint {
        symbol: symbol.to_string(),
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000,
        value: close * Decimal::from(1000),
    }
}

/// One point per weekday from `start`, in chronological order.
pub fn make_series(symbol: &str, start: NaiveDate, closes: &[i64]) -> Vec<PricePoint> {
    weekdays_from(start, closes.len())
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| make_point(symbol, d, c))
        .collect()
}

/// Price data served from memory. Snapshots are either given explicitly or
/// derived from the stored points the same way the CSV adapter does.
#[derive(Default)]
pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub snapshots: HashMap<String, IndicatorSnapshot>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_snapshot(mut self, snapshot: IndicatorSnapshot) -> Self {
        self.snapshots.insert(snapshot.symbol.clone(), snapshot);
        self
    }
}

impl DataPort for MockDataPort {
    fn get_price_window(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        max_points: usize,
    ) -> Result<Vec<PricePoint>, StocklensError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StocklensError::Data {
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(symbol)
            .ok_or_else(|| StocklensError::not_found("symbol", symbol))?;
        Ok(points
            .iter()
            .rev()
            .filter(|p| p.date <= as_of)
            .take(max_points)
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .chain(self.snapshots.keys())
            .cloned()
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn get_indicator_snapshot(&self, symbol: &str) -> Result<IndicatorSnapshot, StocklensError> {
        self.get_all_indicator_snapshots()?
            .remove(symbol)
            .ok_or_else(|| StocklensError::not_found("symbol", symbol))
    }

    fn get_all_indicator_snapshots(
        &self,
    ) -> Result<HashMap<String, IndicatorSnapshot>, StocklensError> {
        if !self.snapshots.is_empty() {
            return Ok(self.snapshots.clone());
        }
        let mut snapshots = HashMap::new();
        for (symbol, points) in &self.data {
            if let Ok(snap) = build_snapshot(points) {
                snapshots.insert(symbol.clone(), snap);
            }
        }
        apply_ranks(&mut snapshots, &self.data);
        Ok(snapshots)
    }
}

#[derive(Default)]
pub struct MockSignalStore {
    pub groups: HashMap<i64, SignalConditionGroup>,
    pub rules: HashMap<i64, SignalRule>,
    pub templates: HashMap<i64, SignalTemplate>,
}

impl MockSignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: SignalConditionGroup) -> Self {
        self.groups.insert(group.id, group);
        self
    }

    pub fn with_rule(mut self, rule: SignalRule) -> Self {
        self.rules.insert(rule.id, rule);
        self
    }

    pub fn with_template(mut self, template: SignalTemplate) -> Self {
        self.templates.insert(template.id, template);
        self
    }
}

impl SignalStorePort for MockSignalStore {
    fn load_condition_group(&self, id: i64) -> Result<SignalConditionGroup, StocklensError> {
        self.groups
            .get(&id)
            .cloned()
            .ok_or_else(|| StocklensError::not_found("condition group", id))
    }

    fn load_signal_rule(&self, id: i64) -> Result<SignalRule, StocklensError> {
        self.rules
            .get(&id)
            .cloned()
            .ok_or_else(|| StocklensError::not_found("signal rule", id))
    }

    fn load_signal_template(&self, id: i64) -> Result<SignalTemplate, StocklensError> {
        self.templates
            .get(&id)
            .cloned()
            .ok_or_else(|| StocklensError::not_found("signal template", id))
    }
}

pub fn condition(indicator: &str, op: &str, value: f64, weight: f64) -> SignalCondition {
    SignalCondition {
        id: 0,
        indicator: indicator.to_string(),
        operator: Operator::from(op),
        value,
        value2: None,
        compare_indicator: None,
        weight,
        is_required: false,
        logical_operator: LogicalOperator::And,
        order_index: 0,
    }
}

pub fn group(id: i64, conditions: Vec<SignalCondition>) -> SignalConditionGroup {
    SignalConditionGroup {
        id,
        name: format!("group {id}"),
        conditions,
        priority: 0,
    }
}

pub fn rule(id: i64, min_score: f64, group_ids: &[(i64, bool)]) -> SignalRule {
    SignalRule {
        id,
        name: format!("rule {id}"),
        signal_type: SignalType::Buy,
        min_score,
        group_configs: group_ids
            .iter()
            .map(|&(group_id, required)| GroupConfig {
                group_id,
                required,
                logic: LogicalOperator::And,
            })
            .collect(),
        target_percent: 10.0,
        stop_loss_percent: 5.0,
    }
}

pub fn template(id: i64, category: TemplateCategory, conditions: Vec<SignalCondition>) -> SignalTemplate {
    SignalTemplate {
        id,
        name: format!("template {id}"),
        category,
        conditions,
    }
}

/// Snapshot with the fields screening tests vary.
pub fn snapshot(symbol: &str, rsi: i64, volume_ratio: Decimal, trading_value: i64) -> IndicatorSnapshot {
    IndicatorSnapshot {
        symbol: symbol.to_string(),
        date: Some(date(2024, 6, 28)),
        current_price: Decimal::from(50_000),
        volume: 100_000,
        bars: 250,
        rsi: Some(Decimal::from(rsi)),
        volume_ratio: Some(volume_ratio),
        avg_trading_value: Decimal::from(trading_value),
        ..Default::default()
    }
}
