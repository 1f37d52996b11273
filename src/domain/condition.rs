//! User-defined condition trees.
//!
//! Three layers, all authored outside the core and read here as plain data:
//! - `SignalCondition`: one comparison of a snapshot indicator
//! - `SignalConditionGroup`: conditions folded left to right
//! - `SignalRule` / `SignalTemplate`: groups (or a flat list) with a threshold

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::snapshot::IndicatorSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    CrossAbove,
    CrossBelow,
    /// Kept so a bad operator fails only its own condition.
    Unknown(String),
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => Operator::Eq,
            "neq" | "!=" | "<>" => Operator::Neq,
            "gt" | ">" => Operator::Gt,
            "gte" | ">=" => Operator::Gte,
            "lt" | "<" => Operator::Lt,
            "lte" | "<=" => Operator::Lte,
            "between" => Operator::Between,
            "cross_above" => Operator::CrossAbove,
            "cross_below" => Operator::CrossBelow,
            _ => Operator::Unknown(s),
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Operator::from(s.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::CrossAbove => "cross_above",
            Operator::CrossBelow => "cross_below",
            Operator::Unknown(raw) => raw,
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

impl LogicalOperator {
    pub fn apply(&self, acc: bool, next: bool) -> bool {
        match self {
            LogicalOperator::And => acc && next,
            LogicalOperator::Or => acc || next,
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCondition {
    #[serde(default)]
    pub id: i64,
    pub indicator: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub value2: Option<f64>,
    #[serde(default)]
    pub compare_indicator: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub is_required: bool,
    /// How this condition's result joins the running fold of the ones before it.
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub order_index: i32,
}

impl SignalCondition {
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() {
            self.weight.max(0.0)
        } else {
            0.0
        }
    }
}

/// Conditions sorted by `order_index`, stable for equal indices.
pub fn ordered(conditions: &[SignalCondition]) -> Vec<&SignalCondition> {
    let mut sorted: Vec<&SignalCondition> = conditions.iter().collect();
    sorted.sort_by_key(|c| c.order_index);
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConditionGroup {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<SignalCondition>,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub group_id: i64,
    #[serde(default)]
    pub required: bool,
    /// Carried from the authoring side; group combination does not read it.
    #[serde(default)]
    pub logic: LogicalOperator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    #[serde(alias = "strong_buy")]
    StrongBuy,
    #[serde(alias = "buy")]
    Buy,
    #[serde(alias = "hold")]
    Hold,
    #[serde(alias = "sell")]
    Sell,
    #[serde(alias = "strong_sell")]
    StrongSell,
    #[serde(alias = "alert")]
    Alert,
}

impl SignalType {
    pub fn is_buy_like(&self) -> bool {
        matches!(self, SignalType::Buy | SignalType::StrongBuy)
    }

    pub fn is_sell_like(&self) -> bool {
        matches!(self, SignalType::Sell | SignalType::StrongSell)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalType::StrongBuy => "STRONG_BUY",
            SignalType::Buy => "BUY",
            SignalType::Hold => "HOLD",
            SignalType::Sell => "SELL",
            SignalType::StrongSell => "STRONG_SELL",
            SignalType::Alert => "ALERT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRule {
    pub id: i64,
    pub name: String,
    pub signal_type: SignalType,
    /// Pass threshold as a percentage of the maximum score (0–100).
    #[serde(default)]
    pub min_score: f64,
    #[serde(default, alias = "condition_groups")]
    pub group_configs: Vec<GroupConfig>,
    #[serde(default)]
    pub target_percent: f64,
    #[serde(default)]
    pub stop_loss_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Momentum,
    Breakout,
    Trend,
    Reversal,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTemplate {
    pub id: i64,
    pub name: String,
    pub category: TemplateCategory,
    #[serde(default)]
    pub conditions: Vec<SignalCondition>,
}

/// A rule with its referenced groups loaded, in `group_configs` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    pub rule: SignalRule,
    pub groups: Vec<(GroupConfig, SignalConditionGroup)>,
}

/// Result of evaluating a rule or template against one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSignal {
    pub symbol: String,
    pub source: String,
    pub signal_type: SignalType,
    pub score: f64,
    pub max_score: f64,
    pub confidence: f64,
    pub target_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub reasons: Vec<String>,
    pub indicators_snapshot: IndicatorSnapshot,
}
