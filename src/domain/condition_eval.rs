//! Condition, group, rule and template evaluation against a snapshot.
//!
//! # Evaluation Semantics
//!
//! - `eq`/`neq`: absolute tolerance of 0.001
//! - `between`: `[value, value2]` inclusive; with a compare indicator the
//!   ratio `actual / compare` is tested instead of `actual`
//! - `cross_above`/`cross_below`: on the correct side of the compare value
//!   and within 5% of it (a proximity check, no previous bar is consulted)
//! - Group: conditions in `order_index` order, folded left to right with
//!   each condition's own logical operator; any failed required condition
//!   vetoes the group; an empty group fails
//! - Rule: every required group passes and `100 × score / max ≥ min_score`
//! - Template: every required condition passes and `score / max ≥ 0.6`
//!
//! Unknown indicators and operators fail their condition, never the caller.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::debug;

use crate::domain::condition::{
    GroupConfig, Operator, ResolvedRule, RuleSignal, SignalCondition, SignalConditionGroup,
    SignalRule, SignalTemplate, SignalType, TemplateCategory, ordered,
};
use crate::domain::error::StocklensError;
use crate::domain::snapshot::IndicatorSnapshot;
use crate::ports::signal_store_port::SignalStorePort;

pub const EQUALITY_TOLERANCE: f64 = 0.001;
pub const CROSS_BAND: f64 = 0.05;
pub const TEMPLATE_MIN_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionResult {
    pub passed: bool,
    pub actual: Option<f64>,
    pub reason: String,
}

impl ConditionResult {
    fn failed(reason: String) -> Self {
        ConditionResult {
            passed: false,
            actual: None,
            reason,
        }
    }
}

fn read(snap: &IndicatorSnapshot, name: &str) -> Result<f64, StocklensError> {
    Ok(snap.lookup(name)?.to_f64().unwrap_or(0.0))
}

pub fn evaluate_condition(cond: &SignalCondition, snap: &IndicatorSnapshot) -> ConditionResult {
    let actual = match read(snap, &cond.indicator) {
        Ok(v) => v,
        Err(e) => {
            debug!(indicator = %cond.indicator, error = %e, "condition skipped");
            return ConditionResult::failed(format!("{}: {e}", cond.indicator));
        }
    };

    let compare = match &cond.compare_indicator {
        Some(name) => match read(snap, name) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(indicator = %name, error = %e, "compare indicator skipped");
                return ConditionResult::failed(format!("{name}: {e}"));
            }
        },
        None => None,
    };
    let target = compare.unwrap_or(cond.value);

    let passed = match &cond.operator {
        Operator::Eq => (actual - target).abs() < EQUALITY_TOLERANCE,
        Operator::Neq => (actual - target).abs() >= EQUALITY_TOLERANCE,
        Operator::Gt => actual > target,
        Operator::Gte => actual >= target,
        Operator::Lt => actual < target,
        Operator::Lte => actual <= target,
        Operator::Between => {
            let Some(upper) = cond.value2 else {
                debug!(indicator = %cond.indicator, "between without value2");
                return ConditionResult::failed(format!("{}: between needs value2", cond.indicator));
            };
            let subject = match compare {
                Some(c) if c == 0.0 => {
                    return ConditionResult::failed(format!(
                        "{}: compare indicator is zero",
                        cond.indicator
                    ));
                }
                Some(c) => actual / c,
                None => actual,
            };
            subject >= cond.value && subject <= upper
        }
        Operator::CrossAbove => {
            target != 0.0 && actual > target && (actual - target) < CROSS_BAND * target.abs()
        }
        Operator::CrossBelow => {
            target != 0.0 && actual < target && (target - actual) < CROSS_BAND * target.abs()
        }
        Operator::Unknown(raw) => {
            debug!(operator = %raw, "unknown operator");
            return ConditionResult::failed(format!("unknown operator '{raw}'"));
        }
    };

    let against = match &cond.compare_indicator {
        Some(name) => name.clone(),
        None => match (&cond.operator, cond.value2) {
            (Operator::Between, Some(v2)) => format!("{}..{}", cond.value, v2),
            _ => cond.value.to_string(),
        },
    };
    ConditionResult {
        passed,
        actual: Some(actual),
        reason: format!(
            "{} {:.2} {} {} {}",
            cond.indicator,
            actual,
            cond.operator,
            against,
            if passed { "passed" } else { "failed" }
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub passed: bool,
    pub score: f64,
    pub max_score: f64,
    pub required_failed: bool,
    pub reasons: Vec<String>,
}

impl GroupResult {
    pub fn confidence(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }
}

/// Score a list of conditions and fold their results left to right.
fn score_conditions(conditions: &[SignalCondition], snap: &IndicatorSnapshot) -> GroupResult {
    let mut fold: Option<bool> = None;
    let mut score = 0.0;
    let mut max_score = 0.0;
    let mut required_failed = false;
    let mut reasons = Vec::new();

    for cond in ordered(conditions) {
        let result = evaluate_condition(cond, snap);
        let weight = cond.effective_weight();
        max_score += weight;
        if result.passed {
            score += weight;
            reasons.push(result.reason);
        } else if cond.is_required {
            required_failed = true;
            reasons.push(format!("required: {}", result.reason));
        }
        fold = Some(match fold {
            None => result.passed,
            Some(acc) => cond.logical_operator.apply(acc, result.passed),
        });
    }

    GroupResult {
        passed: fold.unwrap_or(false) && !required_failed,
        score,
        max_score,
        required_failed,
        reasons,
    }
}

pub fn evaluate_condition_group(
    group: &SignalConditionGroup,
    snap: &IndicatorSnapshot,
) -> GroupResult {
    score_conditions(&group.conditions, snap)
}

/// Price offset by `pct` percent, `up` or down.
fn offset(price: Decimal, pct: f64, up: bool) -> Option<Decimal> {
    let factor = Decimal::from_f64(pct)? / Decimal::ONE_HUNDRED;
    Some(if up {
        price * (Decimal::ONE + factor)
    } else {
        price * (Decimal::ONE - factor)
    })
}

/// Target and stop for a signal side. Neither side gets none.
fn targets(
    signal_type: SignalType,
    price: Decimal,
    target_pct: f64,
    stop_pct: f64,
) -> (Option<Decimal>, Option<Decimal>) {
    if price <= Decimal::ZERO {
        return (None, None);
    }
    if signal_type.is_buy_like() {
        (offset(price, target_pct, true), offset(price, stop_pct, false))
    } else if signal_type.is_sell_like() {
        (offset(price, target_pct, false), offset(price, stop_pct, true))
    } else {
        (None, None)
    }
}

/// Load a rule and every group it references.
pub fn resolve_rule(
    store: &dyn SignalStorePort,
    rule_id: i64,
) -> Result<ResolvedRule, StocklensError> {
    let rule = store.load_signal_rule(rule_id)?;
    resolve_groups(store, rule)
}

pub fn resolve_groups(
    store: &dyn SignalStorePort,
    rule: SignalRule,
) -> Result<ResolvedRule, StocklensError> {
    let groups = rule
        .group_configs
        .iter()
        .map(|gc: &GroupConfig| Ok((gc.clone(), store.load_condition_group(gc.group_id)?)))
        .collect::<Result<Vec<_>, StocklensError>>()?;
    Ok(ResolvedRule { rule, groups })
}

/// `None` means "no signal", not an error.
pub fn evaluate_rule(resolved: &ResolvedRule, snap: &IndicatorSnapshot) -> Option<RuleSignal> {
    let rule = &resolved.rule;
    let mut score = 0.0;
    let mut max_score = 0.0;
    let mut reasons = Vec::new();

    for (config, group) in &resolved.groups {
        let result = evaluate_condition_group(group, snap);
        if config.required && !result.passed {
            debug!(rule = rule.id, group = group.id, symbol = %snap.symbol, "required group failed");
            return None;
        }
        score += result.score;
        max_score += result.max_score;
        reasons.extend(result.reasons);
    }

    if max_score <= 0.0 {
        return None;
    }
    let pct = 100.0 * score / max_score;
    if pct < rule.min_score {
        return None;
    }

    let (target_price, stop_loss) = targets(
        rule.signal_type,
        snap.current_price,
        rule.target_percent,
        rule.stop_loss_percent,
    );
    Some(RuleSignal {
        symbol: snap.symbol.clone(),
        source: rule.name.clone(),
        signal_type: rule.signal_type,
        score,
        max_score,
        confidence: score / max_score,
        target_price,
        stop_loss,
        reasons,
        indicators_snapshot: snap.clone(),
    })
}

/// Side and target/stop percentages a template category implies.
fn category_signal(category: TemplateCategory, snap: &IndicatorSnapshot) -> (SignalType, f64, f64) {
    match category {
        TemplateCategory::Momentum => (SignalType::Buy, 10.0, 5.0),
        TemplateCategory::Breakout => (SignalType::Buy, 15.0, 7.0),
        TemplateCategory::Trend => (SignalType::Buy, 12.0, 6.0),
        TemplateCategory::Reversal => match snap.rsi {
            Some(rsi) if rsi < Decimal::from(50) => (SignalType::Buy, 8.0, 4.0),
            Some(_) => (SignalType::Sell, 8.0, 4.0),
            None => (SignalType::Alert, 0.0, 0.0),
        },
        TemplateCategory::Other => (SignalType::Alert, 0.0, 0.0),
    }
}

pub fn evaluate_template(
    template: &SignalTemplate,
    snap: &IndicatorSnapshot,
) -> Option<RuleSignal> {
    let result = score_conditions(&template.conditions, snap);
    if result.required_failed || result.max_score <= 0.0 {
        return None;
    }
    let confidence = result.confidence();
    if confidence < TEMPLATE_MIN_CONFIDENCE {
        return None;
    }

    let (signal_type, target_pct, stop_pct) = category_signal(template.category, snap);
    let (target_price, stop_loss) = targets(signal_type, snap.current_price, target_pct, stop_pct);
    Some(RuleSignal {
        symbol: snap.symbol.clone(),
        source: template.name.clone(),
        signal_type,
        score: result.score,
        max_score: result.max_score,
        confidence,
        target_price,
        stop_loss,
        reasons: result.reasons,
        indicators_snapshot: snap.clone(),
    })
}
