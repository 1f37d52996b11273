//! Read-only access to authored condition groups, rules and templates.

use crate::domain::condition::{SignalConditionGroup, SignalRule, SignalTemplate};
use crate::domain::error::StocklensError;

pub trait SignalStorePort {
    fn load_condition_group(&self, id: i64) -> Result<SignalConditionGroup, StocklensError>;
    fn load_signal_rule(&self, id: i64) -> Result<SignalRule, StocklensError>;
    fn load_signal_template(&self, id: i64) -> Result<SignalTemplate, StocklensError>;
}
