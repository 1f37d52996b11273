//! Signal store backed by a single JSON document:
//! `{ "groups": [...], "rules": [...], "templates": [...] }`.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::condition::{SignalConditionGroup, SignalRule, SignalTemplate};
use crate::domain::error::StocklensError;
use crate::ports::signal_store_port::SignalStorePort;

#[derive(Debug, Default, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    groups: Vec<SignalConditionGroup>,
    #[serde(default)]
    rules: Vec<SignalRule>,
    #[serde(default)]
    templates: Vec<SignalTemplate>,
}

#[derive(Debug, Default)]
pub struct JsonSignalStore {
    groups: HashMap<i64, SignalConditionGroup>,
    rules: HashMap<i64, SignalRule>,
    templates: HashMap<i64, SignalTemplate>,
}

impl JsonSignalStore {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StocklensError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| StocklensError::Data {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, StocklensError> {
        let doc: StoreDocument = serde_json::from_str(content)?;
        Ok(Self {
            groups: doc.groups.into_iter().map(|g| (g.id, g)).collect(),
            rules: doc.rules.into_iter().map(|r| (r.id, r)).collect(),
            templates: doc.templates.into_iter().map(|t| (t.id, t)).collect(),
        })
    }

    pub fn rule_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.rules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn template_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.templates.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl SignalStorePort for JsonSignalStore {
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
