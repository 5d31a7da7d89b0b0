// 📒 Manual Change Ledger - Administrator overrides that survive re-imports
// article key → attribute → {replaced, manual}
//
// Grows monotonically: an entry is only ever replaced by a newer override
// for the same article and attribute, never removed.

use crate::attributes::{Attribute, AttributeValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved key of the ledger inside a supplier's configuration document
pub const LEDGER_CONFIG_KEY: &str = "manual changes";

/// One recorded override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualChange {
    /// Upstream value at the time the override was recorded
    pub replaced: AttributeValue,

    /// Value adopted from downstream
    pub manual: AttributeValue,
}

/// ManualChangeLedger - persisted per supplier configuration
///
/// Attribute names are kept as plain strings so entries written by other
/// versions (or by hand) survive a load/save cycle untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualChangeLedger {
    entries: BTreeMap<String, BTreeMap<String, ManualChange>>,
}

impl ManualChangeLedger {
    pub fn new() -> Self {
        ManualChangeLedger::default()
    }

    /// Load from the JSON value stored under `LEDGER_CONFIG_KEY`
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn get(&self, key: &str, attr: Attribute) -> Option<&ManualChange> {
        self.entries.get(key).and_then(|changes| changes.get(attr.key()))
    }

    /// Record an override; returns true if the ledger actually changed
    pub fn record(
        &mut self,
        key: &str,
        attr: Attribute,
        replaced: AttributeValue,
        manual: AttributeValue,
    ) -> bool {
        let change = ManualChange { replaced, manual };
        let changes = self.entries.entry(key.to_string()).or_default();

        match changes.get(attr.key()) {
            Some(existing) if *existing == change => false,
            _ => {
                changes.insert(attr.key().to_string(), change);
                true
            }
        }
    }

    /// All overrides for one article
    pub fn changes_for(&self, key: &str) -> Option<&BTreeMap<String, ManualChange>> {
        self.entries.get(key)
    }

    /// Number of articles with at least one override
    pub fn article_count(&self) -> usize {
        self.entries.values().filter(|c| !c.is_empty()).count()
    }

    /// Total number of recorded overrides
    pub fn change_count(&self) -> usize {
        self.entries.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, ManualChange>)> {
        self.entries.iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
