// 📦 Article Record - One catalog item as it flows through an import run
// Created fresh by extraction, transformed by the pipeline, discarded at run end

use crate::data_quality::parse_number_or_zero;
use crate::notifications::Notifications;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Number of hex digits kept from the content hash for derived order numbers
pub const CONTENT_KEY_LEN: usize = 12;

/// ArticleRecord - the core entity
///
/// Only `order_number` and `name` are required in extractor output; every
/// other field falls back to a serde default so sparse sources stay valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    /// Supplier order number (may carry a run-local prefix)
    #[serde(default)]
    pub order_number: String,

    /// Display name, unique per batch after deduplication
    pub name: String,

    // ========================================================================
    // DESCRIPTIVE FIELDS
    // ========================================================================
    #[serde(default)]
    pub note: String,

    #[serde(default)]
    pub manufacturer: String,

    #[serde(default)]
    pub origin: String,

    /// Free-form unit as shown downstream (e.g. "500 g", "1 kg")
    #[serde(default)]
    pub unit: String,

    /// Short unit form, only used to tell same-named articles apart
    #[serde(default)]
    pub orig_unit: String,

    #[serde(default)]
    pub category: String,

    // ========================================================================
    // PRICING
    // ========================================================================
    #[serde(default)]
    pub price_net: f64,

    #[serde(default)]
    pub vat: f64,

    #[serde(default)]
    pub deposit: f64,

    #[serde(default = "default_unit_quantity")]
    pub unit_quantity: u32,

    // ========================================================================
    // STATE
    // ========================================================================
    #[serde(default = "default_true")]
    pub available: bool,

    #[serde(default = "default_version")]
    pub version: u32,

    /// Excluded from output, still kept for the run report
    #[serde(default)]
    pub ignore: bool,
}

fn default_unit_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

impl ArticleRecord {
    /// Create a record with the given identity and all other fields defaulted
    pub fn new(order_number: impl Into<String>, name: impl Into<String>) -> Self {
        ArticleRecord {
            order_number: order_number.into(),
            name: name.into(),
            note: String::new(),
            manufacturer: String::new(),
            origin: String::new(),
            unit: String::new(),
            orig_unit: String::new(),
            category: String::new(),
            price_net: 0.0,
            vat: 0.0,
            deposit: 0.0,
            unit_quantity: 1,
            available: true,
            version: 1,
            ignore: false,
        }
    }

    /// Builder: set unit and its short form
    pub fn with_unit(mut self, unit: impl Into<String>, orig_unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self.orig_unit = orig_unit.into();
        self
    }

    /// Builder: set net price
    pub fn with_price(mut self, price_net: f64) -> Self {
        self.price_net = price_net;
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder: set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    /// Builder: set origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Name in the form used for duplicate detection
    pub fn normalized_name(&self) -> String {
        normalize(&self.name)
    }

    /// Key used to match this record against previous and downstream snapshots
    pub fn stable_key(&self, prefix: Option<&str>) -> String {
        stable_key(&self.order_number, prefix)
    }

    /// Derive a reproducible order number from name and unit
    ///
    /// SHA-256 over normalized name, a 0x1F separator and normalized unit,
    /// truncated to `CONTENT_KEY_LEN` hex digits. Stable across runs and builds.
    pub fn compute_content_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize(&self.name).as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalize(&self.unit).as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..CONTENT_KEY_LEN].to_string()
    }
}

// ============================================================================
// LENIENT LOADING
// ============================================================================

const MONEY_FIELDS: [&str; 3] = ["price_net", "vat", "deposit"];
const COUNT_FIELDS: [&str; 2] = ["unit_quantity", "version"];
const TEXT_FIELDS: [&str; 8] = [
    "order_number",
    "name",
    "note",
    "manufacturer",
    "origin",
    "unit",
    "orig_unit",
    "category",
];

/// Decode one extractor row without letting a bad field sink the batch
///
/// Numbers written as text ("2,50") are parsed leniently, unreadable ones
/// become 0 with a notification, counts never drop below 1, numeric text
/// fields are stringified and nulls fall back to defaults. A row that still
/// cannot be decoded (no name, not an object) is skipped with a notification.
pub fn article_from_json(row: Value, position: usize, notes: &mut Notifications) -> Option<ArticleRecord> {
    let mut fields = match row {
        Value::Object(fields) => fields,
        other => {
            notes.push(format!("Row {}: expected an article object, got {}, skipped", position + 1, other));
            return None;
        }
    };

    let context = match fields.get("order_number").and_then(Value::as_str) {
        Some(order_number) => format!("Row {} ({})", position + 1, order_number),
        None => format!("Row {}", position + 1),
    };

    for field in TEXT_FIELDS {
        match fields.get(field) {
            Some(Value::Null) => {
                fields.remove(field);
            }
            Some(Value::Number(n)) => {
                let text = n.to_string();
                fields.insert(field.to_string(), Value::String(text));
            }
            Some(Value::Bool(b)) => {
                let text = b.to_string();
                fields.insert(field.to_string(), Value::String(text));
            }
            _ => {}
        }
    }

    for field in MONEY_FIELDS.into_iter().chain(COUNT_FIELDS) {
        let number = match fields.get(field) {
            None | Some(Value::Null) => {
                fields.remove(field);
                continue;
            }
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(raw)) => parse_number_or_zero(raw, field, &context, notes),
            Some(other) => {
                notes.push(format!("{}: could not read {} {}, using 0", context, field, other));
                0.0
            }
        };

        let value = if COUNT_FIELDS.contains(&field) {
            let count = if number >= 1.0 { number.round().min(f64::from(u32::MAX)) as u32 } else { 1 };
            Value::from(count)
        } else {
            Value::from(number)
        };
        fields.insert(field.to_string(), value);
    }

    match serde_json::from_value(Value::Object(fields)) {
        Ok(article) => Some(article),
        Err(e) => {
            notes.push(format!("{}: unreadable article ({}), skipped", context, e));
            None
        }
    }
}

/// Casefold and drop all whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Strip a run-local prefix from an order number
pub fn stable_key(order_number: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) if !p.is_empty() => order_number
            .strip_prefix(p)
            .unwrap_or(order_number)
            .to_string(),
        _ => order_number.to_string(),
    }
}

/// Round to two decimals (cent precision)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
