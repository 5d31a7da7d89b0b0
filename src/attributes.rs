// 🏛️ Attribute Layer - The finite set of article attributes the engine tracks
// Each attribute knows how to read and write itself on an ArticleRecord

use crate::article::ArticleRecord;
use crate::data_quality::parse_number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing numeric attribute values
pub const NUMERIC_TOLERANCE: f64 = 0.001;

// ============================================================================
// ATTRIBUTE
// ============================================================================

/// Attribute - Every article field that can diverge between upstream and downstream
///
/// `orig_unit`, `available`, `version` and `ignore` are deliberately absent:
/// they are never reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Name,
    Note,
    Manufacturer,
    Origin,
    Unit,
    PriceNet,
    Vat,
    Deposit,
    UnitQuantity,
    Category,
}

impl Attribute {
    /// All attributes in column order
    pub const ALL: [Attribute; 10] = [
        Attribute::Name,
        Attribute::Note,
        Attribute::Manufacturer,
        Attribute::Origin,
        Attribute::Unit,
        Attribute::PriceNet,
        Attribute::Vat,
        Attribute::Deposit,
        Attribute::UnitQuantity,
        Attribute::Category,
    ];

    /// Attributes reconciled field-by-field unless configured otherwise.
    /// Category is handled separately (sticky).
    pub fn default_tracked() -> Vec<Attribute> {
        vec![
            Attribute::Name,
            Attribute::Note,
            Attribute::Manufacturer,
            Attribute::Origin,
            Attribute::Unit,
            Attribute::PriceNet,
            Attribute::Vat,
            Attribute::Deposit,
            Attribute::UnitQuantity,
        ]
    }

    /// Ledger / config key (matches the serde name)
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Note => "note",
            Attribute::Manufacturer => "manufacturer",
            Attribute::Origin => "origin",
            Attribute::Unit => "unit",
            Attribute::PriceNet => "price_net",
            Attribute::Vat => "vat",
            Attribute::Deposit => "deposit",
            Attribute::UnitQuantity => "unit_quantity",
            Attribute::Category => "category",
        }
    }

    /// Look up an attribute by its ledger key
    pub fn from_key(key: &str) -> Option<Attribute> {
        Attribute::ALL.iter().copied().find(|a| a.key() == key)
    }

    /// Human-readable label for notifications
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Note => "note",
            Attribute::Manufacturer => "manufacturer",
            Attribute::Origin => "origin",
            Attribute::Unit => "unit",
            Attribute::PriceNet => "net price",
            Attribute::Vat => "VAT",
            Attribute::Deposit => "deposit",
            Attribute::UnitQuantity => "unit quantity",
            Attribute::Category => "category",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Attribute::PriceNet | Attribute::Vat | Attribute::Deposit | Attribute::UnitQuantity
        )
    }

    /// Read this attribute from a record
    pub fn get(&self, article: &ArticleRecord) -> AttributeValue {
        match self {
            Attribute::Name => AttributeValue::Text(article.name.clone()),
            Attribute::Note => AttributeValue::Text(article.note.clone()),
            Attribute::Manufacturer => AttributeValue::Text(article.manufacturer.clone()),
            Attribute::Origin => AttributeValue::Text(article.origin.clone()),
            Attribute::Unit => AttributeValue::Text(article.unit.clone()),
            Attribute::PriceNet => AttributeValue::Number(article.price_net),
            Attribute::Vat => AttributeValue::Number(article.vat),
            Attribute::Deposit => AttributeValue::Number(article.deposit),
            Attribute::UnitQuantity => AttributeValue::Count(article.unit_quantity),
            Attribute::Category => AttributeValue::Text(article.category.clone()),
        }
    }

    /// Write a value into a record, coercing between text and numbers
    pub fn set(&self, article: &mut ArticleRecord, value: &AttributeValue) {
        match self {
            Attribute::Name => article.name = value.as_text(),
            Attribute::Note => article.note = value.as_text(),
            Attribute::Manufacturer => article.manufacturer = value.as_text(),
            Attribute::Origin => article.origin = value.as_text(),
            Attribute::Unit => article.unit = value.as_text(),
            Attribute::PriceNet => article.price_net = value.as_number(),
            Attribute::Vat => article.vat = value.as_number(),
            Attribute::Deposit => article.deposit = value.as_number(),
            Attribute::UnitQuantity => article.unit_quantity = value.as_count(),
            Attribute::Category => article.category = value.as_text(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// ATTRIBUTE VALUE
// ============================================================================

/// AttributeValue - A typed snapshot of one attribute
///
/// Untagged so the ledger stays plain JSON: `"Apfel"`, `2.5`, `6`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Count(u32),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Numeric view; unparseable text degrades to 0
    pub fn as_number(&self) -> f64 {
        match self {
            AttributeValue::Count(n) => f64::from(*n),
            AttributeValue::Number(n) => *n,
            AttributeValue::Text(s) => parse_number(s).unwrap_or(0.0),
        }
    }

    /// Count view; never below 1
    pub fn as_count(&self) -> u32 {
        let n = self.as_number().round();
        if n < 1.0 {
            1
        } else if n > f64::from(u32::MAX) {
            u32::MAX
        } else {
            n as u32
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AttributeValue::Text(s) if s.trim().is_empty())
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        use AttributeValue::*;
        match (self, other) {
            (Text(a), Text(b)) => a == b,
            (Text(_), _) | (_, Text(_)) => false,
            (a, b) => (a.as_number() - b.as_number()).abs() < NUMERIC_TOLERANCE,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Count(n) => write!(f, "{}", n),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
