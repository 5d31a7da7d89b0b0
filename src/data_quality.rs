// ✅ Data Quality Engine - Keep a batch importable no matter how noisy the source
// Malformed numbers degrade to 0, overlong text is truncated, and missing or
// unrealistic units/prices borrow from the previous article in the same category.
// Every repair is reported, nothing here ever aborts a run.

use crate::article::ArticleRecord;
use crate::notifications::Notifications;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum length of a string field in the catalog CSV
pub const MAX_FIELD_LEN: usize = 255;

const ELLIPSIS: &str = "...";

// ============================================================================
// LENIENT PARSING
// ============================================================================

/// Parse a number the way price lists write them
///
/// Accepts "2.50", "2,50", "1.234,56", "1,234.56", "€ 3,20", "7 %".
/// Returns None when nothing numeric is left.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("EUR")
        .trim_end_matches("EUR")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // Both present: the later one is the decimal separator
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a numeric field, degrading to 0 with a notification
pub fn parse_number_or_zero(
    raw: &str,
    field: &str,
    context: &str,
    notes: &mut Notifications,
) -> f64 {
    if raw.trim().is_empty() {
        return 0.0;
    }
    match parse_number(raw) {
        Some(n) => n,
        None => {
            notes.push(format!(
                "{}: could not read {} \"{}\", using 0",
                context, field, raw
            ));
            0.0
        }
    }
}

/// Truncate to `MAX_FIELD_LEN` characters (ellipsis included), with a notification
pub fn truncate_field(value: &str, field: &str, context: &str, notes: &mut Notifications) -> String {
    if value.chars().count() <= MAX_FIELD_LEN {
        return value.to_string();
    }
    let kept: String = value.chars().take(MAX_FIELD_LEN - ELLIPSIS.len()).collect();
    notes.push(format!(
        "{}: {} longer than {} characters was shortened",
        context, field, MAX_FIELD_LEN
    ));
    format!("{}{}", kept, ELLIPSIS)
}

// ============================================================================
// THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Net prices above this are treated as extraction errors
    #[serde(default = "default_max_price")]
    pub max_price_net: f64,

    /// Units longer than this are treated as extraction errors
    #[serde(default = "default_max_unit_len")]
    pub max_unit_len: usize,

    /// Used when no earlier article in the category has a unit
    #[serde(default = "default_unit")]
    pub default_unit: String,
}

fn default_max_price() -> f64 {
    1000.0
}

fn default_max_unit_len() -> usize {
    30
}

fn default_unit() -> String {
    "Stück".to_string()
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            max_price_net: default_max_price(),
            max_unit_len: default_max_unit_len(),
            default_unit: default_unit(),
        }
    }
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine {
    thresholds: QualityThresholds,
}

/// Last accepted values per category
#[derive(Default)]
struct CategoryMemory {
    unit: Option<String>,
    price_net: Option<f64>,
}

impl DataQualityEngine {
    pub fn new() -> Self {
        DataQualityEngine {
            thresholds: QualityThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: QualityThresholds) -> Self {
        DataQualityEngine { thresholds }
    }

    /// Repair units, prices and numeric ranges in extraction order
    pub fn sanitize(&self, articles: &mut [ArticleRecord], notes: &mut Notifications) {
        let mut memory: HashMap<String, CategoryMemory> = HashMap::new();
        let mut repaired = 0usize;

        for article in articles.iter_mut() {
            let seen = memory.entry(article.category.clone()).or_default();

            if let Some(reason) = self.unit_problem(&article.unit) {
                let fallback = seen
                    .unit
                    .clone()
                    .unwrap_or_else(|| self.thresholds.default_unit.clone());
                notes.push(format!(
                    "Article {} \"{}\": {} unit \"{}\", using \"{}\"",
                    article.order_number, article.name, reason, article.unit, fallback
                ));
                article.unit = fallback;
                repaired += 1;
            }

            if let Some(reason) = self.price_problem(article.price_net) {
                let fallback = seen.price_net.unwrap_or(0.0);
                notes.push(format!(
                    "Article {} \"{}\": {} price {}, using {:.2}",
                    article.order_number, article.name, reason, article.price_net, fallback
                ));
                article.price_net = fallback;
                repaired += 1;
            }

            if !article.vat.is_finite() || article.vat < 0.0 {
                article.vat = 0.0;
            }
            if !article.deposit.is_finite() || article.deposit < 0.0 {
                article.deposit = 0.0;
            }
            if article.unit_quantity == 0 {
                article.unit_quantity = 1;
            }
            if article.version == 0 {
                article.version = 1;
            }

            seen.unit = Some(article.unit.clone());
            if article.price_net > 0.0 {
                seen.price_net = Some(article.price_net);
            }
        }

        if repaired > 0 {
            tracing::warn!(repaired, total = articles.len(), "repaired article fields");
        }
    }

    fn unit_problem(&self, unit: &str) -> Option<&'static str> {
        if unit.trim().is_empty() {
            Some("missing")
        } else if unit.chars().count() > self.thresholds.max_unit_len {
            Some("unrealistic")
        } else {
            None
        }
    }

    fn price_problem(&self, price: f64) -> Option<&'static str> {
        if !price.is_finite() || price <= 0.0 {
            Some("missing")
        } else if price > self.thresholds.max_price_net {
            Some("unrealistic")
        } else {
            None
        }
    }
}

impl Default for DataQualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
