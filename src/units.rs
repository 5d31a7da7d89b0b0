// ⚖️ Unit Recalculator - Offer one article in several derived units
// e.g. a 10 kg sack also sold per 1 kg and per 500 g

use crate::article::{normalize, round2, ArticleRecord};
use crate::rules::{MatchMode, Matcher};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReplacement {
    /// Unit string written downstream
    pub unit: String,

    /// Price multiplier relative to the original unit
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRule {
    /// Rule ID for tracking
    #[serde(default)]
    pub id: Option<String>,

    /// Category patterns this rule applies to
    #[serde(default)]
    pub categories: Vec<String>,

    /// Article name patterns this rule applies to
    #[serde(default)]
    pub articles: Vec<String>,

    #[serde(default)]
    pub matcher: Matcher,

    /// Only articles in one of these units are recalculated (empty = all)
    #[serde(default)]
    pub original_units: Vec<String>,

    /// One output article per entry, in this order
    pub replacements: Vec<UnitReplacement>,
}

impl UnitRule {
    /// Category/name criteria; a rule without criteria matches everything
    pub fn matches(&self, article: &ArticleRecord) -> bool {
        if self.categories.is_empty() && self.articles.is_empty() {
            return true;
        }
        self.matcher.matches_any(&self.categories, &article.category)
            || self.matcher.matches_any(&self.articles, &article.name)
    }

    /// Unit gate
    pub fn admits_unit(&self, unit: &str) -> bool {
        if self.original_units.is_empty() {
            return true;
        }
        let exact = Matcher::new(MatchMode::Exact, self.matcher.case_sensitive);
        exact.matches_any(&self.original_units, unit.trim())
    }
}

// ============================================================================
// UNIT RECALCULATOR
// ============================================================================

pub struct UnitRecalculator {
    rules: Vec<UnitRule>,

    /// Append "(price/unit)" to names of recalculated variants
    annotate_base_price: bool,
}

impl UnitRecalculator {
    pub fn new() -> Self {
        UnitRecalculator {
            rules: Vec::new(),
            annotate_base_price: false,
        }
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read unit rules: {:?}", path.as_ref()))?;

        let rules: Vec<UnitRule> =
            serde_json::from_str(&content).context("Failed to parse unit rules JSON")?;

        Ok(UnitRecalculator::from_rules(rules))
    }

    /// Create recalculator from rules; rules without replacements are dropped
    pub fn from_rules(rules: Vec<UnitRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|r| !r.replacements.is_empty())
            .collect();
        UnitRecalculator {
            rules,
            annotate_base_price: false,
        }
    }

    /// Builder: enable base price annotation
    pub fn with_base_price_annotation(mut self, enabled: bool) -> Self {
        self.annotate_base_price = enabled;
        self
    }

    /// First rule that matches the article and admits its unit
    pub fn find_rule(&self, article: &ArticleRecord) -> Option<&UnitRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(article) && rule.admits_unit(&article.unit))
    }

    /// Expand one article into its unit variants
    ///
    /// Only the first applicable rule is used. No rule means a single
    /// unmodified copy. With more than one replacement every variant gets
    /// its own order number, `<order number>-<unit>`, stable across runs.
    pub fn recalculate(&self, article: &ArticleRecord) -> Vec<ArticleRecord> {
        let rule = match self.find_rule(article) {
            Some(rule) => rule,
            None => return vec![article.clone()],
        };

        tracing::debug!(
            rule = rule.id.as_deref().unwrap_or("-"),
            article = %article.name,
            variants = rule.replacements.len(),
            "unit rule applied"
        );

        let split = rule.replacements.len() > 1;
        rule.replacements
            .iter()
            .map(|replacement| {
                let mut variant = self.variant(article, replacement);
                if split {
                    variant.order_number = variant_key(&article.order_number, &replacement.unit);
                }
                variant
            })
            .collect()
    }

    fn variant(&self, article: &ArticleRecord, replacement: &UnitReplacement) -> ArticleRecord {
        let mut variant = article.clone();
        variant.unit = replacement.unit.clone();
        variant.price_net = round2(article.price_net * replacement.factor);

        if self.annotate_base_price && (replacement.factor - 1.0).abs() > f64::EPSILON {
            let base_unit = if article.orig_unit.is_empty() {
                &article.unit
            } else {
                &article.orig_unit
            };
            variant.name = format!("{} ({:.2}/{})", article.name, article.price_net, base_unit);
        }

        variant
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Order number of a unit variant: source key plus the unit, alphanumerics only
pub fn variant_key(order_number: &str, unit: &str) -> String {
    let unit: String = normalize(unit)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    format!("{}-{}", order_number, unit)
}

impl Default for UnitRecalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
