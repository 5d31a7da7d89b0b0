// ⚙️ Import Configuration - One JSON document per supplier
// Everything except the supplier id has a default, so a minimal config is `{"supplier": "x"}`

use crate::attributes::Attribute;
use crate::data_quality::QualityThresholds;
use crate::deduplication::Disambiguator;
use crate::rules::CategoryRule;
use crate::units::UnitRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Supplier identifier; also the key of the persisted state
    pub supplier: String,

    /// Downstream catalog identifier, required to fetch a snapshot
    #[serde(default)]
    pub catalog_id: Option<String>,

    /// Run-local order number prefix, stripped for ledger keys
    #[serde(default)]
    pub order_number_prefix: Option<String>,

    #[serde(default = "Attribute::default_tracked")]
    pub tracked_attributes: Vec<Attribute>,

    #[serde(default = "default_true")]
    pub sticky_category: bool,

    #[serde(default = "Disambiguator::default_order")]
    pub disambiguation: Vec<Disambiguator>,

    #[serde(default = "default_true")]
    pub keep_full_duplicates: bool,

    #[serde(default)]
    pub base_price_annotation: bool,

    #[serde(default)]
    pub unit_rules: Vec<UnitRule>,

    #[serde(default)]
    pub category_rules: Vec<CategoryRule>,

    #[serde(default = "default_true")]
    pub return_original_category: bool,

    #[serde(default)]
    pub quality: QualityThresholds,
}

fn default_true() -> bool {
    true
}

impl ImportConfig {
    /// Defaults for a supplier
    pub fn new(supplier: impl Into<String>) -> Self {
        ImportConfig {
            supplier: supplier.into(),
            catalog_id: None,
            order_number_prefix: None,
            tracked_attributes: Attribute::default_tracked(),
            sticky_category: true,
            disambiguation: Disambiguator::default_order(),
            keep_full_duplicates: true,
            base_price_annotation: false,
            unit_rules: Vec::new(),
            category_rules: Vec::new(),
            return_original_category: true,
            quality: QualityThresholds::default(),
        }
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ImportConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Builder: set catalog id
    pub fn with_catalog(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }
}
