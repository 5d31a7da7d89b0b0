// 🔄 Import Pipeline - One supplier conversion from extraction to catalog rows
//
// Stage order:
//   1. extraction (ArticleSource)
//   2. sanitation + content keys for articles without order number
//   3. unit recalculation and category resort, per article
//   4. duplicate names over the batch          → extraction snapshot
//   5. downstream snapshot + reconciliation    (ledger read and written)
//   6. duplicate order numbers
//
// Reconciliation always runs before key suffixing so both work on the same
// stable keys as the stored snapshots.

use crate::article::{article_from_json, ArticleRecord};
use crate::config::ImportConfig;
use crate::csv_io;
use crate::data_quality::DataQualityEngine;
use crate::db::Event;
use crate::deduplication::{DuplicateKeyResolver, DuplicateNameResolver};
use crate::ledger::ManualChangeLedger;
use crate::notifications::Notifications;
use crate::reconciliation::{ManualChangeReconciler, ReconciliationReport};
use crate::rules::CategoryResorter;
use crate::units::UnitRecalculator;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Conditions that abort an import run
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("supplier {supplier} has no catalog id, cannot fetch the downstream snapshot")]
    MissingCatalogId { supplier: String },

    #[error("downstream catalog {catalog_id} is unavailable: {reason}")]
    DownstreamUnavailable { catalog_id: String, reason: String },
}

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Produces the raw article list of a run
pub trait ArticleSource {
    fn extract(&self, notes: &mut Notifications) -> Result<Vec<ArticleRecord>>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Fetches what the downstream catalog currently holds
pub trait DownstreamCatalog {
    fn fetch(&self, catalog_id: &str, notes: &mut Notifications) -> Result<Vec<ArticleRecord>>;
}

/// Extractor output: a JSON array of articles
pub struct JsonArticleSource {
    path: PathBuf,
}

impl JsonArticleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonArticleSource { path: path.into() }
    }
}

impl ArticleSource for JsonArticleSource {
    fn extract(&self, notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read extraction file: {:?}", self.path))?;

        // Rows are decoded one by one so a bad field only costs that field
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&content).context("Failed to parse extraction JSON")?;

        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(position, row)| article_from_json(row, position, notes))
            .collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Catalog export in the catalog CSV layout
///
/// Points either at a single file or at a directory holding `<catalog id>.csv`.
pub struct CsvCatalogSnapshot {
    location: PathBuf,
}

impl CsvCatalogSnapshot {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        CsvCatalogSnapshot {
            location: location.into(),
        }
    }

    fn file_for(&self, catalog_id: &str) -> PathBuf {
        if self.location.is_dir() {
            self.location.join(format!("{}.csv", catalog_id))
        } else {
            self.location.clone()
        }
    }
}

impl DownstreamCatalog for CsvCatalogSnapshot {
    fn fetch(&self, catalog_id: &str, notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
        let path = self.file_for(catalog_id);
        tracing::debug!(catalog_id, path = %path.display(), "reading downstream snapshot");
        csv_io::read_catalog(&path, notes)
    }
}

// ============================================================================
// RUN OUTCOME
// ============================================================================

#[derive(Debug)]
pub struct RunOutcome {
    /// Final articles, order numbers unique (ignored ones included)
    pub articles: Vec<ArticleRecord>,

    /// Articles after name deduplication, before reconciliation;
    /// becomes `previous` once the output is confirmed as imported
    pub extracted: Vec<ArticleRecord>,

    pub notifications: Notifications,

    pub report: ReconciliationReport,
}

impl RunOutcome {
    /// Articles that end up in the catalog file
    pub fn output_articles(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.articles.iter().filter(|a| !a.ignore)
    }

    pub fn ignored_count(&self) -> usize {
        self.articles.iter().filter(|a| a.ignore).count()
    }

    /// Audit events for every override newly written to the ledger
    pub fn ledger_events(&self, supplier: &str) -> Vec<Event> {
        self.report
            .recorded()
            .map(|change| Event::manual_change_recorded(supplier, change))
            .collect()
    }

    /// Write the catalog file; truncation notices join the run's notifications
    pub fn write_csv(&mut self, path: &Path) -> Result<usize> {
        csv_io::write_catalog(path, &self.articles, &mut self.notifications)
    }
}

// ============================================================================
// IMPORT RUN
// ============================================================================

pub struct ImportRun<'a> {
    config: &'a ImportConfig,
    quality: DataQualityEngine,
    units: UnitRecalculator,
    categories: CategoryResorter,
    names: DuplicateNameResolver,
    reconciler: ManualChangeReconciler,
    keys: DuplicateKeyResolver,
}

impl<'a> ImportRun<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        ImportRun {
            config,
            quality: DataQualityEngine::with_thresholds(config.quality.clone()),
            units: UnitRecalculator::from_rules(config.unit_rules.clone())
                .with_base_price_annotation(config.base_price_annotation),
            categories: CategoryResorter::from_rules(config.category_rules.clone())
                .with_return_original(config.return_original_category),
            names: DuplicateNameResolver::new()
                .with_strategies(config.disambiguation.clone())
                .with_keep_full_duplicates(config.keep_full_duplicates),
            reconciler: ManualChangeReconciler::new()
                .with_tracked(config.tracked_attributes.clone())
                .with_sticky_category(config.sticky_category)
                .with_key_prefix(config.order_number_prefix.clone()),
            keys: DuplicateKeyResolver::new(),
        }
    }

    /// Run every stage
    ///
    /// `downstream` None skips the snapshot fetch; stored overrides are then
    /// replayed from the ledger alone. `previous` None marks a first run.
    pub fn execute(
        &self,
        source: &dyn ArticleSource,
        downstream: Option<&dyn DownstreamCatalog>,
        previous: Option<&[ArticleRecord]>,
        ledger: &mut ManualChangeLedger,
    ) -> Result<RunOutcome> {
        let mut notes = Notifications::new();

        tracing::info!(supplier = %self.config.supplier, source = %source.describe(), "starting import");
        let raw = source
            .extract(&mut notes)
            .with_context(|| format!("Extraction failed for {}", source.describe()))?;

        let extracted = self.prepare(raw, &mut notes);

        // Fetch before touching anything so a failure leaves the ledger as it was
        let snapshot = match downstream {
            Some(catalog) => Some(self.fetch_downstream(catalog, &mut notes)?),
            None => {
                tracing::warn!(supplier = %self.config.supplier, "no downstream snapshot, replaying ledger only");
                notes.push(OFFLINE_NOTICE);
                None
            }
        };

        let mut articles = extracted.clone();
        let report = self.reconciler.reconcile(
            &mut articles,
            previous,
            snapshot.as_deref(),
            ledger,
            &mut notes,
        );

        self.keys.resolve(&mut articles, &mut notes);

        tracing::info!(
            supplier = %self.config.supplier,
            articles = articles.len(),
            notifications = notes.len(),
            "import finished"
        );

        Ok(RunOutcome {
            articles,
            extracted,
            notifications: notes,
            report,
        })
    }

    /// Stages up to name deduplication
    pub fn prepare(&self, mut articles: Vec<ArticleRecord>, notes: &mut Notifications) -> Vec<ArticleRecord> {
        let extracted = articles.len();

        self.quality.sanitize(&mut articles, notes);
        assign_content_keys(&mut articles, notes);

        let mut expanded = Vec::with_capacity(articles.len());
        for article in &articles {
            let category = self
                .categories
                .resort(&article.name, &article.category)
                .unwrap_or_default();

            for mut variant in self.units.recalculate(article) {
                variant.category = category.clone();
                csv_io::to_catalog_form(&mut variant, notes);
                expanded.push(variant);
            }
        }

        self.names.resolve(&mut expanded, notes);

        tracing::debug!(extracted, prepared = expanded.len(), "articles prepared");
        expanded
    }

    fn fetch_downstream(
        &self,
        catalog: &dyn DownstreamCatalog,
        notes: &mut Notifications,
    ) -> Result<Vec<ArticleRecord>> {
        let catalog_id = self
            .config
            .catalog_id
            .as_deref()
            .ok_or_else(|| ImportError::MissingCatalogId {
                supplier: self.config.supplier.clone(),
            })?;

        let articles = catalog.fetch(catalog_id, notes).map_err(|e| {
            ImportError::DownstreamUnavailable {
                catalog_id: catalog_id.to_string(),
                reason: format!("{:#}", e),
            }
        })?;

        tracing::info!(catalog_id, articles = articles.len(), "downstream snapshot fetched");
        Ok(articles)
    }
}

/// Notice for runs without a downstream snapshot
pub const OFFLINE_NOTICE: &str = "No downstream snapshot given: new manual changes in the catalog cannot be detected \
and may be overwritten by this file, earlier ones are replayed from the ledger";

/// Give articles without order number a reproducible one
fn assign_content_keys(articles: &mut [ArticleRecord], notes: &mut Notifications) {
    for article in articles.iter_mut().filter(|a| a.order_number.trim().is_empty()) {
        let key = article.compute_content_key();
        notes.push(format!(
            "Article \"{}\" has no order number, using {}",
            article.name, key
        ));
        article.order_number = key;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attribute, AttributeValue};
    use crate::units::{UnitReplacement, UnitRule};
    use std::collections::HashSet;

    struct StaticSource(Vec<ArticleRecord>);

    impl ArticleSource for StaticSource {
        fn extract(&self, _notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct StaticCatalog(Vec<ArticleRecord>);

    impl DownstreamCatalog for StaticCatalog {
        fn fetch(&self, _catalog_id: &str, _notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
            Ok(self.0.clone())
        }
    }

    struct OfflineCatalog;

    impl DownstreamCatalog for OfflineCatalog {
        fn fetch(&self, _catalog_id: &str, _notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
            anyhow::bail!("connection refused")
        }
    }

    fn create_test_article(order_number: &str, name: &str, unit: &str, orig_unit: &str) -> ArticleRecord {
        ArticleRecord::new(order_number, name)
            .with_unit(unit, orig_unit)
            .with_price(2.0)
            .with_category("Obst")
    }

    fn create_test_config() -> ImportConfig {
        ImportConfig::new("hof-sonnig").with_catalog("17")
    }

    #[test]
    fn test_same_name_different_units() {
        let config = create_test_config();
        let source = StaticSource(vec![
            create_test_article("1", "Apfel", "1 kg", "kg"),
            create_test_article("2", "Apfel", "1 l", "l"),
        ]);
        let mut ledger = ManualChangeLedger::new();

        let outcome = ImportRun::new(&config)
            .execute(&source, None, None, &mut ledger)
            .unwrap();

        let names: Vec<&str> = outcome.articles.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Apfel (kg)", "Apfel (l)"]);
        assert_eq!(outcome.extracted, outcome.articles);
    }

    #[test]
    fn test_manual_edit_adopted_then_replayed() {
        let config = create_test_config();
        let source = StaticSource(vec![create_test_article("42", "Apfel", "1 kg", "kg")]);
        let downstream = StaticCatalog(vec![create_test_article("42", "Apfel (Sorte Golden)", "1 kg", "")]);
        let mut ledger = ManualChangeLedger::new();
        let run = ImportRun::new(&config);

        // First run: nothing to compare against yet
        let first = run.execute(&source, Some(&downstream), None, &mut ledger).unwrap();
        assert_eq!(first.articles[0].name, "Apfel");

        // Second run: administrator renamed it downstream
        let second = run
            .execute(&source, Some(&downstream), Some(&first.extracted), &mut ledger)
            .unwrap();
        assert_eq!(second.articles[0].name, "Apfel (Sorte Golden)");
        assert_eq!(
            ledger.get("42", Attribute::Name).unwrap().manual,
            AttributeValue::Text("Apfel (Sorte Golden)".into())
        );
        let events = second.ledger_events("hof-sonnig");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_id, "hof-sonnig/42");

        // Third run: offline, the ledger alone restores the edit
        let third = run.execute(&source, None, Some(&second.extracted), &mut ledger).unwrap();
        assert_eq!(third.articles[0].name, "Apfel (Sorte Golden)");

        println!("✅ {}", third.report.summary());
    }

    #[test]
    fn test_duplicate_order_numbers_suffixed() {
        let config = create_test_config();
        let source = StaticSource(vec![
            create_test_article("7", "Apfel", "1 kg", "kg"),
            create_test_article("7", "Birne", "1 kg", "kg"),
        ]);
        let mut ledger = ManualChangeLedger::new();

        let outcome = ImportRun::new(&config).execute(&source, None, None, &mut ledger).unwrap();

        assert_eq!(outcome.articles[0].order_number, "7_0");
        assert_eq!(outcome.articles[1].order_number, "7_1");
        // Snapshot keeps the unsuffixed keys for the next reconciliation
        assert_eq!(outcome.extracted[0].order_number, "7");
        assert!(outcome.notifications.contains("used by 2 articles"));
    }

    fn create_test_grain_config() -> ImportConfig {
        let mut config = create_test_config();
        config.unit_rules = vec![UnitRule {
            id: Some("getreide".to_string()),
            categories: vec!["Getreide".to_string()],
            articles: Vec::new(),
            matcher: Default::default(),
            original_units: vec!["25 kg".to_string()],
            replacements: vec![
                UnitReplacement { unit: "1 kg".to_string(), factor: 0.04 },
                UnitReplacement { unit: "5 kg".to_string(), factor: 0.2 },
            ],
        }];
        config
    }

    /// Run, write the catalog file and return the outcome
    fn run_and_export(
        config: &ImportConfig,
        source: &StaticSource,
        downstream: Option<&dyn DownstreamCatalog>,
        previous: Option<&[ArticleRecord]>,
        ledger: &mut ManualChangeLedger,
        export: &Path,
    ) -> RunOutcome {
        let mut outcome = ImportRun::new(config)
            .execute(source, downstream, previous, ledger)
            .unwrap();
        outcome.write_csv(export).unwrap();
        outcome
    }

    #[test]
    fn test_unit_variants_get_unique_names_and_keys() {
        let config = create_test_grain_config();
        let source = StaticSource(vec![ArticleRecord::new("5", "Dinkel")
            .with_unit("25 kg", "kg")
            .with_price(50.0)
            .with_category("Getreide")]);
        let mut ledger = ManualChangeLedger::new();

        let outcome = ImportRun::new(&config).execute(&source, None, None, &mut ledger).unwrap();

        assert_eq!(outcome.articles.len(), 2);
        assert_eq!(outcome.articles[0].name, "Dinkel (1 kg)");
        assert_eq!(outcome.articles[0].price_net, 2.0);
        assert_eq!(outcome.articles[1].name, "Dinkel (5 kg)");
        assert_eq!(outcome.articles[1].price_net, 10.0);

        let keys: HashSet<&str> = outcome.articles.iter().map(|a| a.order_number.as_str()).collect();
        assert_eq!(keys, HashSet::from(["5-1kg", "5-5kg"]));
        // Variant keys are final before reconciliation, nothing left to suffix
        assert!(!outcome.notifications.contains("used by"));
    }

    #[test]
    fn test_unchanged_export_records_no_manual_changes() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("17.csv");
        let config = create_test_config();
        let mut long_note = create_test_article("3", "Quitte", "1 kg", "kg");
        long_note.note = "n".repeat(300);
        let source = StaticSource(vec![
            create_test_article("1", "Apfel", "1 kg", "kg").with_price(2.794),
            create_test_article("2", "Birne ", " 500 g", "g"),
            long_note,
        ]);
        let catalog = CsvCatalogSnapshot::new(dir.path());
        let mut ledger = ManualChangeLedger::new();

        // Run 1 offline, its file is imported unchanged
        let first = run_and_export(&config, &source, None, None, &mut ledger, &export);
        // Run 2 against that very file
        let second = run_and_export(&config, &source, Some(&catalog), Some(&first.extracted), &mut ledger, &export);
        let ledger_after_second = ledger.clone();
        // Run 3 against the file written by run 2
        let third = run_and_export(&config, &source, Some(&catalog), Some(&second.extracted), &mut ledger, &export);

        for outcome in [&second, &third] {
            assert_eq!(outcome.report.recorded().count(), 0);
            assert!(outcome.report.changes.is_empty());
            assert!(!outcome.notifications.contains("changed manually"));
            assert_eq!(outcome.articles, first.articles);
        }
        // Only the sticky categories were seeded
        for (_, changes) in ledger.iter() {
            assert!(changes.keys().all(|attribute| attribute == "category"));
        }
        assert_eq!(ledger, ledger_after_second);
        assert_eq!(first.articles[0].price_net, 2.79);
        assert_eq!(first.articles[1].name, "Birne");

        println!("✅ Unchanged export round trip PASSED");
    }

    #[test]
    fn test_unit_variant_edit_detected_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("17.csv");
        let config = create_test_grain_config();
        let source = StaticSource(vec![ArticleRecord::new("5", "Dinkel")
            .with_unit("25 kg", "kg")
            .with_price(50.0)
            .with_category("Getreide")]);
        let catalog = CsvCatalogSnapshot::new(dir.path());
        let mut ledger = ManualChangeLedger::new();

        let first = run_and_export(&config, &source, None, None, &mut ledger, &export);

        // Administrator annotates the 1 kg variant in the catalog
        let mut notes = Notifications::new();
        let mut edited = csv_io::read_catalog(&export, &mut notes).unwrap();
        let one_kg = edited.iter_mut().find(|a| a.order_number == "5-1kg").unwrap();
        one_kg.note = "Admin note".to_string();
        csv_io::write_catalog(&export, &edited, &mut notes).unwrap();

        let second = run_and_export(&config, &source, Some(&catalog), Some(&first.extracted), &mut ledger, &export);
        let third = ImportRun::new(&config)
            .execute(&source, None, Some(&second.extracted), &mut ledger)
            .unwrap();

        for outcome in [&second, &third] {
            let one_kg = outcome.articles.iter().find(|a| a.order_number == "5-1kg").unwrap();
            let five_kg = outcome.articles.iter().find(|a| a.order_number == "5-5kg").unwrap();
            assert_eq!(one_kg.note, "Admin note");
            assert!(five_kg.note.is_empty());
        }
        assert!(ledger.get("5-1kg", Attribute::Note).is_some());
        assert!(ledger.get("5-5kg", Attribute::Note).is_none());
    }

    #[test]
    fn test_offline_run_says_so() {
        let config = create_test_config();
        let source = StaticSource(vec![create_test_article("1", "Apfel", "1 kg", "kg")]);
        let mut ledger = ManualChangeLedger::new();
        let run = ImportRun::new(&config);

        let offline = run.execute(&source, None, None, &mut ledger).unwrap();
        let online = run
            .execute(&source, Some(&StaticCatalog(Vec::new())), None, &mut ledger)
            .unwrap();

        assert!(offline.notifications.contains("No downstream snapshot given"));
        assert!(!online.notifications.contains("No downstream snapshot given"));
    }

    #[test]
    fn test_malformed_extraction_row_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = dir.path().join("articles.json");
        fs::write(
            &extraction,
            r#"[{"order_number": "1", "name": "Apfel", "unit": "1 kg", "price_net": 2.0},
                {"order_number": "2", "name": "Birne", "unit": "1 kg", "price_net": "2,50"},
                {"order_number": "3", "name": "Quitte", "unit": "1 kg", "price_net": 1.5, "vat": "sieben"}]"#,
        )
        .unwrap();
        let config = create_test_config();
        let mut ledger = ManualChangeLedger::new();

        let outcome = ImportRun::new(&config)
            .execute(&JsonArticleSource::new(&extraction), None, None, &mut ledger)
            .unwrap();

        assert_eq!(outcome.articles.len(), 3);
        assert_eq!(outcome.articles[1].price_net, 2.5);
        assert_eq!(outcome.articles[2].vat, 0.0);
        assert!(outcome.notifications.contains("could not read vat"));
    }

    #[test]
    fn test_category_rules_applied() {
        let mut config = create_test_config();
        config.category_rules =
            serde_json::from_str(r#"[{"name": "Obst & Gemüse", "original_categories": ["Obst"]}]"#).unwrap();
        let source = StaticSource(vec![create_test_article("1", "Apfel", "1 kg", "kg")]);
        let mut ledger = ManualChangeLedger::new();

        let outcome = ImportRun::new(&config).execute(&source, None, None, &mut ledger).unwrap();

        assert_eq!(outcome.articles[0].category, "Obst & Gemüse");
    }

    #[test]
    fn test_missing_order_number_gets_content_key() {
        let config = create_test_config();
        let article = create_test_article("", "Apfel", "1 kg", "kg");
        let expected = article.compute_content_key();
        let mut ledger = ManualChangeLedger::new();

        let outcome = ImportRun::new(&config)
            .execute(&StaticSource(vec![article]), None, None, &mut ledger)
            .unwrap();

        assert_eq!(outcome.articles[0].order_number, expected);
        assert_eq!(expected.len(), 12);
    }

    #[test]
    fn test_missing_catalog_id_is_fatal() {
        let config = ImportConfig::new("ohne-katalog");
        let source = StaticSource(vec![create_test_article("1", "Apfel", "1 kg", "kg")]);
        let downstream = StaticCatalog(Vec::new());
        let mut ledger = ManualChangeLedger::new();

        let err = ImportRun::new(&config)
            .execute(&source, Some(&downstream), None, &mut ledger)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::MissingCatalogId { .. })
        ));
    }

    #[test]
    fn test_downstream_failure_leaves_ledger_untouched() {
        let config = create_test_config();
        let source = StaticSource(vec![create_test_article("42", "Apfel", "1 kg", "kg")]);
        let mut ledger = ManualChangeLedger::new();
        ledger.record(
            "42",
            Attribute::Note,
            AttributeValue::Text(String::new()),
            AttributeValue::Text("frisch".into()),
        );
        let before = ledger.clone();

        let err = ImportRun::new(&config)
            .execute(&source, Some(&OfflineCatalog), None, &mut ledger)
            .unwrap_err();

        assert!(err.to_string().contains("connection refused"));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_sources_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = dir.path().join("articles.json");
        fs::write(
            &extraction,
            r#"[{"order_number": "1", "name": "Apfel", "unit": "1 kg", "price_net": 2.0, "category": "Obst"}]"#,
        )
        .unwrap();

        let mut notes = Notifications::new();
        let downstream_articles = vec![create_test_article("1", "Apfel", "1 kg", "")];
        csv_io::write_catalog(&dir.path().join("17.csv"), &downstream_articles, &mut notes).unwrap();

        let articles = JsonArticleSource::new(&extraction).extract(&mut notes).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].unit_quantity, 1);

        let snapshot = CsvCatalogSnapshot::new(dir.path()).fetch("17", &mut notes).unwrap();
        assert_eq!(snapshot[0].name, "Apfel");
        assert!(CsvCatalogSnapshot::new(dir.path()).fetch("99", &mut notes).is_err());
    }
}
