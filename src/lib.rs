// Catalog Sync - Core Library
// Supplier article lists in, catalog-ready CSV out, with manual edits made
// in the catalog preserved across re-imports.

pub mod article;
pub mod attributes;     // Typed attribute access
pub mod notifications;
pub mod data_quality;   // Lenient parsing + value repair
pub mod units;          // Unit recalculation rules
pub mod rules;          // Category resort rules
pub mod deduplication;  // Unique names and order numbers
pub mod ledger;         // Manual change ledger
pub mod reconciliation; // Three-way merge against the catalog
pub mod config;
pub mod csv_io;
pub mod db;
pub mod pipeline;

// Re-export commonly used types
pub use article::{article_from_json, normalize, round2, stable_key, ArticleRecord};
pub use attributes::{Attribute, AttributeValue};
pub use config::ImportConfig;
pub use csv_io::{read_catalog, to_catalog_form, write_catalog};
pub use data_quality::{parse_number, DataQualityEngine, QualityThresholds};
pub use db::{
    get_events_for_entity, get_recent_events, insert_event, load_ledger, load_snapshot,
    open_database, promote_pending_snapshot, save_ledger, save_snapshot, setup_database, Event,
    Snapshot, SnapshotKind,
};
pub use deduplication::{Disambiguator, DuplicateKeyResolver, DuplicateNameResolver};
pub use ledger::{ManualChange, ManualChangeLedger, LEDGER_CONFIG_KEY};
pub use notifications::Notifications;
pub use pipeline::{
    ArticleSource, CsvCatalogSnapshot, DownstreamCatalog, ImportError, ImportRun,
    JsonArticleSource, RunOutcome,
};
pub use reconciliation::{
    AdoptionSource, LedgerChange, ManualChangeReconciler, ReconciliationReport,
};
pub use rules::{CategoryResorter, CategoryRule, MatchMode, Matcher, TargetCategory};
pub use units::{variant_key, UnitRecalculator, UnitReplacement, UnitRule};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
