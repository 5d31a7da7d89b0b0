// ⚖️ Reconciliation Engine - Three-way merge of upstream-then, upstream-now and downstream-now
//
// For each tracked attribute of each article:
//   1. upstream unchanged since last run but downstream differs
//        → an administrator edited it: adopt downstream, record in the ledger
//   2. the ledger holds an override whose `replaced` value is still what
//      upstream delivers → replay the override
//   3. otherwise upstream wins
//
// A correction made once downstream therefore survives blind re-imports, and
// upstream regains control as soon as it really changes the value.

use crate::article::ArticleRecord;
use crate::attributes::{Attribute, AttributeValue};
use crate::ledger::ManualChangeLedger;
use crate::notifications::Notifications;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

/// How an override came to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdoptionSource {
    /// Newly detected in the downstream snapshot
    Downstream,
    /// Replayed from the ledger
    Ledger,
}

/// One override applied to an article during this run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerChange {
    pub key: String,
    pub order_number: String,
    pub name: String,
    pub attribute: Attribute,
    pub replaced: AttributeValue,
    pub manual: AttributeValue,
    pub source: AdoptionSource,
    /// True if the ledger was written (not just read)
    pub recorded: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub changes: Vec<LedgerChange>,
    pub article_count: usize,
    pub matched_previous: usize,
    pub matched_downstream: usize,
}

impl ReconciliationReport {
    /// Overrides written to the ledger during this run
    pub fn recorded(&self) -> impl Iterator<Item = &LedgerChange> {
        self.changes.iter().filter(|c| c.recorded)
    }

    pub fn summary(&self) -> String {
        let recorded = self.recorded().count();
        format!(
            "Reconciled {} articles ({} known from last run, {} found downstream): {} overrides applied, {} newly recorded",
            self.article_count,
            self.matched_previous,
            self.matched_downstream,
            self.changes.len(),
            recorded
        )
    }
}

// ============================================================================
// MANUAL CHANGE RECONCILER
// ============================================================================

pub struct ManualChangeReconciler {
    /// Attributes reconciled field by field
    pub tracked: Vec<Attribute>,

    /// Category follows the ledger unconditionally once recorded
    pub sticky_category: bool,

    /// Run-local order number prefix stripped to obtain stable keys
    pub key_prefix: Option<String>,
}

impl ManualChangeReconciler {
    pub fn new() -> Self {
        ManualChangeReconciler {
            tracked: Attribute::default_tracked(),
            sticky_category: true,
            key_prefix: None,
        }
    }

    pub fn with_tracked(mut self, tracked: Vec<Attribute>) -> Self {
        self.tracked = tracked;
        self
    }

    pub fn with_sticky_category(mut self, sticky: bool) -> Self {
        self.sticky_category = sticky;
        self
    }

    pub fn with_key_prefix(mut self, prefix: Option<String>) -> Self {
        self.key_prefix = prefix;
        self
    }

    /// Reconcile `current` in place against the previous run, the downstream
    /// snapshot and the ledger
    ///
    /// `previous` is None on a first run; `downstream` is None when no
    /// snapshot was requested (overrides are then replayed from the ledger only).
    pub fn reconcile(
        &self,
        current: &mut [ArticleRecord],
        previous: Option<&[ArticleRecord]>,
        downstream: Option<&[ArticleRecord]>,
        ledger: &mut ManualChangeLedger,
        notes: &mut Notifications,
    ) -> ReconciliationReport {
        let previous_index = self.index(previous.unwrap_or(&[]));
        let downstream_index = self.index(downstream.unwrap_or(&[]));
        let mut report = ReconciliationReport::default();

        for article in current.iter_mut().filter(|a| !a.ignore) {
            let key = article.stable_key(self.key_prefix.as_deref());
            let prev = previous_index.get(key.as_str()).copied();
            let down = downstream_index.get(key.as_str()).copied();

            report.article_count += 1;
            report.matched_previous += usize::from(prev.is_some());
            report.matched_downstream += usize::from(down.is_some());

            for &attr in &self.tracked {
                if attr == Attribute::Category && self.sticky_category {
                    continue;
                }
                if let Some(change) = self.reconcile_attribute(article, &key, attr, prev, down, ledger) {
                    notes.push(describe(&change));
                    report.changes.push(change);
                }
            }

            if self.sticky_category {
                if let Some(change) = self.reconcile_category(article, &key, down, ledger) {
                    notes.push(describe(&change));
                    report.changes.push(change);
                }
            }
        }

        tracing::info!(
            articles = report.article_count,
            overrides = report.changes.len(),
            recorded = report.recorded().count(),
            ledger_size = ledger.change_count(),
            "reconciliation complete"
        );

        report
    }

    fn index<'a>(&self, articles: &'a [ArticleRecord]) -> HashMap<String, &'a ArticleRecord> {
        let mut index = HashMap::new();
        for article in articles {
            index
                .entry(article.stable_key(self.key_prefix.as_deref()))
                .or_insert(article);
        }
        index
    }

    fn reconcile_attribute(
        &self,
        article: &mut ArticleRecord,
        key: &str,
        attr: Attribute,
        prev: Option<&ArticleRecord>,
        down: Option<&ArticleRecord>,
        ledger: &mut ManualChangeLedger,
    ) -> Option<LedgerChange> {
        let current = attr.get(article);

        // Rule 1: fresh administrator edit
        if let (Some(prev), Some(down)) = (prev, down) {
            let downstream = attr.get(down);
            if current != downstream && current == attr.get(prev) {
                attr.set(article, &downstream);
                let recorded = ledger.record(key, attr, current.clone(), downstream.clone());
                return Some(self.change(article, key, attr, current, downstream, AdoptionSource::Downstream, recorded));
            }
        }

        // Rule 2: replay a recorded override while upstream still sends the old value
        let change = ledger.get(key, attr)?;
        if change.replaced == current && change.manual != current {
            let manual = change.manual.clone();
            attr.set(article, &manual);
            return Some(self.change(article, key, attr, current, manual, AdoptionSource::Ledger, false));
        }

        // Rule 3: upstream wins
        None
    }

    fn reconcile_category(
        &self,
        article: &mut ArticleRecord,
        key: &str,
        down: Option<&ArticleRecord>,
        ledger: &mut ManualChangeLedger,
    ) -> Option<LedgerChange> {
        let attr = Attribute::Category;
        let current = attr.get(article);
        let downstream = down
            .map(|d| attr.get(d))
            .filter(|value| !value.is_empty());

        match (ledger.get(key, attr).cloned(), downstream) {
            // Downstream moved away from the recorded category: newer override
            (Some(entry), Some(downstream)) if downstream != entry.manual => {
                attr.set(article, &downstream);
                let recorded = ledger.record(key, attr, current.clone(), downstream.clone());
                Some(self.change(article, key, attr, current, downstream, AdoptionSource::Downstream, recorded))
            }
            // Recorded category always wins over extraction
            (Some(entry), _) => {
                if entry.manual == current {
                    return None;
                }
                attr.set(article, &entry.manual);
                Some(self.change(article, key, attr, current, entry.manual, AdoptionSource::Ledger, false))
            }
            // First sighting downstream seeds the ledger
            (None, Some(downstream)) => {
                attr.set(article, &downstream);
                let recorded = ledger.record(key, attr, current.clone(), downstream.clone());
                if current == downstream {
                    tracing::debug!(key, "category seeded from downstream");
                    return None;
                }
                Some(self.change(article, key, attr, current, downstream, AdoptionSource::Downstream, recorded))
            }
            (None, None) => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn change(
        &self,
        article: &ArticleRecord,
        key: &str,
        attribute: Attribute,
        replaced: AttributeValue,
        manual: AttributeValue,
        source: AdoptionSource,
        recorded: bool,
    ) -> LedgerChange {
        LedgerChange {
            key: key.to_string(),
            order_number: article.order_number.clone(),
            name: article.name.clone(),
            attribute,
            replaced,
            manual,
            source,
            recorded,
        }
    }
}

impl Default for ManualChangeReconciler {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(change: &LedgerChange) -> String {
    match change.source {
        AdoptionSource::Downstream => format!(
            "Article {} \"{}\": {} \"{}\" was changed manually to \"{}\", keeping the manual value",
            change.order_number, change.name, change.attribute, change.replaced, change.manual
        ),
        AdoptionSource::Ledger => format!(
            "Article {} \"{}\": {} \"{}\" replaced by earlier manual change \"{}\"",
            change.order_number, change.name, change.attribute, change.replaced, change.manual
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_article(order_number: &str, name: &str, price: f64) -> ArticleRecord {
        ArticleRecord::new(order_number, name)
            .with_unit("1 kg", "kg")
            .with_price(price)
            .with_category("Obst")
    }

    fn run(
        current: &[ArticleRecord],
        previous: Option<&[ArticleRecord]>,
        downstream: Option<&[ArticleRecord]>,
        ledger: &mut ManualChangeLedger,
    ) -> (Vec<ArticleRecord>, Notifications, ReconciliationReport) {
        let reconciler = ManualChangeReconciler::new();
        let mut notes = Notifications::new();
        let mut articles = current.to_vec();
        let report = reconciler.reconcile(&mut articles, previous, downstream, ledger, &mut notes);
        (articles, notes, report)
    }

    #[test]
    fn test_scenario_manual_name_adopted() {
        let previous = vec![create_test_article("42", "Apfel", 2.0)];
        let current = vec![create_test_article("42", "Apfel", 2.0)];
        let downstream = vec![create_test_article("42", "Apfel (Sorte Golden)", 2.0)];
        let mut ledger = ManualChangeLedger::new();

        let (articles, notes, report) = run(&current, Some(&previous), Some(&downstream), &mut ledger);

        assert_eq!(articles[0].name, "Apfel (Sorte Golden)");
        let change = ledger.get("42", Attribute::Name).unwrap();
        assert_eq!(change.replaced, AttributeValue::Text("Apfel".into()));
        assert_eq!(change.manual, AttributeValue::Text("Apfel (Sorte Golden)".into()));
        assert!(notes.contains("Apfel (Sorte Golden)"));
        assert_eq!(report.recorded().count(), 1);
        // Unchanged category is still seeded so it stays sticky
        assert!(ledger.get("42", Attribute::Category).is_some());

        println!("✅ {}", report.summary());
    }

    #[test]
    fn test_scenario_override_replayed_without_downstream() {
        let mut ledger = ManualChangeLedger::new();
        let previous = vec![create_test_article("42", "Apfel", 2.0)];
        let downstream = vec![create_test_article("42", "Apfel (Sorte Golden)", 2.0)];
        run(&previous, Some(&previous), Some(&downstream), &mut ledger);

        let current = vec![create_test_article("42", "Apfel", 2.0)];
        let (articles, _, report) = run(&current, Some(&previous), None, &mut ledger);

        assert_eq!(articles[0].name, "Apfel (Sorte Golden)");
        assert_eq!(report.changes[0].source, AdoptionSource::Ledger);
        assert!(!report.changes[0].recorded);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let previous = vec![create_test_article("1", "Apfel", 2.0), create_test_article("2", "Birne", 3.0)];
        let current = previous.clone();
        let downstream = vec![create_test_article("1", "Apfel", 2.4), create_test_article("2", "Birne", 3.0)];
        let mut ledger = ManualChangeLedger::new();

        let (first, _, _) = run(&current, Some(&previous), Some(&downstream), &mut ledger);
        let ledger_after_first = ledger.clone();
        let (second, _, report) = run(&current, Some(&previous), Some(&downstream), &mut ledger);

        assert_eq!(first, second);
        assert_eq!(ledger, ledger_after_first);
        assert_eq!(report.recorded().count(), 0);
        assert_eq!(second[0].price_net, 2.4);
    }

    #[test]
    fn test_downstream_edit_survives_two_runs() {
        let upstream = vec![create_test_article("1", "Apfel", 2.0)];
        let mut downstream = vec![create_test_article("1", "Apfel", 2.0)];
        downstream[0].note = "vom Nachbarhof".to_string();
        let mut ledger = ManualChangeLedger::new();

        // Run 1: edit detected
        let (run1, _, _) = run(&upstream, Some(&upstream), Some(&downstream), &mut ledger);
        // Run 2: downstream now holds what run 1 wrote
        let (run2, _, _) = run(&upstream, Some(&upstream), Some(&run1), &mut ledger);
        // Run 3: downstream unreachable, ledger only
        let (run3, _, _) = run(&upstream, Some(&upstream), None, &mut ledger);

        for articles in [&run1, &run2, &run3] {
            assert_eq!(articles[0].note, "vom Nachbarhof");
        }
    }

    #[test]
    fn test_upstream_change_wins_back_control() {
        let previous = vec![create_test_article("1", "Apfel", 2.0)];
        let downstream = vec![create_test_article("1", "Apfel", 2.2)];
        let mut ledger = ManualChangeLedger::new();
        run(&previous, Some(&previous), Some(&downstream), &mut ledger);

        // Upstream raises the price itself
        let current = vec![create_test_article("1", "Apfel", 2.5)];
        let (articles, notes, _) = run(&current, Some(&previous), Some(&downstream), &mut ledger);

        assert_eq!(articles[0].price_net, 2.5);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_first_run_leaves_upstream_untouched() {
        let current = vec![create_test_article("1", "Apfel", 2.0)];
        let downstream = vec![create_test_article("1", "Äpfel", 9.0)];
        let mut ledger = ManualChangeLedger::new();

        let (articles, _, _) = run(&current, None, Some(&downstream), &mut ledger);

        assert_eq!(articles[0].name, "Apfel");
        assert_eq!(articles[0].price_net, 2.0);
        assert!(ledger.get("1", Attribute::Name).is_none());
    }

    #[test]
    fn test_category_is_sticky() {
        let mut ledger = ManualChangeLedger::new();
        let current = vec![create_test_article("1", "Apfel", 2.0)];
        let downstream = vec![create_test_article("1", "Apfel", 2.0).with_category("Regional")];

        let (articles, _, _) = run(&current, None, Some(&downstream), &mut ledger);
        assert_eq!(articles[0].category, "Regional");

        // Upstream re-sorts the article; the recorded category still wins
        let moved = vec![create_test_article("1", "Apfel", 2.0).with_category("Kernobst")];
        let (articles, _, _) = run(&moved, Some(&current), None, &mut ledger);
        assert_eq!(articles[0].category, "Regional");

        // A newer downstream choice replaces the entry
        let recategorized = vec![create_test_article("1", "Apfel", 2.0).with_category("Angebote")];
        let (articles, _, _) = run(&moved, Some(&current), Some(&recategorized), &mut ledger);
        assert_eq!(articles[0].category, "Angebote");
        assert_eq!(
            ledger.get("1", Attribute::Category).unwrap().manual,
            AttributeValue::Text("Angebote".into())
        );
    }

    #[test]
    fn test_prefix_is_stripped_for_matching() {
        let reconciler = ManualChangeReconciler::new().with_key_prefix(Some("MB-".to_string()));
        let mut notes = Notifications::new();
        let mut ledger = ManualChangeLedger::new();
        let previous = vec![create_test_article("MB-7", "Apfel", 2.0)];
        let mut current = previous.clone();
        let downstream = vec![create_test_article("7", "Apfel", 2.0).with_manufacturer("Hof Sonnig")];

        reconciler.reconcile(&mut current, Some(&previous), Some(&downstream), &mut ledger, &mut notes);

        assert_eq!(current[0].manufacturer, "Hof Sonnig");
        assert!(ledger.get("7", Attribute::Manufacturer).is_some());
    }

    #[test]
    fn test_untracked_attribute_is_left_alone() {
        let reconciler = ManualChangeReconciler::new().with_tracked(vec![Attribute::Name]);
        let mut notes = Notifications::new();
        let mut ledger = ManualChangeLedger::new();
        let previous = vec![create_test_article("1", "Apfel", 2.0)];
        let mut current = previous.clone();
        let downstream = vec![create_test_article("1", "Apfel", 2.2)];

        reconciler.reconcile(&mut current, Some(&previous), Some(&downstream), &mut ledger, &mut notes);

        assert_eq!(current[0].price_net, 2.0);
        assert!(ledger.get("1", Attribute::PriceNet).is_none());
    }
}
