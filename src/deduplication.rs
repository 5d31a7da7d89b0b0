// 🔍 Deduplication Engine - Make names and order numbers unique per batch
// Names: cascade through distinguishing attributes, then number or drop.
// Keys: suffix colliding order numbers with a free "_<index>".

use crate::article::{normalize, ArticleRecord};
use crate::notifications::Notifications;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// DISAMBIGUATOR
// ============================================================================

/// Attribute used to tell same-named articles apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disambiguator {
    OrigUnit,
    Unit,
    Manufacturer,
    Origin,
    Category,
}

impl Disambiguator {
    /// Default cascade priority
    pub fn default_order() -> Vec<Disambiguator> {
        vec![
            Disambiguator::OrigUnit,
            Disambiguator::Unit,
            Disambiguator::Manufacturer,
            Disambiguator::Origin,
            Disambiguator::Category,
        ]
    }

    pub fn value<'a>(&self, article: &'a ArticleRecord) -> &'a str {
        match self {
            Disambiguator::OrigUnit => &article.orig_unit,
            Disambiguator::Unit => &article.unit,
            Disambiguator::Manufacturer => &article.manufacturer,
            Disambiguator::Origin => &article.origin,
            Disambiguator::Category => &article.category,
        }
    }

    /// Name suffix, with the locale preposition where one reads naturally
    pub fn suffix(&self, value: &str) -> String {
        match self {
            Disambiguator::Manufacturer => format!(" (von {})", value),
            Disambiguator::Origin => format!(" (aus {})", value),
            _ => format!(" ({})", value),
        }
    }
}

/// Indices of non-ignored articles sharing a normalized name, first-seen order
fn collision_groups(articles: &[ArticleRecord]) -> Vec<Vec<usize>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();

    for (i, article) in articles.iter().enumerate() {
        if article.ignore {
            continue;
        }
        let key = article.normalized_name();
        let members = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        members.push(i);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|members| members.len() > 1)
        .collect()
}

// ============================================================================
// DUPLICATE NAME RESOLVER
// ============================================================================

pub struct DuplicateNameResolver {
    /// Cascade order (caller-configurable)
    pub strategies: Vec<Disambiguator>,

    /// Number full duplicates instead of dropping all but the first
    pub keep_full_duplicates: bool,
}

impl DuplicateNameResolver {
    pub fn new() -> Self {
        DuplicateNameResolver {
            strategies: Disambiguator::default_order(),
            keep_full_duplicates: true,
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Disambiguator>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_keep_full_duplicates(mut self, keep: bool) -> Self {
        self.keep_full_duplicates = keep;
        self
    }

    /// Make all non-ignored names unique (case- and whitespace-insensitive)
    ///
    /// Names are changed in place; dropped duplicates are marked `ignore`.
    pub fn resolve(&self, articles: &mut [ArticleRecord], notes: &mut Notifications) {
        let mut used: HashSet<(usize, Disambiguator)> = HashSet::new();

        // A rename can collide with a name elsewhere in the batch, so the
        // cascade repeats until it stops making progress.
        loop {
            let groups = collision_groups(articles);
            if groups.is_empty() {
                return;
            }

            let mut progress = false;
            for group in groups {
                progress |= self.cascade(articles, group, &mut used);
            }

            if !progress {
                break;
            }
        }

        self.resolve_full_duplicates(articles, notes);
    }

    /// Walk the strategies for one group; returns true if anything was renamed
    fn cascade(
        &self,
        articles: &mut [ArticleRecord],
        mut pending: Vec<usize>,
        used: &mut HashSet<(usize, Disambiguator)>,
    ) -> bool {
        let mut renamed_any = false;

        for &strategy in &self.strategies {
            if pending.len() < 2 {
                break;
            }

            let distinct: Vec<usize> = pending
                .iter()
                .copied()
                .filter(|&i| {
                    let value = normalize(strategy.value(&articles[i]));
                    !value.is_empty()
                        && !used.contains(&(i, strategy))
                        && pending
                            .iter()
                            .all(|&j| j == i || normalize(strategy.value(&articles[j])) != value)
                })
                .collect();

            for &i in &distinct {
                let suffix = strategy.suffix(strategy.value(&articles[i]).trim());
                articles[i].name.push_str(&suffix);
                used.insert((i, strategy));
                renamed_any = true;
            }

            pending.retain(|i| !distinct.contains(i));
        }

        renamed_any
    }

    fn resolve_full_duplicates(&self, articles: &mut [ArticleRecord], notes: &mut Notifications) {
        let groups = collision_groups(articles);
        if groups.is_empty() {
            return;
        }

        let mut taken: HashSet<String> = articles
            .iter()
            .filter(|a| !a.ignore)
            .map(|a| a.normalized_name())
            .collect();

        for group in groups {
            if self.keep_full_duplicates {
                let base = articles[group[0]].name.clone();
                let mut counter = 1usize;
                for &i in &group {
                    let mut candidate = format!("{} ({})", base, counter);
                    while taken.contains(&normalize(&candidate)) {
                        counter += 1;
                        candidate = format!("{} ({})", base, counter);
                    }
                    taken.insert(normalize(&candidate));
                    articles[i].name = candidate;
                    counter += 1;
                }
                tracing::debug!(name = %base, count = group.len(), "numbered full duplicates");
            } else {
                for &i in &group[1..] {
                    let article = &mut articles[i];
                    article.ignore = true;
                    notes.push(format!(
                        "Article {} \"{}\" is an exact duplicate and was skipped",
                        article.order_number, article.name
                    ));
                }
            }
        }
    }
}

impl Default for DuplicateNameResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DUPLICATE KEY RESOLVER
// ============================================================================

pub struct DuplicateKeyResolver;

impl DuplicateKeyResolver {
    pub fn new() -> Self {
        DuplicateKeyResolver
    }

    /// Make every order number unique by appending "_<index>" to colliding ones
    pub fn resolve(&self, articles: &mut [ArticleRecord], notes: &mut Notifications) {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, article) in articles.iter().enumerate() {
            let members = groups.entry(article.order_number.clone()).or_insert_with(|| {
                order.push(article.order_number.clone());
                Vec::new()
            });
            members.push(i);
        }

        let mut taken: HashSet<String> = groups.keys().cloned().collect();

        for key in order {
            let members = match groups.get(&key) {
                Some(members) if members.len() > 1 => members,
                _ => continue,
            };

            for (position, &i) in members.iter().enumerate() {
                let mut index = position;
                let mut candidate = format!("{}_{}", key, index);
                while taken.contains(&candidate) {
                    index += 1;
                    candidate = format!("{}_{}", key, index);
                }
                taken.insert(candidate.clone());
                articles[i].order_number = candidate;
            }

            notes.push(format!(
                "Order number \"{}\" was used by {} articles, renamed {} entries",
                key,
                members.len(),
                members.len()
            ));
        }
    }
}

impl Default for DuplicateKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
