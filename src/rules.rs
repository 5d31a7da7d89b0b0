// 🏷️ Category Rules - Rules as Data
// Pattern matching shared by the rule tables, plus the category resorter

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// PATTERN MATCHING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Whole text equals the pattern
    #[default]
    Exact,
    /// Pattern occurs anywhere in the text
    Contains,
    /// Pattern with `*` wildcards, anchored at both ends
    Wildcard,
}

/// How a list of patterns is compared against a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Matcher {
    #[serde(default)]
    pub mode: MatchMode,

    #[serde(default)]
    pub case_sensitive: bool,
}

impl Matcher {
    pub fn new(mode: MatchMode, case_sensitive: bool) -> Self {
        Matcher { mode, case_sensitive }
    }

    /// Check if a single pattern matches the given text
    pub fn matches(&self, pattern: &str, text: &str) -> bool {
        let (pattern, text) = if self.case_sensitive {
            (pattern.to_string(), text.to_string())
        } else {
            (pattern.to_lowercase(), text.to_lowercase())
        };

        match self.mode {
            MatchMode::Exact => text == pattern,
            MatchMode::Contains => text.contains(&pattern),
            MatchMode::Wildcard => wildcard_match(&pattern, &text),
        }
    }

    /// Check if any pattern in the list matches
    pub fn matches_any(&self, patterns: &[String], text: &str) -> bool {
        patterns.iter().any(|p| self.matches(p, text))
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return text == pattern;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];

    // Check if text starts with first part
    if !text.starts_with(first) {
        return false;
    }

    // Check if text ends with last part (without overlapping the start)
    if text.len() < first.len() + last.len() || !text.ends_with(last) {
        return false;
    }

    // Check middle parts appear in order
    let end = text.len() - last.len();
    let mut current_pos = first.len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[current_pos..end].find(part) {
            Some(pos) => current_pos += pos + part.len(),
            None => return false,
        }
    }

    true
}

// ============================================================================
// CATEGORY RULE DEFINITION
// ============================================================================

/// Sub-target inside a matched category, chosen by article name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCategory {
    pub name: String,
    pub articles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Target category for a plain remap
    pub name: String,

    /// Source categories this rule applies to
    pub original_categories: Vec<String>,

    /// Matching applied to `original_categories`
    #[serde(default)]
    pub category_match: Matcher,

    /// Name-based split of the matched category (first match wins)
    #[serde(default)]
    pub target_categories: Vec<TargetCategory>,

    /// Matching applied to the article names in `target_categories`
    #[serde(default)]
    pub article_match: Matcher,

    /// Category for articles no target claims
    #[serde(default)]
    pub rest: Option<String>,
}

impl CategoryRule {
    pub fn applies_to(&self, category: &str) -> bool {
        self.category_match
            .matches_any(&self.original_categories, category)
    }

    /// Resolve the target for an article of a matched category
    pub fn resolve(&self, article_name: &str) -> Option<String> {
        if self.target_categories.is_empty() {
            return Some(self.name.clone());
        }

        self.target_categories
            .iter()
            .find(|t| self.article_match.matches_any(&t.articles, article_name))
            .map(|t| t.name.clone())
            .or_else(|| self.rest.clone())
    }
}

// ============================================================================
// CATEGORY RESORTER
// ============================================================================

pub struct CategoryResorter {
    rules: Vec<CategoryRule>,
    return_original: bool,
}

impl CategoryResorter {
    pub fn new() -> Self {
        CategoryResorter {
            rules: Vec::new(),
            return_original: true,
        }
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read category rules: {:?}", path.as_ref()))?;

        let rules: Vec<CategoryRule> =
            serde_json::from_str(&content).context("Failed to parse category rules JSON")?;

        Ok(CategoryResorter::from_rules(rules))
    }

    /// Create resorter from rules; table order is evaluation order
    pub fn from_rules(rules: Vec<CategoryRule>) -> Self {
        CategoryResorter {
            rules,
            return_original: true,
        }
    }

    /// Builder: whether an unmatched category is kept or dropped
    pub fn with_return_original(mut self, return_original: bool) -> Self {
        self.return_original = return_original;
        self
    }

    /// Find the category for an article
    ///
    /// Only the first rule whose `original_categories` match is consulted,
    /// later rules are shadowed even if they would also match.
    pub fn resort(&self, article_name: &str, category: &str) -> Option<String> {
        let resolved = self
            .rules
            .iter()
            .find(|rule| rule.applies_to(category))
            .and_then(|rule| rule.resolve(article_name));

        match resolved {
            Some(target) => Some(target),
            None if self.return_original => Some(category.to_string()),
            None => None,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for CategoryResorter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_rule(name: &str, originals: &[&str]) -> CategoryRule {
        CategoryRule {
            name: name.to_string(),
            original_categories: originals.iter().map(|s| s.to_string()).collect(),
            category_match: Matcher::default(),
            target_categories: Vec::new(),
            article_match: Matcher::new(MatchMode::Contains, false),
            rest: None,
        }
    }

    #[test]
    fn test_exact_and_contains_match() {
        let exact = Matcher::new(MatchMode::Exact, false);
        assert!(exact.matches("OBST", "obst"));
        assert!(!exact.matches("Obst", "Obst & Gemüse"));

        let contains = Matcher::new(MatchMode::Contains, true);
        assert!(contains.matches("Obst", "Obst & Gemüse"));
        assert!(!contains.matches("obst", "Obst & Gemüse"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let m = Matcher::new(MatchMode::Wildcard, false);

        assert!(m.matches("Käse*", "Käse Gouda"));
        assert!(m.matches("*saft", "Apfelsaft"));
        assert!(m.matches("a*b*c", "axxbyyc"));
        assert!(!m.matches("Käse*", "Hartkäse"));
        assert!(!m.matches("ab*ba", "aba"));
    }

    #[test]
    fn test_plain_remap() {
        let resorter = CategoryResorter::from_rules(vec![create_test_rule("Obst", &["Äpfel", "Birnen"])]);

        assert_eq!(resorter.resort("Boskop", "Äpfel"), Some("Obst".to_string()));
        assert_eq!(resorter.resort("Milch", "Molkerei"), Some("Molkerei".to_string()));
    }

    #[test]
    fn test_target_categories_and_rest() {
        let mut rule = create_test_rule("Getränke", &["Flüssiges"]);
        rule.target_categories = vec![
            TargetCategory {
                name: "Säfte".to_string(),
                articles: vec!["saft".to_string()],
            },
            TargetCategory {
                name: "Milchprodukte".to_string(),
                articles: vec!["milch".to_string()],
            },
        ];
        rule.rest = Some("Sonstige Getränke".to_string());
        let resorter = CategoryResorter::from_rules(vec![rule]);

        assert_eq!(resorter.resort("Apfelsaft", "Flüssiges").as_deref(), Some("Säfte"));
        assert_eq!(resorter.resort("Hafermilch", "Flüssiges").as_deref(), Some("Milchprodukte"));
        assert_eq!(resorter.resort("Wasser", "Flüssiges").as_deref(), Some("Sonstige Getränke"));
    }

    #[test]
    fn test_unmatched_target_without_rest_falls_back() {
        let mut rule = create_test_rule("Getränke", &["Flüssiges"]);
        rule.target_categories = vec![TargetCategory {
            name: "Säfte".to_string(),
            articles: vec!["saft".to_string()],
        }];

        let keep = CategoryResorter::from_rules(vec![rule.clone()]);
        assert_eq!(keep.resort("Wasser", "Flüssiges").as_deref(), Some("Flüssiges"));

        let drop = CategoryResorter::from_rules(vec![rule]).with_return_original(false);
        assert_eq!(drop.resort("Wasser", "Flüssiges"), None);
    }

    #[test]
    fn test_first_matching_rule_shadows_later_rules() {
        let resorter = CategoryResorter::from_rules(vec![
            create_test_rule("Erste", &["Obst"]),
            create_test_rule("Zweite", &["Obst"]),
        ]);

        assert_eq!(resorter.resort("Apfel", "Obst").as_deref(), Some("Erste"));
    }

    #[test]
    fn test_rules_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        fs::write(
            &path,
            r#"[{"name": "Obst", "original_categories": ["Früchte"],
                 "category_match": {"mode": "contains", "case_sensitive": false}}]"#,
        )
        .unwrap();

        let resorter = CategoryResorter::from_file(&path).unwrap();
        assert_eq!(resorter.rule_count(), 1);
        assert_eq!(resorter.resort("Apfel", "Frische Früchte").as_deref(), Some("Obst"));
    }
}
