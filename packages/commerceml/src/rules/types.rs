//! Collect rules and the rule table.

use std::fmt;

use super::path::{path_equals, path_starts_with};
use crate::error::{ParserError, Result};

/// Which subtree to extract and which of its descendants to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRule {
    /// Absolute path of the element that starts a collection.
    pub start: Vec<String>,
    /// Path prefixes whose elements are written into the fragment.
    ///
    /// Empty means only the start element's own tag and attributes are kept.
    pub include: Vec<Vec<String>>,
}

impl CollectRule {
    /// Create a rule starting at `start` with no included descendants.
    #[must_use]
    pub fn new<I, S>(start: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            start: start.into_iter().map(Into::into).collect(),
            include: Vec::new(),
        }
    }

    /// Add an include path.
    #[must_use]
    pub fn include<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.push(path.into_iter().map(Into::into).collect());
        self
    }

    /// Include the start element's whole subtree.
    #[must_use]
    pub fn include_all(self) -> Self {
        let start = self.start.clone();
        self.include(start)
    }

    /// Include each named direct child of the start element.
    #[must_use]
    pub fn include_children(self, children: &[&str]) -> Self {
        children.iter().fold(self, |rule, child| {
            let path: Vec<String> = rule
                .start
                .iter()
                .cloned()
                .chain(std::iter::once((*child).to_string()))
                .collect();
            rule.include(path)
        })
    }

    /// Whether `path` is exactly this rule's start element.
    #[must_use]
    pub fn starts_at<S: AsRef<str>>(&self, path: &[S]) -> bool {
        path_equals(path, &self.start)
    }

    /// Whether `path` is the start element or lies under an include prefix.
    #[must_use]
    pub fn covers<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.starts_at(path)
            || self
                .include
                .iter()
                .any(|prefix| path_starts_with(path, prefix))
    }
}

/// Immutable, ordered mapping from rule key to rule.
///
/// Declaration order is the evaluation order when several rules start at
/// the same path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    name: Option<String>,
    rules: Vec<(String, CollectRule)>,
}

impl RuleTable {
    /// Create an empty table. The name shows up in error messages.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rules: Vec::new(),
        }
    }

    /// Add a rule. A key that is already present is replaced in place.
    #[must_use]
    pub fn with_rule(mut self, key: impl Into<String>, rule: CollectRule) -> Self {
        let key = key.into();
        match self.rules.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = rule,
            None => self.rules.push((key, rule)),
        }
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CollectRule> {
        self.rules
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, rule)| rule)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Rule keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CollectRule)> {
        self.rules.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Keys of the rules whose start is exactly `path`, in declaration order.
    pub fn starting_at<'a, S: AsRef<str>>(
        &'a self,
        path: &'a [S],
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.rules
            .iter()
            .filter(move |(_, rule)| rule.starts_at(path))
            .map(|(key, _)| key.as_str())
    }

    /// Whether any rule covers `path`.
    ///
    /// This is deliberately table-wide rather than limited to the active
    /// rule: an element included by one rule is kept in whichever fragment
    /// is under construction.
    #[must_use]
    pub fn is_collectible<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.rules.iter().any(|(_, rule)| rule.covers(path))
    }

    /// Check that every rule has a start path and that include paths lie at
    /// or below their rule's start.
    ///
    /// # Errors
    /// Returns `ParserError::Config` naming the first offending rule.
    pub fn validate(&self) -> Result<()> {
        for (key, rule) in &self.rules {
            if rule.start.is_empty() {
                return Err(ParserError::Config(format!(
                    "rule '{key}' has an empty start path"
                )));
            }
            if let Some(include) = rule
                .include
                .iter()
                .find(|include| !path_starts_with(include, &rule.start))
            {
                return Err(ParserError::Config(format!(
                    "include path {} of rule '{key}' is not under its start {}",
                    include.join("/"),
                    rule.start.join("/")
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, rule) in &self.rules {
            writeln!(f, "{key}: {}", rule.start.join("/"))?;
            for include in &rule.include {
                writeln!(f, "  + {}", include.join("/"))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::new("test")
            .with_rule("root", CollectRule::new(["Root"]))
            .with_rule(
                "header",
                CollectRule::new(["Root", "Header"]).include_children(&["Id"]),
            )
            .with_rule("item", CollectRule::new(["Root", "Item"]).include_all())
    }

    #[test]
    fn test_include_children() {
        let rule = CollectRule::new(["A", "B"]).include_children(&["C", "D"]);
        assert_eq!(
            rule.include,
            vec![
                vec!["A".to_string(), "B".to_string(), "C".to_string()],
                vec!["A".to_string(), "B".to_string(), "D".to_string()],
            ]
        );
    }

    #[test]
    fn test_keys_keep_declaration_order() {
        let table = table();
        let keys: Vec<_> = table.keys().collect();
        assert_eq!(keys, vec!["root", "header", "item"]);
    }

    #[test]
    fn test_with_rule_replaces_existing_key() {
        let table = table().with_rule("root", CollectRule::new(["Other"]));
        assert_eq!(table.len(), 3);
        assert_eq!(table.keys().next(), Some("root"));
        assert!(table.get("root").is_some_and(|r| r.starts_at(&["Other"])));
    }

    #[test]
    fn test_starting_at() {
        let table = table();
        let path = ["Root", "Item"];
        let keys: Vec<_> = table.starting_at(&path).collect();
        assert_eq!(keys, vec!["item"]);
    }

    #[test]
    fn test_is_collectible() {
        let table = table();
        assert!(table.is_collectible(&["Root"]));
        assert!(table.is_collectible(&["Root", "Header"]));
        assert!(table.is_collectible(&["Root", "Header", "Id"]));
        assert!(!table.is_collectible(&["Root", "Header", "Extra"]));
        assert!(table.is_collectible(&["Root", "Item", "Deep", "Deeper"]));
        assert!(!table.is_collectible(&["Root", "Other"]));
    }

    #[test]
    fn test_validate() {
        assert!(table().validate().is_ok());

        let bad = RuleTable::new("bad").with_rule(
            "x",
            CollectRule::new(["Root", "A"]).include(["Root", "B"]),
        );
        assert!(bad.validate().is_err());

        let empty_start = RuleTable::new("bad").with_rule("x", CollectRule::new(Vec::<String>::new()));
        assert!(empty_start.validate().is_err());
    }

    #[test]
    fn test_display() {
        let rendered = table().to_string();
        assert!(rendered.contains("header: Root/Header"));
        assert!(rendered.contains("  + Root/Header/Id"));
    }
}
