//! Search criteria: attribute name to the set of accepted values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Accepted values per attribute.
///
/// Attributes that are absent, or whose value set is empty, are not
/// filtered on.
///
/// Deserialized criteria go through [`SearchCriteria::insert`], so they are
/// normalized the same way as built ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, BTreeSet<String>>"
)]
pub struct SearchCriteria {
    fields: BTreeMap<String, BTreeSet<String>>,
}

impl From<BTreeMap<String, Vec<String>>> for SearchCriteria {
    fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
        let mut criteria = Self::new();
        for (field, values) in raw {
            criteria.insert(field, values);
        }
        criteria
    }
}

impl From<SearchCriteria> for BTreeMap<String, BTreeSet<String>> {
    fn from(criteria: SearchCriteria) -> Self {
        criteria.fields
    }
}

impl SearchCriteria {
    /// Create empty criteria (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add accepted values for an attribute, merging with any already present.
    pub fn with<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(field, values);
        self
    }

    /// Add accepted values for an attribute in place.
    ///
    /// Values are trimmed; blank values are dropped.
    pub fn insert<I, S>(&mut self, field: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.fields.entry(field.into()).or_default();
        for value in values {
            let value: String = value.into();
            let value = value.trim();
            if !value.is_empty() {
                entry.insert(value.to_string());
            }
        }
    }

    /// Attributes with at least one accepted value, in name order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.fields
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(field, values)| (field.as_str(), values))
    }

    /// Whether no attribute constrains the search.
    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_sets_are_inactive() {
        let criteria = SearchCriteria::new()
            .with("title", Vec::<String>::new())
            .with("author", ["  "]);
        assert!(criteria.is_unconstrained());
    }

    #[test]
    fn test_values_merge_and_trim() {
        let criteria = SearchCriteria::new()
            .with("author", [" Herbert "])
            .with("author", ["Le Guin", "Herbert"]);

        let active: Vec<_> = criteria.active().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, "author");
        assert_eq!(active[0].1.len(), 2);
        assert!(active[0].1.contains("Herbert"));
    }

    #[test]
    fn test_deserialize_from_map() {
        let criteria: SearchCriteria =
            serde_json::from_str(r#"{"isbn": ["978-0441013593"]}"#).unwrap();
        assert!(!criteria.is_unconstrained());
    }

    #[test]
    fn test_deserialize_normalizes_like_builder() {
        let parsed: SearchCriteria =
            serde_json::from_str(r#"{"title": [""], "author": [" Herbert ", "  "]}"#).unwrap();
        let built = SearchCriteria::new()
            .with("title", [""])
            .with("author", [" Herbert ", "  "]);

        assert_eq!(parsed, built);
        let active: Vec<_> = parsed.active().map(|(field, _)| field).collect();
        assert_eq!(active, vec!["author"]);
        assert!(parsed.active().all(|(_, values)| values.contains("Herbert")));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let criteria = SearchCriteria::new().with("isbn", ["1", "2"]);
        let json = serde_json::to_string(&criteria).unwrap();
        assert_eq!(json, r#"{"isbn":["1","2"]}"#);
    }
}
