//! Composable filter predicates.
//!
//! A [`Predicate`] can be evaluated against any [`Filterable`] record, or
//! rendered as a parameterized SQL `WHERE` fragment for pushdown.

use std::collections::BTreeSet;

/// A record whose attributes can be filtered on by name.
pub trait Filterable {
    /// The value of an attribute, or `None` if the record has no such attribute.
    fn field(&self, name: &str) -> Option<&str>;
}

/// A composed filter over records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every record.
    MatchAll,
    /// Attribute value is one of the accepted values.
    AnyOf {
        column: &'static str,
        values: BTreeSet<String>,
    },
    /// Every inner predicate matches.
    And(Vec<Predicate>),
}

impl Predicate {
    /// "column is one of values".
    pub fn any_of(column: &'static str, values: &BTreeSet<String>) -> Self {
        Predicate::AnyOf {
            column,
            values: values.clone(),
        }
    }

    /// Conjunction of the given predicates, flattening `MatchAll`.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut parts: Vec<Predicate> = predicates
            .into_iter()
            .filter(|p| !matches!(p, Predicate::MatchAll))
            .collect();
        match parts.len() {
            0 => Predicate::MatchAll,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Evaluate against a record.
    pub fn matches<R: Filterable + ?Sized>(&self, record: &R) -> bool {
        match self {
            Predicate::MatchAll => true,
            Predicate::AnyOf { column, values } => record
                .field(column)
                .is_some_and(|value| values.contains(value)),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(record)),
        }
    }

    /// Build SQL WHERE clause component.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        match self {
            Predicate::MatchAll => ("1=1".to_string(), vec![]),
            Predicate::AnyOf { values, .. } if values.is_empty() => ("1=0".to_string(), vec![]),
            Predicate::AnyOf { column, values } => {
                let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
                (
                    format!("{} IN ({})", column, placeholders),
                    values.iter().cloned().collect(),
                )
            }
            Predicate::And(parts) => {
                if parts.is_empty() {
                    return ("1=1".to_string(), vec![]);
                }
                let mut clauses = Vec::with_capacity(parts.len());
                let mut params = Vec::new();
                for part in parts {
                    let (sql, values) = part.to_sql();
                    clauses.push(format!("({})", sql));
                    params.extend(values);
                }
                (clauses.join(" AND "), params)
            }
        }
    }
}
