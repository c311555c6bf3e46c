//! Predicate providers, the registry that maps attribute names to them,
//! and the builder that composes a search's criteria into one predicate.

use crate::error::{CommerceError, Result};
use crate::search::{Predicate, SearchCriteria};
use std::collections::{BTreeMap, BTreeSet};

/// Maps the accepted values of one attribute to a filter over it.
pub type PredicateProvider = fn(&BTreeSet<String>) -> Predicate;

/// Book title is one of the given titles.
pub fn title_provider(values: &BTreeSet<String>) -> Predicate {
    Predicate::any_of("title", values)
}

/// Book author is one of the given authors.
pub fn author_provider(values: &BTreeSet<String>) -> Predicate {
    Predicate::any_of("author", values)
}

/// Book ISBN is one of the given ISBNs.
pub fn isbn_provider(values: &BTreeSet<String>) -> Predicate {
    Predicate::any_of("isbn", values)
}

/// Immutable attribute name to provider mapping, built once at startup.
#[derive(Debug, Clone)]
pub struct PredicateRegistry {
    providers: BTreeMap<String, PredicateProvider>,
}

impl PredicateRegistry {
    /// Start an empty registry.
    pub fn builder() -> PredicateRegistryBuilder {
        PredicateRegistryBuilder::default()
    }

    /// The registry for book search: `title`, `author` and `isbn`.
    pub fn for_books() -> Result<Self> {
        Ok(Self::builder()
            .register("title", title_provider)?
            .register("author", author_provider)?
            .register("isbn", isbn_provider)?
            .build())
    }

    /// Look up the provider for an attribute.
    pub fn get(&self, field: &str) -> Option<PredicateProvider> {
        self.providers.get(field).copied()
    }

    /// Registered attribute names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

/// Accumulates providers; a repeated name is rejected.
#[derive(Debug, Default)]
pub struct PredicateRegistryBuilder {
    providers: BTreeMap<String, PredicateProvider>,
}

impl PredicateRegistryBuilder {
    /// Register a provider under a unique attribute name.
    pub fn register(mut self, field: impl Into<String>, provider: PredicateProvider) -> Result<Self> {
        let field = field.into();
        if self.providers.contains_key(&field) {
            return Err(CommerceError::DuplicateFilterField(field));
        }
        self.providers.insert(field, provider);
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> PredicateRegistry {
        PredicateRegistry {
            providers: self.providers,
        }
    }
}

/// Composes [`SearchCriteria`] into a single [`Predicate`].
///
/// Values of one attribute are OR-ed by the provider; attributes are AND-ed.
#[derive(Debug, Clone, Copy)]
pub struct SpecificationBuilder<'a> {
    registry: &'a PredicateRegistry,
}

impl<'a> SpecificationBuilder<'a> {
    pub fn new(registry: &'a PredicateRegistry) -> Self {
        Self { registry }
    }

    /// Build the predicate for the criteria.
    ///
    /// Unconstrained criteria yield [`Predicate::MatchAll`]. An attribute with
    /// no registered provider fails with [`CommerceError::UnknownFilterField`].
    pub fn build(&self, criteria: &SearchCriteria) -> Result<Predicate> {
        let mut parts = Vec::new();
        for (field, values) in criteria.active() {
            let provider = self
                .registry
                .get(field)
                .ok_or_else(|| CommerceError::UnknownFilterField(field.to_string()))?;
            parts.push(provider(values));
        }
        Ok(Predicate::all(parts))
    }
}
