//! Search module.
//!
//! Criteria, composable predicates, the provider registry, and page windows.

mod criteria;
mod page;
mod predicate;
mod registry;

pub use criteria::SearchCriteria;
pub use page::{Page, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use predicate::{Filterable, Predicate};
pub use registry::{
    author_provider, isbn_provider, title_provider, PredicateProvider, PredicateRegistry,
    PredicateRegistryBuilder, SpecificationBuilder,
};
