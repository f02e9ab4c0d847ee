//! Data layer for the History Atlas API.
//!
//! Provides the domain models, typed filters, the query builder and a client
//! for the REST-fronted tabular store the dataset lives in.

pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;

pub use client::{fetch_rows, fetch_single, CollectionClient, RestCollectionClient};
pub use error::{StoreError, StoreResult};
pub use query::{Cardinality, CollectionQuery, FilterLiteral, Predicate, ToQuery};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
